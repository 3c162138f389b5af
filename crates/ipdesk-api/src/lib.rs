//! JSON REST API for ipdesk.
//!
//! Exposes an axum [`Router`] over the core services, backed by any store
//! implementing both [`FilingStore`] and [`TrackerStore`]. Authentication,
//! TLS, and transport concerns are the caller's responsibility; the caller's
//! identity arrives in the `X-User-Id` header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", ipdesk_api::api_router(AppState::new(store.clone())))
//! ```

pub mod admin;
pub mod error;
pub mod filings;
pub mod json;
pub mod tracker;
pub mod user;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use ipdesk_core::{
  service::{FilingService, TrackerService},
  store::{FilingStore, TrackerStore},
};

pub use error::ApiError;
pub use json::ApiJson;
pub use user::CurrentUser;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub filings:  FilingService<S>,
  pub trackers: TrackerService<S>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { filings: self.filings.clone(), trackers: self.trackers.clone() }
  }
}

impl<S: FilingStore + TrackerStore> AppState<S> {
  /// Services over `store` with the system clock and no activity observer.
  pub fn new(store: Arc<S>) -> Self {
    Self {
      filings:  FilingService::new(store.clone()),
      trackers: TrackerService::new(store),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: FilingStore + TrackerStore + 'static,
{
  Router::new()
    // Applicant filings
    .route("/filings", get(filings::list::<S>).post(filings::create::<S>))
    .route(
      "/filings/{id}",
      get(filings::get_one::<S>)
        .put(filings::update::<S>)
        .delete(filings::delete_one::<S>),
    )
    // Administration
    .route("/admin/filings", get(admin::list::<S>))
    .route("/admin/filings/bulk-action", post(admin::bulk_action::<S>))
    .route("/admin/filings/{id}", get(admin::get_one::<S>))
    .route("/admin/filings/{id}/status", put(admin::set_status::<S>))
    .route("/admin/filings/{id}/feedback", put(admin::set_feedback::<S>))
    // Tracker
    .route("/tracker", get(tracker::list::<S>))
    .route("/tracker/track", post(tracker::track::<S>))
    .route("/tracker/dashboard", get(tracker::dashboard::<S>))
    .route("/tracker/{id}", get(tracker::get_one::<S>))
    .with_state(state)
}
