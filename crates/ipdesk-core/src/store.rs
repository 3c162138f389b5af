//! The storage traits and their shared error contract.
//!
//! Implemented by storage backends (e.g. `ipdesk-store-sqlite`). The services
//! in [`crate::service`] depend on these traits, not on any concrete backend.
//!
//! Every method is one atomic unit: a backend runs the whole
//! read-modify-write, including the pure transition from
//! [`crate::lifecycle`] or [`crate::tracker`], inside a single transaction.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  UserId,
  filing::{Filing, FilingRequest},
  lifecycle::NewFiling,
  status::FilingStatus,
  tracker::{AssetDetails, TrackedFiling},
};

/// Errors a backend can report. Only uniqueness conflicts get special
/// treatment; everything else is wrapped as [`crate::Error::Store`].
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// Whether the failure was a uniqueness violation that a retry may
  /// resolve.
  fn is_conflict(&self) -> bool { false }
}

// ─── Filings ─────────────────────────────────────────────────────────────────

/// Persistence for patent filings.
///
/// Methods taking an `Option<UserId>` owner filter treat a filing owned by
/// someone else exactly like a missing one. `None` means no ownership check.
pub trait FilingStore: Send + Sync {
  type Error: StoreError;

  /// Insert a prepared filing: link inventors by exact name, assign the
  /// application number, then persist the derived initial status.
  fn insert_filing(
    &self,
    new: NewFiling,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Filing, Self::Error>> + Send + '_;

  fn get_filing(
    &self,
    id: i64,
    owner: Option<UserId>,
  ) -> impl Future<Output = Result<Option<Filing>, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_filings(
    &self,
    owner: Option<UserId>,
  ) -> impl Future<Output = Result<Vec<Filing>, Self::Error>> + Send + '_;

  /// Apply an already validated resubmission. Returns `None` when the filing
  /// is missing or not owned by `owner`.
  fn update_filing(
    &self,
    id: i64,
    owner: UserId,
    request: FilingRequest,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Filing>, Self::Error>> + Send + '_;

  fn set_filing_status(
    &self,
    id: i64,
    status: FilingStatus,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Filing>, Self::Error>> + Send + '_;

  fn set_filing_feedback(
    &self,
    id: i64,
    feedback: Option<String>,
    requested_fields: Option<Vec<String>>,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Filing>, Self::Error>> + Send + '_;

  /// Delete a filing with its inventor links, drawings and requested-field
  /// rows. Returns `false` when nothing matched.
  fn delete_filing(
    &self,
    id: i64,
    owner: Option<UserId>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Trackers ────────────────────────────────────────────────────────────────

/// Persistence for tracked filings.
pub trait TrackerStore: Send + Sync {
  type Error: StoreError;

  /// Reconcile `details` against the user's row for the same application
  /// number and persist the result. An insert that loses a race reports a
  /// conflict error; calling again merges into the winning row.
  fn track(
    &self,
    user_id: UserId,
    details: AssetDetails,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<TrackedFiling, Self::Error>> + Send + '_;

  fn list_tracked(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Vec<TrackedFiling>, Self::Error>> + Send + '_;

  fn get_tracked(
    &self,
    id: i64,
    user_id: UserId,
  ) -> impl Future<Output = Result<Option<TrackedFiling>, Self::Error>> + Send + '_;
}
