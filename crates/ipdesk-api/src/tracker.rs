//! Handlers for `/tracker` endpoints, scoped to the caller.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/tracker/track` | Body: [`TrackRequest`]; idempotent per application number |
//! | `GET`  | `/tracker` | Caller's tracked filings |
//! | `GET`  | `/tracker/dashboard` | Counts over the caller's rows |
//! | `GET`  | `/tracker/{id}` | 404 if missing or not owned |

use axum::{
  Json,
  extract::{Path, State},
};
use ipdesk_core::{
  store::{FilingStore, TrackerStore},
  tracker::{Dashboard, TrackRequest, TrackerView},
};

use crate::{ApiJson, AppState, CurrentUser, error::ApiError};

/// `POST /tracker/track`
pub async fn track<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  ApiJson(body): ApiJson<TrackRequest>,
) -> Result<Json<TrackerView>, ApiError>
where
  S: FilingStore + TrackerStore,
{
  Ok(Json(state.trackers.track(body, user_id).await?))
}

/// `GET /tracker`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<TrackerView>>, ApiError>
where
  S: FilingStore + TrackerStore,
{
  Ok(Json(state.trackers.list_for_user(user_id).await?))
}

/// `GET /tracker/dashboard`
pub async fn dashboard<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
) -> Result<Json<Dashboard>, ApiError>
where
  S: FilingStore + TrackerStore,
{
  Ok(Json(state.trackers.dashboard(user_id).await?))
}

/// `GET /tracker/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<i64>,
) -> Result<Json<TrackerView>, ApiError>
where
  S: FilingStore + TrackerStore,
{
  Ok(Json(state.trackers.get(id, user_id).await?))
}
