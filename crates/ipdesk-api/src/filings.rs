//! Handlers for `/filings` endpoints. Every route is scoped to the caller.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/filings` | Caller's filings, newest first |
//! | `POST`   | `/filings` | Body: [`FilingRequest`]; returns 201 |
//! | `GET`    | `/filings/{id}` | 404 if missing or not owned |
//! | `PUT`    | `/filings/{id}` | Resubmission; body: [`FilingRequest`] |
//! | `DELETE` | `/filings/{id}` | Returns 204 |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use ipdesk_core::{
  filing::{FilingRequest, FilingView},
  store::{FilingStore, TrackerStore},
};

use crate::{ApiJson, AppState, CurrentUser, error::ApiError};

/// `GET /filings`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<FilingView>>, ApiError>
where
  S: FilingStore + TrackerStore,
{
  Ok(Json(state.filings.list(user_id).await?))
}

/// `POST /filings`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  ApiJson(body): ApiJson<FilingRequest>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FilingStore + TrackerStore,
{
  let view = state.filings.create(user_id, body).await?;
  Ok((StatusCode::CREATED, Json(view)))
}

/// `GET /filings/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<i64>,
) -> Result<Json<FilingView>, ApiError>
where
  S: FilingStore + TrackerStore,
{
  Ok(Json(state.filings.get(id, user_id).await?))
}

/// `PUT /filings/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<i64>,
  ApiJson(body): ApiJson<FilingRequest>,
) -> Result<Json<FilingView>, ApiError>
where
  S: FilingStore + TrackerStore,
{
  Ok(Json(state.filings.update(id, user_id, body).await?))
}

/// `DELETE /filings/{id}`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: FilingStore + TrackerStore,
{
  state.filings.delete(id, user_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
