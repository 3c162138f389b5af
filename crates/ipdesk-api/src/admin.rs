//! Handlers for `/admin/filings` endpoints. No ownership checks; access
//! control is the caller's responsibility.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/filings` | Every filing, newest first |
//! | `GET`  | `/admin/filings/{id}` | Single filing |
//! | `PUT`  | `/admin/filings/{id}/status` | Body: `{"status":"GRANTED"}` |
//! | `PUT`  | `/admin/filings/{id}/feedback` | Body: [`FeedbackBody`] |
//! | `POST` | `/admin/filings/bulk-action` | Body: [`BulkBody`] |

use axum::{
  Json,
  extract::{Path, State},
};
use ipdesk_core::{
  filing::FilingView,
  lifecycle::BulkOutcome,
  store::{FilingStore, TrackerStore},
};
use serde::Deserialize;

use crate::{ApiJson, AppState, error::ApiError};

/// `GET /admin/filings`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<FilingView>>, ApiError>
where
  S: FilingStore + TrackerStore,
{
  Ok(Json(state.filings.list_admin().await?))
}

/// `GET /admin/filings/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<FilingView>, ApiError>
where
  S: FilingStore + TrackerStore,
{
  Ok(Json(state.filings.get_admin(id).await?))
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: String,
}

/// `PUT /admin/filings/{id}/status`
pub async fn set_status<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  ApiJson(body): ApiJson<StatusBody>,
) -> Result<Json<FilingView>, ApiError>
where
  S: FilingStore + TrackerStore,
{
  Ok(Json(state.filings.set_status(id, &body.status).await?))
}

// ─── Feedback ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FeedbackBody {
  pub feedback:         Option<String>,
  /// When present, replaces the requested fields and asks the applicant to
  /// respond.
  pub requested_fields: Option<Vec<String>>,
}

/// `PUT /admin/filings/{id}/feedback`
pub async fn set_feedback<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  ApiJson(body): ApiJson<FeedbackBody>,
) -> Result<Json<FilingView>, ApiError>
where
  S: FilingStore + TrackerStore,
{
  let view = state
    .filings
    .set_feedback(id, body.feedback, body.requested_fields)
    .await?;
  Ok(Json(view))
}

// ─── Bulk ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BulkBody {
  pub ids:    Vec<i64>,
  /// `DELETE` or `UPDATE_STATUS`.
  pub action: String,
  /// The status for `UPDATE_STATUS`.
  pub value:  Option<String>,
}

/// `POST /admin/filings/bulk-action`
pub async fn bulk_action<S>(
  State(state): State<AppState<S>>,
  ApiJson(body): ApiJson<BulkBody>,
) -> Result<Json<BulkOutcome>, ApiError>
where
  S: FilingStore + TrackerStore,
{
  let outcome = state
    .filings
    .bulk_action(&body.ids, &body.action, body.value.as_deref())
    .await?;
  Ok(Json(outcome))
}
