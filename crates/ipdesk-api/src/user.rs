//! Caller identity from the `X-User-Id` header.
//!
//! Authentication happens upstream; this layer trusts the header.

use axum::{extract::FromRequestParts, http::request::Parts};
use ipdesk_core::UserId;

use crate::error::ApiError;

pub const USER_HEADER: &str = "x-user-id";

/// The calling user. Rejects with 400 when the header is missing or not an
/// integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

impl<T: Send + Sync> FromRequestParts<T> for CurrentUser {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &T) -> Result<Self, Self::Rejection> {
    let raw = parts
      .headers
      .get(USER_HEADER)
      .ok_or_else(|| ApiError::BadRequest("missing X-User-Id header".into()))?;
    raw
      .to_str()
      .ok()
      .and_then(|s| s.trim().parse::<UserId>().ok())
      .map(CurrentUser)
      .ok_or_else(|| ApiError::BadRequest("X-User-Id must be an integer".into()))
  }
}
