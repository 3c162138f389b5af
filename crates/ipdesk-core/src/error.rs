//! Error types for `ipdesk-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The record is missing, or it belongs to another user. The two cases
  /// are deliberately indistinguishable.
  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: i64 },

  #[error("invalid {field}: {message}")]
  ValidationFailed { field: &'static str, message: String },

  /// A uniqueness race that survived its one retry.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn filing_not_found(id: i64) -> Self {
    Self::NotFound { entity: "filing", id }
  }

  pub fn tracker_not_found(id: i64) -> Self {
    Self::NotFound { entity: "tracked filing", id }
  }

  pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
    Self::ValidationFailed { field, message: message.into() }
  }

  /// Wrap a backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
