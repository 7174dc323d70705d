//! Error type for `reeve-store-sqlite`.

use reeve_core::store::{StoreError, StoreErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] reeve_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("recommendation not found: {0}")]
  RecommendationNotFound(uuid::Uuid),

  #[error("recommendation {0} is already resolved")]
  AlreadyResolved(uuid::Uuid),
}

impl StoreError for Error {
  fn kind(&self) -> StoreErrorKind {
    match self {
      Error::RecommendationNotFound(_) => StoreErrorKind::NotFound,
      Error::AlreadyResolved(_) => StoreErrorKind::Conflict,
      _ => StoreErrorKind::Other,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
