//! Error types for `reeve-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown entity kind discriminant: {0:?}")]
  UnknownEntityKind(String),

  #[error("unknown recommendation category discriminant: {0:?}")]
  UnknownCategory(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
