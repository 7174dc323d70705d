//! Extraction error taxonomy.
//!
//! Failures are scoped so the pipeline can tell what to do with them:
//! [`FetchError`] is retryable, [`ExtractionError`] fails a single entity,
//! and [`ValidationError`] is logged without blocking persistence.

use reeve_core::reference::CostVector;
use thiserror::Error;

/// A page could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("request timed out")]
  Timeout,
  #[error("http status {0}")]
  Http(u16),
  #[error("transport error: {0}")]
  Transport(String),
}

/// A single entity's extraction failed.
#[derive(Debug, Error)]
pub enum ExtractionError {
  /// No table on the page qualified as a cost table.
  #[error("no cost table found in page")]
  NoTableFound,
  /// Every data row was rejected; `line` is the first rejected row index.
  #[error("malformed table row at index {line}")]
  MalformedRow { line: usize },
  #[error(transparent)]
  Fetch(#[from] FetchError),
}

/// A parsed row disagreed with a known-good checkpoint value.
#[derive(Debug, Error)]
pub enum ValidationError {
  #[error("checkpoint mismatch: expected {expected:?}, got {actual:?}")]
  Mismatch {
    expected: CostVector,
    actual:   CostVector,
  },
}
