//! The `MechanicsStore` trait and supporting query types.
//!
//! Implemented by storage backends (e.g. `reeve-store-sqlite`). Higher layers
//! (`reeve-extract`, `reeve-api`) depend on this abstraction, not on any
//! concrete backend.
//!
//! Ownership boundaries: the extraction pipeline is the only writer of
//! reference and mechanic records; snapshot ingestion is the only creator of
//! snapshots; the rule engine is the only creator of recommendations, which
//! are mutated solely to mark resolution.

use std::future::Future;

use uuid::Uuid;

use crate::{
  recommendation::{NewRecommendation, Recommendation},
  reference::{EntityKind, MechanicRecord, ReferenceRecord},
  snapshot::{NewSnapshot, Snapshot},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`MechanicsStore::query_reference`].
///
/// `server_version` and `server_speed` are always required — reference data
/// is never meaningful across variants. Key and level narrow the result.
#[derive(Debug, Clone)]
pub struct ReferenceQuery {
  pub server_version: String,
  pub server_speed:   u32,
  pub entity_kind:    EntityKind,
  pub entity_key:     Option<String>,
  pub level:          Option<u32>,
}

// ─── Error classification ────────────────────────────────────────────────────

/// How a store error should surface at an API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
  /// The addressed row does not exist.
  NotFound,
  /// The operation contradicts the row's current state.
  Conflict,
  /// Anything else (I/O, serialisation, corruption).
  Other,
}

/// Implemented by backend error types so callers can branch on the class of
/// failure without knowing the backend.
pub trait StoreError {
  fn kind(&self) -> StoreErrorKind;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the relational store backing the pipeline.
///
/// Reference and mechanic upserts are idempotent with on-conflict-replace
/// semantics: re-running extraction for the same composite key overwrites
/// prior values. Snapshots and recommendations are append-only.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait MechanicsStore: Send + Sync {
  type Error: std::error::Error + StoreError + Send + Sync + 'static;

  // ── Reference data (extraction pipeline is the only writer) ─────────────

  /// Insert or overwrite one reference record by its composite key.
  fn upsert_reference(
    &self,
    record: ReferenceRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Upsert a whole extracted table in one transaction.
  fn upsert_reference_batch(
    &self,
    records: Vec<ReferenceRecord>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Insert or overwrite one mechanic record by its composite key.
  fn upsert_mechanic(
    &self,
    record: MechanicRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn query_reference(
    &self,
    query: ReferenceQuery,
  ) -> impl Future<Output = Result<Vec<ReferenceRecord>, Self::Error>> + Send + '_;

  /// All mechanics for a variant, optionally narrowed by type.
  fn query_mechanics(
    &self,
    server_version: String,
    server_speed: u32,
    mechanic_type: Option<String>,
  ) -> impl Future<Output = Result<Vec<MechanicRecord>, Self::Error>> + Send + '_;

  // ── Snapshots (append-only) ──────────────────────────────────────────────

  /// Persist a snapshot; every call creates a new row, identical or not.
  fn insert_snapshot(
    &self,
    snapshot: NewSnapshot,
  ) -> impl Future<Output = Result<Snapshot, Self::Error>> + Send + '_;

  fn latest_snapshot(
    &self,
  ) -> impl Future<Output = Result<Option<Snapshot>, Self::Error>> + Send + '_;

  // ── Recommendations ──────────────────────────────────────────────────────

  fn insert_recommendations(
    &self,
    recs: Vec<NewRecommendation>,
  ) -> impl Future<Output = Result<Vec<Recommendation>, Self::Error>> + Send + '_;

  fn list_recommendations(
    &self,
    unresolved_only: bool,
  ) -> impl Future<Output = Result<Vec<Recommendation>, Self::Error>> + Send + '_;

  /// Mark a recommendation resolved. Errors when the id is unknown or the
  /// recommendation was already resolved.
  fn resolve_recommendation(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Recommendation, Self::Error>> + Send + '_;
}
