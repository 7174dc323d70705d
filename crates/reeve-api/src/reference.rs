//! Read-only handlers for extracted reference data.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/reference` | optional `kind` (default `building`), `key`, `level` |
//! | `GET` | `/mechanics` | optional `type` |
//!
//! Version and speed are fixed by the server's ingest context; clients never
//! query across variants.

use axum::{
  Json,
  extract::{Query, State},
};
use reeve_core::{
  reference::{EntityKind, MechanicRecord, ReferenceRecord},
  store::{MechanicsStore, ReferenceQuery},
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ReferenceParams {
  pub kind:  Option<String>,
  pub key:   Option<String>,
  pub level: Option<u32>,
}

/// `GET /reference[?kind=building|unit][&key=...][&level=...]`
pub async fn list_reference<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ReferenceParams>,
) -> Result<Json<Vec<ReferenceRecord>>, ApiError>
where
  S: MechanicsStore,
{
  let entity_kind = match &params.kind {
    Some(kind) => EntityKind::from_discriminant(kind)
      .map_err(|e| ApiError::BadRequest(e.to_string()))?,
    None => EntityKind::Building,
  };

  let records = state
    .store
    .query_reference(ReferenceQuery {
      server_version: state.ctx.server_version.clone(),
      server_speed: state.ctx.server_speed,
      entity_kind,
      entity_key: params.key,
      level: params.level,
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(records))
}

#[derive(Debug, Deserialize)]
pub struct MechanicsParams {
  #[serde(rename = "type")]
  pub mechanic_type: Option<String>,
}

/// `GET /mechanics[?type=cp_threshold]`
pub async fn list_mechanics<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<MechanicsParams>,
) -> Result<Json<Vec<MechanicRecord>>, ApiError>
where
  S: MechanicsStore,
{
  let records = state
    .store
    .query_mechanics(
      state.ctx.server_version.clone(),
      state.ctx.server_speed,
      params.mechanic_type,
    )
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(records))
}
