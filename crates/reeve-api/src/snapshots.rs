//! Handlers for `/snapshots` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/snapshots` | Body: raw game-state JSON; returns 201 + snapshot and fresh recommendations |
//! | `GET`  | `/snapshots/latest` | 404 when nothing has been ingested |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use reeve_core::{
  ingest, metrics,
  recommendation::Recommendation,
  reference::EntityKind,
  rules,
  snapshot::Snapshot,
  store::{MechanicsStore, ReferenceQuery},
};
use serde::Serialize;
use serde_json::Value;

use crate::{ApiState, error::ApiError};

/// Response body of `POST /snapshots`.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
  pub snapshot:        Snapshot,
  pub recommendations: Vec<Recommendation>,
}

/// `POST /snapshots` — ingest a raw game-state payload.
///
/// The snapshot is committed first; metrics and rules then run against the
/// stored row, so recommendations always describe persisted state.
pub async fn ingest<S>(
  State(state): State<ApiState<S>>,
  Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MechanicsStore,
{
  let new_snapshot = ingest::build_snapshot(&payload, &state.ctx)
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let snapshot = state
    .store
    .insert_snapshot(new_snapshot)
    .await
    .map_err(ApiError::from_store)?;

  let references = state
    .store
    .query_reference(ReferenceQuery {
      server_version: state.ctx.server_version.clone(),
      server_speed:   state.ctx.server_speed,
      entity_kind:    EntityKind::Building,
      entity_key:     None,
      level:          None,
    })
    .await
    .map_err(ApiError::from_store)?;
  let mechanics = state
    .store
    .query_mechanics(
      state.ctx.server_version.clone(),
      state.ctx.server_speed,
      None,
    )
    .await
    .map_err(ApiError::from_store)?;

  let metrics = metrics::compute(&snapshot, &references, &mechanics);
  let fresh = rules::evaluate(&snapshot, &metrics);
  let recommendations = state
    .store
    .insert_recommendations(fresh)
    .await
    .map_err(ApiError::from_store)?;

  Ok((
    StatusCode::CREATED,
    Json(IngestResponse { snapshot, recommendations }),
  ))
}

/// `GET /snapshots/latest`
pub async fn latest<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Snapshot>, ApiError>
where
  S: MechanicsStore,
{
  let snapshot = state
    .store
    .latest_snapshot()
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound("no snapshots ingested".to_string()))?;
  Ok(Json(snapshot))
}
