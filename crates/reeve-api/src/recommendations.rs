//! Handlers for `/recommendations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/recommendations` | `?unresolved=true` hides resolved entries |
//! | `POST` | `/recommendations/:id/resolve` | 404 unknown id, 409 already resolved |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use reeve_core::{recommendation::Recommendation, store::MechanicsStore};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// If `true`, return only recommendations not yet resolved.
  #[serde(default)]
  pub unresolved: bool,
}

/// `GET /recommendations[?unresolved=true]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Recommendation>>, ApiError>
where
  S: MechanicsStore,
{
  let recs = state
    .store
    .list_recommendations(params.unresolved)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(recs))
}

/// `POST /recommendations/:id/resolve`
pub async fn resolve<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Recommendation>, ApiError>
where
  S: MechanicsStore,
{
  let resolved = state
    .store
    .resolve_recommendation(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(resolved))
}
