//! JSON REST API for reeve.
//!
//! Exposes an axum [`Router`] backed by any
//! [`reeve_core::store::MechanicsStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", reeve_api::api_router(store.clone(), ingest_ctx))
//! ```

pub mod error;
pub mod recommendations;
pub mod reference;
pub mod snapshots;


use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use reeve_core::{ingest::IngestContext, store::MechanicsStore};

pub use error::ApiError;

/// Shared handler state: the store plus the server identity snapshots are
/// ingested under.
pub struct ApiState<S> {
  pub store: Arc<S>,
  pub ctx:   IngestContext,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), ctx: self.ctx.clone() }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, ctx: IngestContext) -> Router<()>
where
  S: MechanicsStore + 'static,
{
  Router::new()
    // Snapshots
    .route("/snapshots", post(snapshots::ingest::<S>))
    .route("/snapshots/latest", get(snapshots::latest::<S>))
    // Recommendations
    .route("/recommendations", get(recommendations::list::<S>))
    .route(
      "/recommendations/{id}/resolve",
      post(recommendations::resolve::<S>),
    )
    // Reference data
    .route("/reference", get(reference::list_reference::<S>))
    .route("/mechanics", get(reference::list_mechanics::<S>))
    .with_state(ApiState { store, ctx })
}
