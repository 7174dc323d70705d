//! Core types and trait definitions for the reeve mechanics pipeline.
//!
//! Deliberately free of HTTP and database dependencies: the metric and rule
//! functions here are pure, and storage is reached only through the
//! [`store::MechanicsStore`] trait.

pub mod error;
pub mod ingest;
pub mod metrics;
pub mod recommendation;
pub mod reference;
pub mod rules;
pub mod signature;
pub mod snapshot;
pub mod store;

pub use error::{Error, Result};
