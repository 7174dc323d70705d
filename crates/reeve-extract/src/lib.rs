//! reeve-extract — pulls reference game-mechanics tables out of the external
//! calculator site and upserts them into a [`reeve_core::store::MechanicsStore`].
//!
//! The site serves static HTML; every cost table is present in the page body,
//! so extraction is a plain HTTP fetch plus tag-level scanning. Fetching sits
//! behind the [`fetch::PageFetcher`] trait so the pipeline can run against
//! canned fixtures in tests.

#![allow(async_fn_in_trait)]

pub mod checkpoint;
pub mod error;
pub mod fetch;
mod html;
pub mod pipeline;
pub mod table;

pub use error::{ExtractionError, FetchError, ValidationError};
