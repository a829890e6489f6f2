//! Core types, the appraisal state machine and the workflow service for the
//! staff appraisal system.
//!
//! This crate is free of HTTP and database dependencies. Storage backends
//! implement [`store::AppraisalStore`]; document formats implement
//! [`report::ReportRenderer`].

// Native `async fn` in traits; the store trait spells out `Send` futures.
#![allow(async_fn_in_trait)]

pub mod appraisal;
pub mod error;
pub mod normalize;
pub mod profile;
pub mod report;
pub mod scoring;
pub mod status;
pub mod store;
pub mod traits;
pub mod user;
pub mod workflow;

use uuid::Uuid;

pub use error::{Error, Result};
pub use workflow::Workflow;

/// Parse a record identifier supplied by a client.
pub fn parse_ref(raw: &str) -> Result<Uuid> {
  Uuid::parse_str(raw.trim()).map_err(|_| Error::MalformedReference(raw.to_owned()))
}
