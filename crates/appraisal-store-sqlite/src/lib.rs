//! SQLite backend for the appraisal store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Nested payloads (form data, stage
//! reviews, profile history) are stored as JSON columns.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod workflow_tests;
