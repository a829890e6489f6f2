//! Route handlers, grouped by the role that calls them.
//!
//! Path identifiers arrive as strings and go through
//! [`appraisal_core::parse_ref`], so a malformed id is a 400 rather than a
//! routing rejection.

pub mod auth;
pub mod hod;
pub mod panel;
pub mod profile;
pub mod staff;
