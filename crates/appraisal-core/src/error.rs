//! Error types for `appraisal-core`.

use thiserror::Error;

use crate::status::{Action, AppraisalStatus};

#[derive(Debug, Error)]
pub enum Error {
  /// No verified actor accompanied the request.
  #[error("unauthenticated")]
  Unauthenticated,

  /// The record does not exist, or the actor lacks the relationship
  /// (ownership, department, faculty) needed to see it. The two cases are
  /// deliberately indistinguishable.
  #[error("{0} not found")]
  NotFound(String),

  /// The actor's role may not perform this operation at all.
  #[error("forbidden: {0}")]
  Forbidden(String),

  /// The record's current status is outside the source set of `action`.
  #[error("cannot {action} an appraisal in status {from}")]
  IllegalTransition {
    from:   AppraisalStatus,
    action: Action,
  },

  #[error("validation error: {0}")]
  Validation(String),

  /// An identifier that does not have the store's id shape.
  #[error("malformed reference: {0:?}")]
  MalformedReference(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error raised by an [`AppraisalStore`](crate::store::AppraisalStore).
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub(crate) fn not_found(what: impl Into<String>) -> Self {
    Self::NotFound(what.into())
  }

  pub(crate) fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
