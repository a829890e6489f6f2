//! HTTP error type and its axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by a handler or extractor.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] appraisal_core::Error),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("upload exceeds {limit} bytes")]
  PayloadTooLarge { limit: usize },

  #[error("file storage error: {0}")]
  Io(#[from] std::io::Error),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    use appraisal_core::Error as Core;
    match self {
      Self::Core(Core::Unauthenticated) => StatusCode::UNAUTHORIZED,
      Self::Core(Core::NotFound(_)) => StatusCode::NOT_FOUND,
      Self::Core(Core::Forbidden(_) | Core::IllegalTransition { .. }) => StatusCode::FORBIDDEN,
      Self::Core(Core::Validation(_) | Core::MalformedReference(_)) | Self::BadRequest(_) => {
        StatusCode::BAD_REQUEST
      }
      Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
      Self::Core(Core::Store(_)) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    // Persistence details stay in the log.
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
      tracing::error!(error = %self, "request failed");
      "internal server error".to_owned()
    } else {
      self.to_string()
    };

    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"appraisal\""),
      );
    }
    res
  }
}
