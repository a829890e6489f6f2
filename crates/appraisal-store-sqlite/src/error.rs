//! Error type for `appraisal-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A text column held a value outside its enumeration.
  #[error("unknown {column} value: {value:?}")]
  UnknownValue {
    column: &'static str,
    value:  String,
  },

  /// An update targeted a row that does not exist.
  #[error("{table} row not found: {id}")]
  Missing {
    table: &'static str,
    id:    uuid::Uuid,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
