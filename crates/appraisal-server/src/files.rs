//! Disk-backed storage for uploaded files.
//!
//! Every stored file gets a fresh name, `<prefix>_<uuid><.ext>`, so uploads
//! never collide and client-supplied names never reach the filesystem. The
//! returned name is the opaque reference kept on appraisal and profile
//! records.

use std::{
  io,
  path::{Path, PathBuf},
};

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use bytes::Bytes;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// Largest accepted profile photo.
pub const PHOTO_LIMIT: usize = 5 * 1024 * 1024;

/// Extensions accepted for profile photos.
pub const PHOTO_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif"];

/// A file carried in a JSON request body.
#[derive(Debug, Clone, Deserialize)]
pub struct Upload {
  pub filename: String,
  /// Base64 (standard alphabet) file contents.
  pub content:  String,
}

impl Upload {
  /// Decode the contents, refusing anything larger than `limit` bytes.
  pub fn decode(&self, limit: usize) -> Result<Bytes, ApiError> {
    let bytes = B64
      .decode(self.content.trim())
      .map_err(|e| ApiError::BadRequest(format!("{}: invalid base64: {e}", self.filename)))?;
    if bytes.len() > limit {
      return Err(ApiError::PayloadTooLarge { limit });
    }
    Ok(Bytes::from(bytes))
  }

  /// Lower-cased extension of the client-supplied name, if any.
  pub fn extension(&self) -> Option<String> {
    Path::new(&self.filename)
      .extension()
      .and_then(|e| e.to_str())
      .map(str::to_ascii_lowercase)
  }
}

/// Stores files under a single directory.
#[derive(Debug, Clone)]
pub struct DiskStorage {
  root: PathBuf,
}

impl DiskStorage {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  /// Write `contents` under a fresh name and return that name.
  pub async fn store(
    &self,
    prefix: &str,
    original_name: &str,
    contents: Bytes,
  ) -> io::Result<String> {
    let extension = Path::new(original_name)
      .extension()
      .and_then(|e| e.to_str())
      .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
      .map(|e| format!(".{}", e.to_ascii_lowercase()))
      .unwrap_or_default();
    let name = format!("{prefix}_{}{extension}", Uuid::new_v4().simple());

    tokio::fs::create_dir_all(&self.root).await?;
    tokio::fs::write(self.root.join(&name), &contents).await?;
    Ok(name)
  }

  /// Delete a stored file. A missing file is not an error.
  pub async fn remove(&self, reference: &str) -> io::Result<()> {
    let Some(path) = self.path_of(reference) else {
      return Ok(());
    };
    match tokio::fs::remove_file(path).await {
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      other => other,
    }
  }

  /// Resolve a reference, refusing anything that is not a bare file name.
  fn path_of(&self, reference: &str) -> Option<PathBuf> {
    let bare = !reference.is_empty()
      && Path::new(reference).file_name().and_then(|n| n.to_str()) == Some(reference);
    bare.then(|| self.root.join(reference))
  }
}

#[cfg(test)]
impl DiskStorage {
  pub(crate) async fn exists(&self, reference: &str) -> bool {
    match self.path_of(reference) {
      Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
      None => false,
    }
  }
}
