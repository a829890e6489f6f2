//! HTTP surface of the staff appraisal system.
//!
//! Exposes an axum [`Router`] over a [`Workflow`] backed by any
//! [`AppraisalStore`]. Every route except registration authenticates with
//! HTTP Basic (`email:password`).

pub mod auth;
pub mod error;
pub mod files;
pub mod handlers;
pub mod render;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use appraisal_core::{Workflow, report::ReportRenderer, store::AppraisalStore};
use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use files::{DiskStorage, PHOTO_LIMIT};
use handlers::{auth as account, hod, panel, profile, staff};

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_max_upload_bytes() -> usize { 10 * 1024 * 1024 }

fn default_max_documents() -> usize { 5 }

/// Room for the non-file parts of an upload request.
const BODY_SLACK: usize = 64 * 1024;

/// Request body size needed to carry `files` base64 files of `limit` bytes.
pub fn upload_body_limit(limit: usize, files: usize) -> usize {
  limit.div_ceil(3).saturating_mul(4).saturating_mul(files).saturating_add(BODY_SLACK)
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `APPRAISAL_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store_path:       PathBuf,
  pub upload_dir:       PathBuf,
  /// Per-document limit for appraisal attachments.
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes: usize,
  /// Most attachments one appraisal may carry.
  #[serde(default = "default_max_documents")]
  pub max_documents:    usize,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: AppraisalStore> {
  pub workflow: Workflow<S>,
  pub files:    Arc<DiskStorage>,
  pub renderer: Arc<dyn ReportRenderer>,
  pub config:   Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: AppraisalStore + Clone + 'static,
{
  let submission_limit = DefaultBodyLimit::max(upload_body_limit(
    state.config.max_upload_bytes,
    state.config.max_documents,
  ));
  let photo_limit = DefaultBodyLimit::max(upload_body_limit(PHOTO_LIMIT, 1));

  Router::new()
    // Accounts
    .route("/auth/register", post(account::register::<S>))
    .route("/me", get(account::me))
    // Staff
    .route(
      "/staff/appraisals",
      get(staff::list::<S>)
        .post(staff::submit::<S>)
        .layer(submission_limit),
    )
    .route("/staff/appraisals/{id}", get(staff::get_one::<S>))
    .route("/staff/appraisals/{id}/accept", post(staff::accept::<S>))
    .route("/staff/appraisals/{id}/reject", post(staff::reject::<S>))
    // HOD
    .route("/hod/appraisals", get(hod::queue::<S>))
    .route("/hod/appraisals/{id}", get(hod::get_one::<S>))
    .route("/hod/appraisals/{id}/evaluate", post(hod::evaluate::<S>))
    .route("/hod/personality-traits", post(hod::personality_traits::<S>))
    // Committee
    .route("/committee/appraisals", get(panel::committee_queue::<S>))
    .route(
      "/committee/appraisals/{id}",
      get(panel::committee_get::<S>).delete(panel::committee_delete::<S>),
    )
    .route("/committee/appraisals/{id}/review", post(panel::committee_review::<S>))
    .route("/committee/personality-traits", get(panel::committee_traits::<S>))
    .route("/committee/personality-traits/{id}", get(panel::committee_traits_one::<S>))
    // Faculty
    .route("/faculty/appraisals", get(panel::faculty_queue::<S>))
    .route("/faculty/appraisals/{id}", get(panel::faculty_get::<S>))
    .route("/faculty/appraisals/{id}/review", post(panel::faculty_review::<S>))
    .route("/faculty/personality-traits", get(panel::faculty_traits::<S>))
    .route("/faculty/personality-traits/{id}", get(panel::faculty_traits_one::<S>))
    // Profiles
    .route("/profile", get(profile::own::<S>).post(profile::update::<S>))
    .route("/profile/photo", post(profile::photo::<S>).layer(photo_limit))
    .route("/profile/history", get(profile::own_history::<S>))
    .route("/profile/history/{user_id}", get(profile::history::<S>))
    .route("/profile/report", get(profile::own_report::<S>))
    .route("/profile/report/{user_id}", get(profile::report::<S>))
    .route("/profile/{user_id}", get(profile::other::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
