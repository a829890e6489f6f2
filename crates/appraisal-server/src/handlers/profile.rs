//! Handlers for `/profile` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/profile` | Own profile, created on first access |
//! | `POST` | `/profile` | Body: `{"fullName"?, "phone"?}` |
//! | `GET`  | `/profile/{user_id}` | Self or any reviewer role |
//! | `POST` | `/profile/photo` | Body: `{"filename", "content"}` (base64) |
//! | `GET`  | `/profile/history[/{user_id}]` | |
//! | `GET`  | `/profile/report[/{user_id}]` | Attachment in the renderer's format |

use appraisal_core::{
  parse_ref,
  profile::{HistoryEntry, Profile},
  store::AppraisalStore,
  user::Actor,
  workflow::ProfileUpdate,
};
use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderValue, header},
  response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  AppState,
  auth::CurrentUser,
  error::ApiError,
  files::{PHOTO_EXTENSIONS, PHOTO_LIMIT, Upload},
};

// ─── Profile ──────────────────────────────────────────────────────────────────

/// `GET /profile`
pub async fn own<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
) -> Result<Json<Profile>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  Ok(Json(state.workflow.profile(&actor, actor.user_id).await?))
}

/// `GET /profile/{user_id}`
pub async fn other<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(user_id): Path<String>,
) -> Result<Json<Profile>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  let user_id = parse_ref(&user_id)?;
  Ok(Json(state.workflow.profile(&actor, user_id).await?))
}

/// `POST /profile`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Json(body): Json<ProfileUpdate>,
) -> Result<Json<Profile>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  Ok(Json(state.workflow.update_profile(&actor, body).await?))
}

// ─── Photo ────────────────────────────────────────────────────────────────────

/// `POST /profile/photo`
///
/// Replaces the caller's photo. The previous file is removed once the
/// profile points at the new one.
pub async fn photo<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Json(upload): Json<Upload>,
) -> Result<Json<Value>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  let accepted = upload
    .extension()
    .is_some_and(|ext| PHOTO_EXTENSIONS.contains(&ext.as_str()));
  if !accepted {
    return Err(ApiError::BadRequest(format!(
      "profile photos must be one of: {}",
      PHOTO_EXTENSIONS.join(", ")
    )));
  }
  let bytes = upload.decode(PHOTO_LIMIT)?;
  let name = state.files.store("photo", &upload.filename, bytes).await?;

  let previous = match state.workflow.set_profile_photo(&actor, name.clone()).await {
    Ok(previous) => previous,
    Err(e) => {
      if let Err(io) = state.files.remove(&name).await {
        tracing::warn!(file = %name, error = %io, "could not remove orphaned photo");
      }
      return Err(e.into());
    }
  };
  if let Some(old) = previous.filter(|old| *old != name)
    && let Err(e) = state.files.remove(&old).await
  {
    tracing::warn!(file = %old, error = %e, "could not remove previous photo");
  }
  Ok(Json(json!({ "profilePhoto": name })))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /profile/history`
pub async fn own_history<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<HistoryEntry>>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  Ok(Json(state.workflow.history(&actor, actor.user_id).await?))
}

/// `GET /profile/history/{user_id}`
pub async fn history<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(user_id): Path<String>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  let user_id = parse_ref(&user_id)?;
  Ok(Json(state.workflow.history(&actor, user_id).await?))
}

// ─── Report ───────────────────────────────────────────────────────────────────

async fn render<S: AppraisalStore>(
  state: &AppState<S>,
  actor: &Actor,
  user_id: Uuid,
) -> Result<Response, ApiError> {
  let report = state.workflow.report(actor, user_id).await?;
  tracing::debug!(user_id = %user_id, pages = report.page_count(), "report compiled");
  let body = state.renderer.render(&report);
  let filename = report.filename(state.renderer.extension());
  let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
    .map_err(|_| ApiError::BadRequest("unrepresentable report filename".into()))?;

  Ok(
    (
      [
        (header::CONTENT_TYPE, HeaderValue::from_static(state.renderer.content_type())),
        (header::CONTENT_DISPOSITION, disposition),
      ],
      body,
    )
      .into_response(),
  )
}

/// `GET /profile/report`
pub async fn own_report<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
) -> Result<Response, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  render(&state, &actor, actor.user_id).await
}

/// `GET /profile/report/{user_id}`
pub async fn report<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(user_id): Path<String>,
) -> Result<Response, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  let user_id = parse_ref(&user_id)?;
  render(&state, &actor, user_id).await
}
