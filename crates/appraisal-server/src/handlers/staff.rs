//! Handlers for `/staff/appraisals` endpoints.

use appraisal_core::{
  appraisal::{Appraisal, StaffDecision},
  normalize::Submission,
  parse_ref,
  store::AppraisalStore,
};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use serde::Deserialize;

use crate::{AppState, auth::CurrentUser, error::ApiError, files::Upload};

// ─── Submit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  pub form:      Submission,
  #[serde(default)]
  pub documents: Vec<Upload>,
}

/// `POST /staff/appraisals`
///
/// Documents are written before the appraisal record. If the record cannot
/// be created the files are removed again.
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Json(body): Json<SubmitBody>,
) -> Result<(StatusCode, Json<Appraisal>), ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  let limit = state.config.max_upload_bytes;
  if body.documents.len() > state.config.max_documents {
    return Err(ApiError::BadRequest(format!(
      "at most {} supporting documents may be attached",
      state.config.max_documents
    )));
  }
  let mut decoded = Vec::with_capacity(body.documents.len());
  for upload in &body.documents {
    decoded.push((upload.filename.as_str(), upload.decode(limit)?));
  }

  let mut stored = Vec::with_capacity(decoded.len());
  for (filename, bytes) in decoded {
    match state.files.store("doc", filename, bytes).await {
      Ok(name) => stored.push(name),
      Err(e) => {
        discard(&state, &stored).await;
        return Err(e.into());
      }
    }
  }

  match state
    .workflow
    .submit_appraisal(&actor, &body.form, stored.clone())
    .await
  {
    Ok(appraisal) => Ok((StatusCode::CREATED, Json(appraisal))),
    Err(e) => {
      discard(&state, &stored).await;
      Err(e.into())
    }
  }
}

async fn discard<S: AppraisalStore>(state: &AppState<S>, names: &[String]) {
  for name in names {
    if let Err(e) = state.files.remove(name).await {
      tracing::warn!(file = %name, error = %e, "could not remove orphaned upload");
    }
  }
}

// ─── Reads ────────────────────────────────────────────────────────────────────

/// `GET /staff/appraisals`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<Appraisal>>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  Ok(Json(state.workflow.staff_appraisals(&actor).await?))
}

/// `GET /staff/appraisals/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<Appraisal>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  let id = parse_ref(&id)?;
  Ok(Json(state.workflow.staff_appraisal(&actor, id).await?))
}

// ─── Accept / reject ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RejectBody {
  pub comments: Option<String>,
}

/// `POST /staff/appraisals/{id}/accept`
pub async fn accept<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<Appraisal>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  let id = parse_ref(&id)?;
  let appraisal = state
    .workflow
    .respond(&actor, id, StaffDecision::Accepted, None)
    .await?;
  Ok(Json(appraisal))
}

/// `POST /staff/appraisals/{id}/reject` with body `{"comments": ...}`
pub async fn reject<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<String>,
  Json(body): Json<RejectBody>,
) -> Result<Json<Appraisal>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  let id = parse_ref(&id)?;
  let appraisal = state
    .workflow
    .respond(&actor, id, StaffDecision::Rejected, body.comments)
    .await?;
  Ok(Json(appraisal))
}
