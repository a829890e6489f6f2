//! Handlers for the `/committee` and `/faculty` panels.
//!
//! Both panels share the same shape; each route pins the [`Panel`] it acts
//! as so a committee member cannot reach faculty routes and vice versa.

use appraisal_core::{
  appraisal::Appraisal,
  parse_ref,
  store::AppraisalStore,
  traits::PersonalityTraitsEvaluation,
  user::Actor,
  workflow::{Form, Panel},
};
use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use serde::Deserialize;

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct TraitsParams {
  pub staff_id: Option<String>,
}

// ─── Shared ───────────────────────────────────────────────────────────────────

async fn appraisal<S: AppraisalStore>(
  state: &AppState<S>,
  actor: &Actor,
  panel: Panel,
  id: &str,
) -> Result<Appraisal, ApiError> {
  actor.require_role(&[panel.role()])?;
  let id = parse_ref(id)?;
  Ok(state.workflow.reviewer_appraisal(actor, id).await?)
}

async fn review<S: AppraisalStore>(
  state: &AppState<S>,
  actor: &Actor,
  panel: Panel,
  id: &str,
  form: &Form,
) -> Result<Appraisal, ApiError> {
  let id = parse_ref(id)?;
  let appraisal = match panel {
    Panel::Committee => state.workflow.review_as_committee(actor, id, form).await?,
    Panel::Faculty => state.workflow.review_as_faculty(actor, id, form).await?,
  };
  Ok(appraisal)
}

async fn traits<S: AppraisalStore>(
  state: &AppState<S>,
  actor: &Actor,
  panel: Panel,
  params: TraitsParams,
) -> Result<Vec<PersonalityTraitsEvaluation>, ApiError> {
  actor.require_role(&[panel.role()])?;
  let staff_id = params.staff_id.as_deref().map(parse_ref).transpose()?;
  Ok(state.workflow.traits_evaluations(actor, staff_id).await?)
}

async fn traits_one<S: AppraisalStore>(
  state: &AppState<S>,
  actor: &Actor,
  panel: Panel,
  id: &str,
) -> Result<PersonalityTraitsEvaluation, ApiError> {
  actor.require_role(&[panel.role()])?;
  let id = parse_ref(id)?;
  Ok(state.workflow.traits_evaluation(actor, id).await?)
}

// ─── Committee ────────────────────────────────────────────────────────────────

/// `GET /committee/appraisals`
pub async fn committee_queue<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<Appraisal>>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  Ok(Json(state.workflow.panel_queue(&actor, Panel::Committee).await?))
}

/// `GET /committee/appraisals/{id}`
pub async fn committee_get<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<Appraisal>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  Ok(Json(appraisal(&state, &actor, Panel::Committee, &id).await?))
}

/// `POST /committee/appraisals/{id}/review`
pub async fn committee_review<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<String>,
  Json(form): Json<Form>,
) -> Result<Json<Appraisal>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  Ok(Json(review(&state, &actor, Panel::Committee, &id, &form).await?))
}

/// `DELETE /committee/appraisals/{id}`
pub async fn committee_delete<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  let id = parse_ref(&id)?;
  state.workflow.delete_appraisal(&actor, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /committee/personality-traits[?staff_id=<uuid>]`
pub async fn committee_traits<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Query(params): Query<TraitsParams>,
) -> Result<Json<Vec<PersonalityTraitsEvaluation>>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  Ok(Json(traits(&state, &actor, Panel::Committee, params).await?))
}

/// `GET /committee/personality-traits/{id}`
pub async fn committee_traits_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<PersonalityTraitsEvaluation>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  Ok(Json(traits_one(&state, &actor, Panel::Committee, &id).await?))
}

// ─── Faculty ──────────────────────────────────────────────────────────────────

/// `GET /faculty/appraisals`
pub async fn faculty_queue<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<Appraisal>>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  Ok(Json(state.workflow.panel_queue(&actor, Panel::Faculty).await?))
}

/// `GET /faculty/appraisals/{id}`
pub async fn faculty_get<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<Appraisal>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  Ok(Json(appraisal(&state, &actor, Panel::Faculty, &id).await?))
}

/// `POST /faculty/appraisals/{id}/review`
pub async fn faculty_review<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<String>,
  Json(form): Json<Form>,
) -> Result<Json<Appraisal>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  Ok(Json(review(&state, &actor, Panel::Faculty, &id, &form).await?))
}

/// `GET /faculty/personality-traits[?staff_id=<uuid>]`
pub async fn faculty_traits<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Query(params): Query<TraitsParams>,
) -> Result<Json<Vec<PersonalityTraitsEvaluation>>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  Ok(Json(traits(&state, &actor, Panel::Faculty, params).await?))
}

/// `GET /faculty/personality-traits/{id}`
pub async fn faculty_traits_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<PersonalityTraitsEvaluation>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  Ok(Json(traits_one(&state, &actor, Panel::Faculty, &id).await?))
}
