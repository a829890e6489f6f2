//! Handlers for `/hod` endpoints.

use appraisal_core::{
  appraisal::Appraisal,
  parse_ref,
  store::AppraisalStore,
  traits::TraitsForm,
  user::Role,
  workflow::Form,
};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use serde_json::{Value, json};

use crate::{AppState, auth::CurrentUser, error::ApiError};

/// `GET /hod/appraisals`
pub async fn queue<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<Appraisal>>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  Ok(Json(state.workflow.hod_queue(&actor).await?))
}

/// `GET /hod/appraisals/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<Appraisal>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  actor.require_role(&[Role::Hod])?;
  let id = parse_ref(&id)?;
  Ok(Json(state.workflow.reviewer_appraisal(&actor, id).await?))
}

/// `POST /hod/appraisals/{id}/evaluate`, body: `{"item_<key>": 1..5, ...}`
pub async fn evaluate<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Path(id): Path<String>,
  Json(form): Json<Form>,
) -> Result<Json<Appraisal>, ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  let id = parse_ref(&id)?;
  Ok(Json(state.workflow.evaluate(&actor, id, &form).await?))
}

/// `POST /hod/personality-traits`
pub async fn personality_traits<S>(
  State(state): State<AppState<S>>,
  CurrentUser(actor): CurrentUser,
  Json(form): Json<TraitsForm>,
) -> Result<(StatusCode, Json<Value>), ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  let outcome = state
    .workflow
    .submit_personality_traits(&actor, &form)
    .await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({
      "evaluation": outcome.evaluation,
      "status":     outcome.status,
    })),
  ))
}
