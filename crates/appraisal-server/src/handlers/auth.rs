//! Handlers for account endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/register` | Public. Body: [`Registration`] |
//! | `GET`  | `/me` | The authenticated caller |

use appraisal_core::{
  store::AppraisalStore,
  user::{Actor, Registration, User},
};
use axum::{Json, extract::State, http::StatusCode};

use crate::{
  AppState,
  auth::{CurrentUser, hash_password},
  error::ApiError,
};

/// `POST /auth/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<Registration>,
) -> Result<(StatusCode, Json<User>), ApiError>
where
  S: AppraisalStore + Clone + 'static,
{
  // Refuse bad input before paying for the hash.
  body.validate()?;
  let hash = hash_password(&body.password)?;
  let user = state.workflow.register(body, hash).await?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /me`
pub async fn me(CurrentUser(actor): CurrentUser) -> Json<Actor> { Json(actor) }
