//! HTTP Basic-auth identity: `email:password` checked against the user's
//! argon2 hash.

use appraisal_core::{Error, store::AppraisalStore, user::Actor};
use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::OsRng;

use crate::{AppState, error::ApiError};

/// The authenticated caller. Any route taking this extractor answers 401
/// without valid credentials.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Actor);

/// Hash a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::BadRequest(format!("cannot hash password: {e}")))
}

/// Split the `Authorization` header into an email and a password.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let encoded = value.strip_prefix("Basic ")?;
  let decoded = B64.decode(encoded.trim()).ok()?;
  let creds = String::from_utf8(decoded).ok()?;
  let (email, password) = creds.split_once(':')?;
  Some((email.to_owned(), password.to_owned()))
}

fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc).is_ok_and(|parsed| {
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  })
}

/// Resolve the caller behind `headers`. Unknown emails and wrong passwords
/// are indistinguishable.
pub async fn authenticate<S: AppraisalStore>(
  headers: &HeaderMap,
  store: &S,
) -> Result<Actor, ApiError> {
  let (email, password) = basic_credentials(headers).ok_or(Error::Unauthenticated)?;
  let user = store
    .find_user_by_email(&email)
    .await
    .map_err(Error::store)?
    .ok_or(Error::Unauthenticated)?;
  if !verify_password(&password, &user.password_hash) {
    return Err(Error::Unauthenticated.into());
  }
  Ok(Actor::from(&user))
}

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: AppraisalStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let actor = authenticate(&parts.headers, state.workflow.store()).await?;
    Ok(CurrentUser(actor))
  }
}

#[cfg(test)]
mod tests {
  use appraisal_core::user::{NewUser, Role, StaffCategory};
  use appraisal_store_sqlite::SqliteStore;
  use axum::http::HeaderValue;

  use super::*;

  fn basic(user: &str, pass: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let value = format!("Basic {}", B64.encode(format!("{user}:{pass}")));
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
    headers
  }

  async fn store_with(email: &str, password: &str) -> SqliteStore {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store
      .add_user(NewUser {
        full_name:     "Ada".into(),
        email:         email.into(),
        phone:         "0800".into(),
        role:          Role::Hod,
        staff_number:  Some("H-1".into()),
        faculty:       "Science".into(),
        department:    "Physics".into(),
        category:      StaffCategory::Senior,
        password_hash: hash_password(password).unwrap(),
      })
      .await
      .unwrap();
    store
  }

  #[tokio::test]
  async fn correct_credentials_yield_actor() {
    let store = store_with("ada@example.edu", "secret1").await;
    let actor = authenticate(&basic("ADA@example.edu", "secret1"), &store)
      .await
      .unwrap();
    assert_eq!(actor.role, Role::Hod);
    assert_eq!(actor.department, "Physics");
  }

  #[tokio::test]
  async fn bad_credentials_are_unauthenticated() {
    let store = store_with("ada@example.edu", "secret1").await;
    for headers in [
      basic("ada@example.edu", "wrong"),
      basic("nobody@example.edu", "secret1"),
      HeaderMap::new(),
    ] {
      let err = authenticate(&headers, &store).await.unwrap_err();
      assert!(matches!(err, ApiError::Core(Error::Unauthenticated)));
    }
  }

  #[test]
  fn malformed_header_is_ignored() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic !!!"));
    assert!(basic_credentials(&headers).is_none());
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
    assert!(basic_credentials(&headers).is_none());
  }
}
