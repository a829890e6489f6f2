//! The `AppraisalStore` trait and supporting query types.
//!
//! Implemented by storage backends (e.g. `appraisal-store-sqlite`). The
//! workflow service and the HTTP layer depend on this abstraction only.

use std::future::Future;

use uuid::Uuid;

use crate::{
  appraisal::Appraisal,
  profile::Profile,
  status::AppraisalStatus,
  traits::PersonalityTraitsEvaluation,
  user::{NewUser, User},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`AppraisalStore::list_appraisals`]. Every set field must
/// match; an empty `statuses` matches any status.
#[derive(Debug, Clone, Default)]
pub struct AppraisalQuery {
  pub staff_id:   Option<Uuid>,
  pub faculty:    Option<String>,
  pub department: Option<String>,
  pub statuses:   Vec<AppraisalStatus>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an appraisal document store.
///
/// Each method touches exactly one document and is atomic for that document.
/// Nothing spans documents; callers that write more than one record accept
/// that a later write may fail after an earlier one succeeded.
pub trait AppraisalStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. The store assigns `user_id` and `created_at`.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Case-insensitive lookup by email address.
  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Replace the stored user with the same id.
  fn update_user(
    &self,
    user: User,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Appraisals ────────────────────────────────────────────────────────

  fn insert_appraisal(
    &self,
    appraisal: Appraisal,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_appraisal(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Appraisal>, Self::Error>> + Send + '_;

  /// Replace the whole record with the same id.
  fn update_appraisal(
    &self,
    appraisal: Appraisal,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Hard delete. Returns `false` if nothing was deleted.
  fn delete_appraisal(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Appraisals matching `query`, most recently submitted first.
  fn list_appraisals<'a>(
    &'a self,
    query: &'a AppraisalQuery,
  ) -> impl Future<Output = Result<Vec<Appraisal>, Self::Error>> + Send + 'a;

  /// The most recently submitted appraisal owned by `staff_id`.
  fn latest_appraisal_for(
    &self,
    staff_id: Uuid,
  ) -> impl Future<Output = Result<Option<Appraisal>, Self::Error>> + Send + '_;

  // ── Personality traits ────────────────────────────────────────────────

  fn insert_traits_evaluation(
    &self,
    evaluation: PersonalityTraitsEvaluation,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_traits_evaluation(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<PersonalityTraitsEvaluation>, Self::Error>>
  + Send
  + '_;

  /// All evaluations, or only those for `staff_id`, newest first.
  fn list_traits_evaluations(
    &self,
    staff_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<PersonalityTraitsEvaluation>, Self::Error>>
  + Send
  + '_;

  // ── Profiles ──────────────────────────────────────────────────────────

  fn get_profile(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Insert or replace the profile for `profile.user_id`.
  fn save_profile(
    &self,
    profile: Profile,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
