//! The appraisal workflow service.
//!
//! Every operation takes a verified [`Actor`], checks its role and its
//! relationship to the record, applies the state machine and persists the
//! result through an [`AppraisalStore`]. Stage outcomes are mirrored into the
//! owner's profile history on a best-effort basis.

use std::{collections::BTreeMap, sync::Arc};

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  appraisal::{
    Appraisal, AppraisalData, HodEvaluation, PanelReview, StaffDecision, StaffReview,
    staff_category,
  },
  normalize::Submission,
  profile::{HistoryEntry, Profile, Stage},
  report::{self, Report},
  scoring::{Rounding, coerce_rating, coerce_score, score},
  status::{Action, AppraisalStatus},
  store::{AppraisalQuery, AppraisalStore},
  traits::{PersonalityTraitsEvaluation, TraitsForm},
  user::{Actor, Registration, Role, User},
};

/// A free-form review submission keyed by field name.
pub type Form = BTreeMap<String, Value>;

/// Prefix marking a rated item in an HOD evaluation form.
pub const RATING_PREFIX: &str = "item_";

// ─── Panels ──────────────────────────────────────────────────────────────────

/// The two review panels that follow staff acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
  Committee,
  Faculty,
}

impl Panel {
  pub fn role(self) -> Role {
    match self {
      Self::Committee => Role::Committee,
      Self::Faculty => Role::Faculty,
    }
  }

  fn action(self) -> Action {
    match self {
      Self::Committee => Action::CommitteeReview,
      Self::Faculty => Action::FacultyReview,
    }
  }

  fn stage(self) -> Stage {
    match self {
      Self::Committee => Stage::CommitteeReview,
      Self::Faculty => Stage::FacultyReview,
    }
  }

  /// Statuses waiting on this panel.
  pub fn queue(self) -> Vec<AppraisalStatus> {
    match self {
      Self::Committee => vec![
        AppraisalStatus::PendingCommitteeReview,
        AppraisalStatus::AcceptedByStaff,
      ],
      Self::Faculty => vec![AppraisalStatus::PendingFacultyPanel],
    }
  }
}

/// Editable profile fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
  pub full_name: Option<String>,
  pub phone:     Option<String>,
}

/// Outcome of a personality-traits submission.
#[derive(Debug, Clone)]
pub struct TraitsOutcome {
  pub evaluation: PersonalityTraitsEvaluation,
  /// Status of the appraisal after the evaluation was attached.
  pub status:     AppraisalStatus,
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct Workflow<S> {
  store: Arc<S>,
}

impl<S> Clone for Workflow<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: AppraisalStore> Workflow<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a validated registration. `password_hash` is the already-hashed
  /// password from `registration`.
  pub async fn register(
    &self,
    registration: Registration,
    password_hash: String,
  ) -> Result<User> {
    registration.validate()?;
    let taken = self
      .store
      .find_user_by_email(registration.email.trim())
      .await
      .map_err(Error::store)?;
    if taken.is_some() {
      return Err(Error::validation("email is already registered"));
    }
    let user = self
      .store
      .add_user(registration.into_new_user(password_hash))
      .await
      .map_err(Error::store)?;
    info!(user_id = %user.user_id, role = user.role.as_str(), "registered user");
    Ok(user)
  }

  async fn user(&self, id: Uuid) -> Result<User> {
    self
      .store
      .get_user(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found("user"))
  }

  // ── Staff ─────────────────────────────────────────────────────────────

  /// Create a `submitted_by_staff` appraisal from a raw form. `documents` are
  /// file references already written by the caller.
  pub async fn submit_appraisal(
    &self,
    actor: &Actor,
    form: &Submission,
    documents: Vec<String>,
  ) -> Result<Appraisal> {
    actor.require_role(&[Role::Staff])?;
    let category = staff_category(form)?;
    let owner = self.user(actor.user_id).await?;

    let appraisal =
      Appraisal::new(&owner, category, AppraisalData::from_submission(form), documents);
    self
      .store
      .insert_appraisal(appraisal.clone())
      .await
      .map_err(Error::store)?;
    info!(appraisal_id = %appraisal.appraisal_id, staff_id = %owner.user_id, "appraisal submitted");
    Ok(appraisal)
  }

  /// The actor's own appraisals, newest first.
  pub async fn staff_appraisals(&self, actor: &Actor) -> Result<Vec<Appraisal>> {
    actor.require_role(&[Role::Staff])?;
    self.list(AppraisalQuery {
      staff_id: Some(actor.user_id),
      ..Default::default()
    })
    .await
  }

  pub async fn staff_appraisal(&self, actor: &Actor, id: Uuid) -> Result<Appraisal> {
    actor.require_role(&[Role::Staff])?;
    self.owned(actor, id).await
  }

  /// Accept or reject the HOD's evaluation of an appraisal the actor owns.
  pub async fn respond(
    &self,
    actor: &Actor,
    id: Uuid,
    decision: StaffDecision,
    comments: Option<String>,
  ) -> Result<Appraisal> {
    actor.require_role(&[Role::Staff])?;
    let mut appraisal = self.owned(actor, id).await?;
    let action = match decision {
      StaffDecision::Accepted => Action::StaffAccept,
      StaffDecision::Rejected => Action::StaffReject,
    };
    let next = appraisal.status.apply(action)?;

    appraisal.staff_review = Some(StaffReview {
      action: decision,
      comments: comments.map(|c| c.trim().to_owned()).filter(|c| !c.is_empty()),
      reviewed_by_id: actor.user_id,
      reviewed_at: Utc::now(),
    });
    self.transition(&mut appraisal, next).await?;
    Ok(appraisal)
  }

  // ── HOD ───────────────────────────────────────────────────────────────

  /// Appraisals in the HOD's faculty and department awaiting evaluation.
  pub async fn hod_queue(&self, actor: &Actor) -> Result<Vec<Appraisal>> {
    actor.require_role(&[Role::Hod])?;
    self.list(AppraisalQuery {
      faculty: Some(actor.faculty.clone()),
      department: Some(actor.department.clone()),
      statuses: vec![
        AppraisalStatus::SubmittedByStaff,
        AppraisalStatus::RejectedByStaff,
      ],
      ..Default::default()
    })
    .await
  }

  /// Score the `item_*` ratings in `form` and move the appraisal to
  /// `evaluated_by_hod`. Re-evaluation after a rejection overwrites the
  /// previous evaluation.
  pub async fn evaluate(&self, actor: &Actor, id: Uuid, form: &Form) -> Result<Appraisal> {
    actor.require_role(&[Role::Hod])?;
    let mut appraisal = self.load(id).await?;
    if appraisal.faculty != actor.faculty || appraisal.department != actor.department {
      return Err(Error::not_found("appraisal"));
    }
    let next = appraisal.status.apply(Action::HodEvaluate)?;

    let mut ratings = BTreeMap::new();
    let mut fields = BTreeMap::new();
    for (key, value) in form {
      if key.starts_with(RATING_PREFIX) {
        ratings.insert(key.clone(), coerce_rating(key, value)?);
      } else {
        fields.insert(key.clone(), value.clone());
      }
    }
    let summary = score(ratings.values().copied(), Rounding::Nearest);

    appraisal.hod_evaluation = Some(HodEvaluation {
      ratings,
      fields,
      summary,
      evaluated_by: actor.display_name.clone(),
      evaluated_by_id: actor.user_id,
      evaluated_at: Utc::now(),
    });
    self.transition(&mut appraisal, next).await?;

    let comments = format!(
      "Total Score: {}/{} ({}%). Performance Rating: {}",
      summary.total_score,
      summary.max_score,
      summary.percentage,
      summary.performance_rating.label()
    );
    self
      .record_stage(appraisal.staff_id, HistoryEntry {
        stage: Stage::HodReview,
        score: Some(summary.percentage),
        comments,
        reviewed_by: actor.display_name.clone(),
        reviewed_by_id: actor.user_id,
        date: Utc::now(),
        appraisal_id: Some(appraisal.appraisal_id),
      })
      .await;
    Ok(appraisal)
  }

  /// Attach a personality-traits evaluation to the target staff member's
  /// most recent appraisal.
  pub async fn submit_personality_traits(
    &self,
    actor: &Actor,
    form: &TraitsForm,
  ) -> Result<TraitsOutcome> {
    actor.require_role(&[Role::Hod])?;
    let scores = form.validate()?;

    let mut appraisal = self
      .store
      .latest_appraisal_for(scores.staff_id)
      .await
      .map_err(Error::store)?
      .filter(|a| a.faculty == actor.faculty)
      .ok_or_else(|| Error::not_found("appraisal"))?;

    let evaluation = PersonalityTraitsEvaluation::new(scores, &appraisal, actor);
    self
      .store
      .insert_traits_evaluation(evaluation.clone())
      .await
      .map_err(Error::store)?;

    appraisal.personality_traits_evaluation = Some(evaluation.evaluation_id);
    let next = appraisal.status.after_traits_evaluation();
    self.transition(&mut appraisal, next).await?;

    Ok(TraitsOutcome {
      evaluation,
      status: appraisal.status,
    })
  }

  // ── Panels ────────────────────────────────────────────────────────────

  /// Appraisals in the actor's faculty waiting on `panel`.
  pub async fn panel_queue(&self, actor: &Actor, panel: Panel) -> Result<Vec<Appraisal>> {
    actor.require_role(&[panel.role()])?;
    self.list(AppraisalQuery {
      faculty: Some(actor.faculty.clone()),
      statuses: panel.queue(),
      ..Default::default()
    })
    .await
  }

  pub async fn review_as_committee(
    &self,
    actor: &Actor,
    id: Uuid,
    form: &Form,
  ) -> Result<Appraisal> {
    self.review(actor, id, Panel::Committee, form).await
  }

  pub async fn review_as_faculty(
    &self,
    actor: &Actor,
    id: Uuid,
    form: &Form,
  ) -> Result<Appraisal> {
    self.review(actor, id, Panel::Faculty, form).await
  }

  async fn review(
    &self,
    actor: &Actor,
    id: Uuid,
    panel: Panel,
    form: &Form,
  ) -> Result<Appraisal> {
    actor.require_role(&[panel.role()])?;
    let mut appraisal = self.load(id).await?;
    if appraisal.faculty != actor.faculty {
      return Err(Error::not_found("appraisal"));
    }
    let next = appraisal.status.apply(panel.action())?;
    let review = panel_review(actor, form)?;

    let comments = format!(
      "Recommendation: {}. {}",
      review.recommendation,
      review.comments.as_deref().unwrap_or_default()
    )
    .trim()
    .to_owned();
    let entry = HistoryEntry {
      stage: panel.stage(),
      score: review.score,
      comments,
      reviewed_by: actor.display_name.clone(),
      reviewed_by_id: actor.user_id,
      date: review.reviewed_at,
      appraisal_id: Some(appraisal.appraisal_id),
    };

    match panel {
      Panel::Committee => appraisal.committee_review = Some(review),
      Panel::Faculty => appraisal.faculty_review = Some(review),
    }
    self.transition(&mut appraisal, next).await?;
    self.record_stage(appraisal.staff_id, entry).await;
    Ok(appraisal)
  }

  /// Hard-delete an appraisal in any state. Profile history is left alone.
  pub async fn delete_appraisal(&self, actor: &Actor, id: Uuid) -> Result<()> {
    actor.require_role(&[Role::Committee])?;
    let deleted = self
      .store
      .delete_appraisal(id)
      .await
      .map_err(Error::store)?;
    if !deleted {
      return Err(Error::not_found("appraisal"));
    }
    info!(appraisal_id = %id, deleted_by = %actor.user_id, "appraisal deleted");
    Ok(())
  }

  pub async fn traits_evaluations(
    &self,
    actor: &Actor,
    staff_id: Option<Uuid>,
  ) -> Result<Vec<PersonalityTraitsEvaluation>> {
    actor.require_role(&[Role::Committee, Role::Faculty])?;
    self
      .store
      .list_traits_evaluations(staff_id)
      .await
      .map_err(Error::store)
  }

  pub async fn traits_evaluation(
    &self,
    actor: &Actor,
    id: Uuid,
  ) -> Result<PersonalityTraitsEvaluation> {
    actor.require_role(&[Role::Committee, Role::Faculty])?;
    self
      .store
      .get_traits_evaluation(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found("personality traits evaluation"))
  }

  /// A single appraisal as seen by a reviewer. HODs see their department,
  /// panels see their faculty.
  pub async fn reviewer_appraisal(&self, actor: &Actor, id: Uuid) -> Result<Appraisal> {
    actor.require_role(&[Role::Hod, Role::Committee, Role::Faculty])?;
    let appraisal = self.load(id).await?;
    let visible = appraisal.faculty == actor.faculty
      && (actor.role != Role::Hod || appraisal.department == actor.department);
    if !visible {
      return Err(Error::not_found("appraisal"));
    }
    Ok(appraisal)
  }

  // ── Profiles ──────────────────────────────────────────────────────────

  /// The profile of `user_id`, created from the user record on first access.
  pub async fn profile(&self, actor: &Actor, user_id: Uuid) -> Result<Profile> {
    self.check_profile_access(actor, user_id)?;
    self.profile_or_create(user_id).await
  }

  pub async fn history(&self, actor: &Actor, user_id: Uuid) -> Result<Vec<HistoryEntry>> {
    Ok(self.profile(actor, user_id).await?.appraisal_history)
  }

  /// Update the actor's own name and phone. Changes are mirrored onto the
  /// user record.
  pub async fn update_profile(&self, actor: &Actor, update: ProfileUpdate) -> Result<Profile> {
    let clean = |v: Option<String>| v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty());
    let full_name = clean(update.full_name);
    let phone = clean(update.phone);

    let mut profile = self.profile_or_create(actor.user_id).await?;
    let mut user = self.user(actor.user_id).await?;
    if let Some(name) = full_name {
      profile.full_name.clone_from(&name);
      user.full_name = name;
    }
    if let Some(phone) = phone {
      profile.phone.clone_from(&phone);
      user.phone = phone;
    }
    profile.updated_at = Utc::now();

    self
      .store
      .save_profile(profile.clone())
      .await
      .map_err(Error::store)?;
    self.store.update_user(user).await.map_err(Error::store)?;
    Ok(profile)
  }

  /// Point the actor's profile at a newly stored photo. Returns the previous
  /// reference so the caller can remove the old file.
  pub async fn set_profile_photo(
    &self,
    actor: &Actor,
    reference: String,
  ) -> Result<Option<String>> {
    let mut profile = self.profile_or_create(actor.user_id).await?;
    let previous = profile.profile_photo.replace(reference);
    profile.updated_at = Utc::now();
    self.store.save_profile(profile).await.map_err(Error::store)?;
    Ok(previous)
  }

  /// Compile the history report of `user_id`.
  pub async fn report(&self, actor: &Actor, user_id: Uuid) -> Result<Report> {
    let profile = self.profile(actor, user_id).await?;
    let appraisals = self
      .list(AppraisalQuery {
        staff_id: Some(user_id),
        ..Default::default()
      })
      .await?;
    Ok(report::compile(&profile, &appraisals))
  }

  /// Upsert `entry` into `owner`'s history, creating the profile if needed.
  ///
  /// Failures are logged and reported through the return value only; the
  /// stage transition that triggered the call has already been persisted.
  pub async fn record_stage(&self, owner: Uuid, entry: HistoryEntry) -> bool {
    let stage = entry.stage;
    let appraisal_id = entry.appraisal_id;
    let mut profile = match self.profile_or_create(owner).await {
      Ok(profile) => profile,
      Err(e) => {
        warn!(%owner, %stage, error = %e, "could not resolve profile for history entry");
        return false;
      }
    };
    profile.record(entry);
    match self.store.save_profile(profile).await {
      Ok(()) => true,
      Err(e) => {
        error!(%owner, %stage, ?appraisal_id, error = %e, "failed to record appraisal history");
        false
      }
    }
  }

  // ── Helpers ───────────────────────────────────────────────────────────

  fn check_profile_access(&self, actor: &Actor, user_id: Uuid) -> Result<()> {
    if actor.can_view_profile_of(user_id) {
      Ok(())
    } else {
      Err(Error::Forbidden("staff may only view their own profile".into()))
    }
  }

  async fn profile_or_create(&self, user_id: Uuid) -> Result<Profile> {
    if let Some(profile) = self.store.get_profile(user_id).await.map_err(Error::store)? {
      return Ok(profile);
    }
    let profile = Profile::from_user(&self.user(user_id).await?);
    self
      .store
      .save_profile(profile.clone())
      .await
      .map_err(Error::store)?;
    Ok(profile)
  }

  async fn load(&self, id: Uuid) -> Result<Appraisal> {
    self
      .store
      .get_appraisal(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found("appraisal"))
  }

  async fn owned(&self, actor: &Actor, id: Uuid) -> Result<Appraisal> {
    let appraisal = self.load(id).await?;
    if appraisal.staff_id != actor.user_id {
      return Err(Error::not_found("appraisal"));
    }
    Ok(appraisal)
  }

  async fn list(&self, query: AppraisalQuery) -> Result<Vec<Appraisal>> {
    self
      .store
      .list_appraisals(&query)
      .await
      .map_err(Error::store)
  }

  async fn transition(&self, appraisal: &mut Appraisal, next: AppraisalStatus) -> Result<()> {
    let from = appraisal.status;
    appraisal.status = next;
    self
      .store
      .update_appraisal(appraisal.clone())
      .await
      .map_err(Error::store)?;
    info!(appraisal_id = %appraisal.appraisal_id, %from, to = %next, "appraisal status changed");
    Ok(())
  }
}

// ─── Form parsing ────────────────────────────────────────────────────────────

const RECOMMENDATION: &str = "recommendation";
const COMMENT_KEYS: [&str; 2] = ["comments", "committeeComments"];
const SCORE_KEYS: [&str; 2] = ["score", "overallPerformance"];

fn text(value: &Value) -> Option<String> {
  let s = match value {
    Value::String(s) => s.trim().to_owned(),
    Value::Number(n) => n.to_string(),
    _ => return None,
  };
  (!s.is_empty()).then_some(s)
}

fn first_of<'a>(form: &'a Form, keys: &[&str]) -> Option<&'a Value> {
  keys.iter().find_map(|k| form.get(*k))
}

/// Build a [`PanelReview`] from a submitted form. `recommendation` is
/// required; every unrecognised field is kept verbatim.
fn panel_review(actor: &Actor, form: &Form) -> Result<PanelReview> {
  let recommendation = form
    .get(RECOMMENDATION)
    .and_then(text)
    .ok_or_else(|| Error::validation("recommendation is required"))?;
  let comments = first_of(form, &COMMENT_KEYS).and_then(text);
  let score = first_of(form, &SCORE_KEYS).and_then(coerce_score);

  let fields = form
    .iter()
    .filter(|(k, _)| {
      *k != RECOMMENDATION
        && !COMMENT_KEYS.contains(&k.as_str())
        && !SCORE_KEYS.contains(&k.as_str())
    })
    .map(|(k, v)| (k.clone(), v.clone()))
    .collect();

  Ok(PanelReview {
    recommendation,
    comments,
    score,
    fields,
    reviewed_by: actor.display_name.clone(),
    reviewed_by_id: actor.user_id,
    reviewed_at: Utc::now(),
  })
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn actor() -> Actor {
    Actor {
      user_id:      Uuid::new_v4(),
      role:         Role::Committee,
      department:   "Physics".into(),
      faculty:      "Science".into(),
      display_name: "Prof. Panel".into(),
    }
  }

  fn form(v: Value) -> Form { serde_json::from_value(v).unwrap() }

  #[test]
  fn panel_review_reads_aliases() {
    let review = panel_review(
      &actor(),
      &form(json!({
        "recommendation": "Promote",
        "committeeComments": " solid year ",
        "overallPerformance": "82",
        "meetingDate": "2024-05-01"
      })),
    )
    .unwrap();
    assert_eq!(review.recommendation, "Promote");
    assert_eq!(review.comments.as_deref(), Some("solid year"));
    assert_eq!(review.score, Some(82.0));
    assert_eq!(review.fields.len(), 1);
    assert_eq!(review.fields["meetingDate"], "2024-05-01");
  }

  #[test]
  fn panel_review_prefers_primary_keys() {
    let review = panel_review(
      &actor(),
      &form(json!({
        "recommendation": "Retain",
        "comments": "primary",
        "committeeComments": "alias",
        "score": 70,
        "overallPerformance": 10
      })),
    )
    .unwrap();
    assert_eq!(review.comments.as_deref(), Some("primary"));
    assert_eq!(review.score, Some(70.0));
  }

  #[test]
  fn panel_review_requires_recommendation() {
    let err = panel_review(&actor(), &form(json!({ "recommendation": "  " })));
    assert!(matches!(err, Err(Error::Validation(_))));
  }

  #[test]
  fn panel_queues() {
    assert_eq!(Panel::Faculty.queue(), [AppraisalStatus::PendingFacultyPanel]);
    assert!(Panel::Committee.queue().contains(&AppraisalStatus::AcceptedByStaff));
  }
}
