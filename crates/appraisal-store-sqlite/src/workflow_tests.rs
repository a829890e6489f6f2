//! End-to-end workflow scenarios run against an in-memory `SqliteStore`.

use std::sync::Arc;

use appraisal_core::{
  Error, Workflow,
  appraisal::StaffDecision,
  normalize::Submission,
  profile::{HistoryEntry, Stage},
  report::Block,
  scoring::PerformanceRating,
  status::AppraisalStatus,
  store::AppraisalStore,
  traits::TraitsForm,
  user::{Actor, NewUser, Registration, Role, StaffCategory},
  workflow::{Form, Panel, ProfileUpdate},
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::SqliteStore;

struct Fixture {
  workflow:  Workflow<SqliteStore>,
  staff:     Actor,
  hod:       Actor,
  committee: Actor,
  faculty:   Actor,
}

async fn add(
  store: &SqliteStore,
  name: &str,
  role: Role,
  faculty: &str,
  department: &str,
) -> Actor {
  let user = store
    .add_user(NewUser {
      full_name:     name.to_owned(),
      email:         format!("{}@example.edu", name.to_lowercase().replace(' ', ".")),
      phone:         "0800".into(),
      role,
      staff_number:  role.is_reviewer().then(|| "S-1".to_owned()),
      faculty:       faculty.to_owned(),
      department:    department.to_owned(),
      category:      StaffCategory::Junior,
      password_hash: String::new(),
    })
    .await
    .unwrap();
  Actor::from(&user)
}

async fn fixture() -> Fixture {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let staff = add(&store, "Ada Obi", Role::Staff, "Science", "Physics").await;
  let hod = add(&store, "Dr Hod", Role::Hod, "Science", "Physics").await;
  let committee = add(&store, "Prof Committee", Role::Committee, "Science", "Physics").await;
  let faculty = add(&store, "Dean Faculty", Role::Faculty, "Science", "Physics").await;
  Fixture {
    workflow: Workflow::new(Arc::new(store)),
    staff,
    hod,
    committee,
    faculty,
  }
}

fn submission() -> Submission {
  Submission::new()
    .with("employeeName", "Ada Obi")
    .with("staffCategory", "junior")
    .with("institution[]", vec!["A", "B", "C"])
    .with("fromYear[]", vec!["2001", "2005", "2010"])
    .with("toYear[]", vec!["2004", "2008", "2012"])
    .with("qualification[]", vec!["BSc", "MSc", "PhD"])
}

fn form(v: Value) -> Form { serde_json::from_value(v).unwrap() }

fn ratings() -> Form {
  form(json!({
    "item_1": 5, "item_2": "5", "item_3": 4, "item_4": 3, "item_5": 2,
    "hodComments": "Good year"
  }))
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_review_path() {
  let f = fixture().await;
  let w = &f.workflow;

  let appraisal = w.submit_appraisal(&f.staff, &submission(), vec![]).await.unwrap();
  assert_eq!(appraisal.status, AppraisalStatus::SubmittedByStaff);
  let rows: Vec<_> = appraisal
    .data
    .academic_qualifications
    .iter()
    .map(|q| q.institution.as_str())
    .collect();
  assert_eq!(rows, ["A", "B", "C"]);
  let id = appraisal.appraisal_id;

  assert_eq!(w.hod_queue(&f.hod).await.unwrap().len(), 1);
  let evaluated = w.evaluate(&f.hod, id, &ratings()).await.unwrap();
  let eval = evaluated.hod_evaluation.as_ref().unwrap();
  assert_eq!((eval.summary.total_score, eval.summary.max_score), (19, 25));
  assert_eq!(eval.summary.percentage, 76.0);
  assert_eq!(eval.summary.performance_rating, PerformanceRating::VeryGood);
  assert_eq!(eval.fields["hodComments"], "Good year");
  assert_eq!(evaluated.status, AppraisalStatus::EvaluatedByHod);

  let accepted = w
    .respond(&f.staff, id, StaffDecision::Accepted, None)
    .await
    .unwrap();
  assert_eq!(accepted.status, AppraisalStatus::PendingCommitteeReview);

  let queue = w.panel_queue(&f.committee, Panel::Committee).await.unwrap();
  assert_eq!(queue.len(), 1);
  assert!(w.panel_queue(&f.faculty, Panel::Faculty).await.unwrap().is_empty());
  let reviewed = w
    .review_as_committee(&f.committee, id, &form(json!({ "recommendation": "Promote" })))
    .await
    .unwrap();
  assert_eq!(reviewed.status, AppraisalStatus::PendingFacultyPanel);

  let history = w.history(&f.staff, f.staff.user_id).await.unwrap();
  assert_eq!(history.len(), 2);
  let hod_entry = history.iter().find(|e| e.stage == Stage::HodReview).unwrap();
  assert_eq!(hod_entry.score, Some(76.0));
  assert_eq!(
    hod_entry.comments,
    "Total Score: 19/25 (76%). Performance Rating: Very Good"
  );
  assert_eq!(hod_entry.appraisal_id, Some(id));
  let committee_entry = history
    .iter()
    .find(|e| e.stage == Stage::CommitteeReview)
    .unwrap();
  assert_eq!(committee_entry.score, None);
  assert_eq!(committee_entry.comments, "Recommendation: Promote.");

  let done = w
    .review_as_faculty(
      &f.faculty,
      id,
      &form(json!({ "recommendation": "Approve", "comments": "Well done", "score": 88 })),
    )
    .await
    .unwrap();
  assert_eq!(done.status, AppraisalStatus::ReviewedByFaculty);
  assert_eq!(done.faculty_review.as_ref().unwrap().score, Some(88.0));

  let history = w.history(&f.staff, f.staff.user_id).await.unwrap();
  assert_eq!(history.len(), 3);
  assert_eq!(history[2].comments, "Recommendation: Approve. Well done");

  let report = w.report(&f.committee, f.staff.user_id).await.unwrap();
  assert!(report.blocks.contains(&Block::Heading(format!("Appraisal ID: {id}"))));
  assert_eq!(
    report.blocks.iter().filter(|b| matches!(b, Block::TableRow(_))).count(),
    3
  );
}

#[tokio::test]
async fn reject_then_reevaluate_overwrites() {
  let f = fixture().await;
  let w = &f.workflow;
  let id = w
    .submit_appraisal(&f.staff, &submission(), vec![])
    .await
    .unwrap()
    .appraisal_id;

  w.evaluate(&f.hod, id, &form(json!({ "item_1": 1, "item_2": 1 })))
    .await
    .unwrap();
  let rejected = w
    .respond(&f.staff, id, StaffDecision::Rejected, Some("too low".into()))
    .await
    .unwrap();
  assert_eq!(rejected.status, AppraisalStatus::RejectedByStaff);
  assert_eq!(
    rejected.staff_review.as_ref().unwrap().comments.as_deref(),
    Some("too low")
  );
  assert_eq!(w.hod_queue(&f.hod).await.unwrap().len(), 1);

  let again = w.evaluate(&f.hod, id, &ratings()).await.unwrap();
  assert_eq!(again.status, AppraisalStatus::EvaluatedByHod);
  assert_eq!(again.hod_evaluation.as_ref().unwrap().summary.total_score, 19);

  let history = w.history(&f.staff, f.staff.user_id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].score, Some(76.0));
}

#[tokio::test]
async fn illegal_transitions_are_refused() {
  let f = fixture().await;
  let w = &f.workflow;
  let id = w
    .submit_appraisal(&f.staff, &submission(), vec![])
    .await
    .unwrap()
    .appraisal_id;

  let err = w
    .review_as_committee(&f.committee, id, &form(json!({ "recommendation": "x" })))
    .await;
  assert!(matches!(
    err,
    Err(Error::IllegalTransition { from: AppraisalStatus::SubmittedByStaff, .. })
  ));
  let err = w.respond(&f.staff, id, StaffDecision::Accepted, None).await;
  assert!(matches!(err, Err(Error::IllegalTransition { .. })));

  let unchanged = w.staff_appraisal(&f.staff, id).await.unwrap();
  assert_eq!(unchanged.status, AppraisalStatus::SubmittedByStaff);
}

#[tokio::test]
async fn relationship_failures_look_like_missing_records() {
  let f = fixture().await;
  let w = &f.workflow;
  let id = w
    .submit_appraisal(&f.staff, &submission(), vec![])
    .await
    .unwrap()
    .appraisal_id;

  let store = w.store();
  let other_hod = add(store, "Other Hod", Role::Hod, "Science", "Chemistry").await;
  let other_staff = add(store, "Bo Staff", Role::Staff, "Science", "Physics").await;
  let law_panel = add(store, "Law Panel", Role::Committee, "Law", "Torts").await;

  assert!(matches!(w.evaluate(&other_hod, id, &ratings()).await, Err(Error::NotFound(_))));
  assert!(matches!(w.staff_appraisal(&other_staff, id).await, Err(Error::NotFound(_))));
  assert!(matches!(w.reviewer_appraisal(&law_panel, id).await, Err(Error::NotFound(_))));
  assert!(matches!(
    w.evaluate(&f.hod, Uuid::new_v4(), &ratings()).await,
    Err(Error::NotFound(_))
  ));
  assert!(matches!(w.evaluate(&f.staff, id, &ratings()).await, Err(Error::Forbidden(_))));
  assert!(matches!(
    w.history(&other_staff, f.staff.user_id).await,
    Err(Error::Forbidden(_))
  ));
}

#[tokio::test]
async fn delete_leaves_history_intact() {
  let f = fixture().await;
  let w = &f.workflow;
  let id = w
    .submit_appraisal(&f.staff, &submission(), vec![])
    .await
    .unwrap()
    .appraisal_id;
  w.evaluate(&f.hod, id, &ratings()).await.unwrap();

  assert!(matches!(w.delete_appraisal(&f.hod, id).await, Err(Error::Forbidden(_))));
  w.delete_appraisal(&f.committee, id).await.unwrap();
  assert!(matches!(w.delete_appraisal(&f.committee, id).await, Err(Error::NotFound(_))));
  assert!(w.staff_appraisals(&f.staff).await.unwrap().is_empty());

  let history = w.history(&f.staff, f.staff.user_id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].appraisal_id, Some(id));

  // The orphaned entry still renders, without an appraisal header.
  let report = w.report(&f.staff, f.staff.user_id).await.unwrap();
  assert!(!report.blocks.contains(&Block::Heading(format!("Appraisal ID: {id}"))));
  assert!(report.blocks.contains(&Block::TableHeader));
}

#[tokio::test]
async fn personality_traits_attach_to_latest_appraisal() {
  let f = fixture().await;
  let w = &f.workflow;
  let id = w
    .submit_appraisal(&f.staff, &submission(), vec![])
    .await
    .unwrap()
    .appraisal_id;

  let traits: TraitsForm = serde_json::from_value(json!({
    "staffId": f.staff.user_id.to_string(),
    "staffType": "junior",
    "overallComments": "Dependable",
    "traits": {
      "a": { "rating": 5 }, "b": { "rating": 5 }, "c": { "rating": 5 },
      "d": { "rating": 5 }, "e": { "rating": 5 }, "f": { "rating": 5 },
      "g": { "rating": 5 }, "h": { "rating": 4 }
    }
  }))
  .unwrap();
  let outcome = w.submit_personality_traits(&f.hod, &traits).await.unwrap();
  assert_eq!(outcome.status, AppraisalStatus::PendingCommitteeReview);
  assert_eq!(outcome.evaluation.appraisal_id, id);
  assert_eq!(outcome.evaluation.summary.percentage, 97.5);
  assert_eq!(outcome.evaluation.department, "Physics");

  let stored = w.reviewer_appraisal(&f.committee, id).await.unwrap();
  assert_eq!(
    stored.personality_traits_evaluation,
    Some(outcome.evaluation.evaluation_id)
  );

  // A second evaluation leaves the now-locked status alone.
  let again = w.submit_personality_traits(&f.hod, &traits).await.unwrap();
  assert_eq!(again.status, AppraisalStatus::PendingCommitteeReview);

  let listed = w
    .traits_evaluations(&f.faculty, Some(f.staff.user_id))
    .await
    .unwrap();
  assert_eq!(listed.len(), 2);
  let one = w
    .traits_evaluation(&f.committee, outcome.evaluation.evaluation_id)
    .await
    .unwrap();
  assert_eq!(one, outcome.evaluation);
  assert!(matches!(
    w.traits_evaluations(&f.staff, None).await,
    Err(Error::Forbidden(_))
  ));
}

#[tokio::test]
async fn profile_is_created_lazily_and_updates_mirror_to_user() {
  let f = fixture().await;
  let w = &f.workflow;

  let profile = w.profile(&f.staff, f.staff.user_id).await.unwrap();
  assert_eq!(profile.full_name, "Ada Obi");
  assert!(profile.appraisal_history.is_empty());

  let updated = w
    .update_profile(&f.staff, ProfileUpdate {
      full_name: Some(" Ada Obi-Eze ".into()),
      phone:     Some("  ".into()),
    })
    .await
    .unwrap();
  assert_eq!(updated.full_name, "Ada Obi-Eze");
  assert_eq!(updated.phone, "0800");
  let user = w.store().get_user(f.staff.user_id).await.unwrap().unwrap();
  assert_eq!(user.full_name, "Ada Obi-Eze");

  assert_eq!(w.set_profile_photo(&f.staff, "one.png".into()).await.unwrap(), None);
  assert_eq!(
    w.set_profile_photo(&f.staff, "two.png".into()).await.unwrap().as_deref(),
    Some("one.png")
  );

  let empty = w.report(&f.hod, f.staff.user_id).await.unwrap();
  assert!(
    empty
      .blocks
      .contains(&Block::Line("No appraisal history available.".into()))
  );
}

#[tokio::test]
async fn record_stage_reports_failure_for_unknown_owner() {
  let f = fixture().await;
  let entry = HistoryEntry {
    stage:          Stage::HodReview,
    score:          None,
    comments:       String::new(),
    reviewed_by:    "Dr Hod".into(),
    reviewed_by_id: f.hod.user_id,
    date:           chrono::Utc::now(),
    appraisal_id:   None,
  };
  assert!(!f.workflow.record_stage(Uuid::new_v4(), entry.clone()).await);
  assert!(f.workflow.record_stage(f.staff.user_id, entry.clone()).await);
  assert!(f.workflow.record_stage(f.staff.user_id, entry).await);
  let history = f.workflow.history(&f.staff, f.staff.user_id).await.unwrap();
  assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn registration_rejects_duplicate_email() {
  let f = fixture().await;
  let registration = || Registration {
    full_name:    "New Person".into(),
    email:        "new@example.edu".into(),
    phone:        "0800".into(),
    role:         Role::Staff,
    faculty:      "Law".into(),
    department:   "Torts".into(),
    password:     "secret1".into(),
    staff_number: None,
    category:     Some(StaffCategory::Senior),
  };
  let user = f
    .workflow
    .register(registration(), "hash".into())
    .await
    .unwrap();
  assert_eq!(user.category, StaffCategory::Senior);
  assert!(matches!(
    f.workflow.register(registration(), "hash".into()).await,
    Err(Error::Validation(_))
  ));
}
