//! Appraisal status and the legal transitions between statuses.
//!
//! ```text
//!  submitted_by_staff ──hod_evaluate──▶ evaluated_by_hod ──staff_accept──▶ pending_committee_review
//!          ▲                                 │                                   │
//!          │                           staff_reject                        committee_review
//!  rejected_by_staff ◀───────────────────────┘                                   ▼
//!          └──────────hod_evaluate──────▶ (evaluated_by_hod)            pending_faculty_panel
//!                                                                                │
//!                                                                         faculty_review
//!                                                                                ▼
//!                                                                       reviewed_by_faculty
//! ```
//!
//! `accepted_by_staff` and `reviewed_by_committee` are never entered by a
//! transition here but are still valid stored values; `accepted_by_staff` is
//! accepted as a source for a committee review.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppraisalStatus {
  SubmittedByStaff,
  EvaluatedByHod,
  PendingCommitteeReview,
  AcceptedByStaff,
  RejectedByStaff,
  ReviewedByCommittee,
  PendingFacultyPanel,
  ReviewedByFaculty,
}

impl AppraisalStatus {
  pub const ALL: [Self; 8] = [
    Self::SubmittedByStaff,
    Self::EvaluatedByHod,
    Self::PendingCommitteeReview,
    Self::AcceptedByStaff,
    Self::RejectedByStaff,
    Self::ReviewedByCommittee,
    Self::PendingFacultyPanel,
    Self::ReviewedByFaculty,
  ];

  /// The machine-readable value stored and sent over the wire.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::SubmittedByStaff => "submitted_by_staff",
      Self::EvaluatedByHod => "evaluated_by_hod",
      Self::PendingCommitteeReview => "pending_committee_review",
      Self::AcceptedByStaff => "accepted_by_staff",
      Self::RejectedByStaff => "rejected_by_staff",
      Self::ReviewedByCommittee => "reviewed_by_committee",
      Self::PendingFacultyPanel => "pending_faculty_panel",
      Self::ReviewedByFaculty => "reviewed_by_faculty",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|status| status.as_str() == s)
  }

  /// Apply `action`, returning the resulting status or
  /// [`Error::IllegalTransition`] if `self` is not a source for it.
  pub fn apply(self, action: Action) -> Result<Self> {
    use AppraisalStatus::*;
    let next = match (action, self) {
      (Action::HodEvaluate, SubmittedByStaff | RejectedByStaff) => EvaluatedByHod,
      (Action::StaffAccept, EvaluatedByHod) => PendingCommitteeReview,
      (Action::StaffReject, EvaluatedByHod) => RejectedByStaff,
      (Action::CommitteeReview, PendingCommitteeReview | AcceptedByStaff) => {
        PendingFacultyPanel
      }
      (Action::FacultyReview, PendingFacultyPanel) => ReviewedByFaculty,
      _ => return Err(Error::IllegalTransition { from: self, action }),
    };
    Ok(next)
  }

  /// Whether a personality-traits submission must leave this status alone.
  ///
  /// Everything past `submitted_by_staff` is locked, so the side transition
  /// can only ever move a fresh submission forward.
  pub fn is_locked(self) -> bool {
    !matches!(self, Self::SubmittedByStaff)
  }

  /// Status after a personality-traits evaluation is attached.
  pub fn after_traits_evaluation(self) -> Self {
    if self.is_locked() { self } else { Self::PendingCommitteeReview }
  }
}

impl fmt::Display for AppraisalStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Actions ─────────────────────────────────────────────────────────────────

/// A step in the primary review flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
  HodEvaluate,
  StaffAccept,
  StaffReject,
  CommitteeReview,
  FacultyReview,
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::HodEvaluate => "evaluate",
      Self::StaffAccept => "accept",
      Self::StaffReject => "reject",
      Self::CommitteeReview => "committee-review",
      Self::FacultyReview => "faculty-review",
    })
  }
}

#[cfg(test)]
mod tests {
  use super::{Action::*, AppraisalStatus::*, *};

  const ACTIONS: [Action; 5] =
    [HodEvaluate, StaffAccept, StaffReject, CommitteeReview, FacultyReview];

  #[test]
  fn submitted_admits_only_hod_evaluation() {
    for action in ACTIONS {
      let result = SubmittedByStaff.apply(action);
      if action == HodEvaluate {
        assert_eq!(result.unwrap(), EvaluatedByHod);
      } else {
        assert!(
          matches!(result, Err(Error::IllegalTransition { from: SubmittedByStaff, .. })),
          "{action} should be illegal from submitted_by_staff"
        );
      }
    }
  }

  #[test]
  fn happy_path() {
    let s = SubmittedByStaff.apply(HodEvaluate).unwrap();
    let s = s.apply(StaffAccept).unwrap();
    assert_eq!(s, PendingCommitteeReview);
    let s = s.apply(CommitteeReview).unwrap();
    assert_eq!(s, PendingFacultyPanel);
    let s = s.apply(FacultyReview).unwrap();
    assert_eq!(s, ReviewedByFaculty);
  }

  #[test]
  fn rejection_reopens_hod_stage() {
    let s = EvaluatedByHod.apply(StaffReject).unwrap();
    assert_eq!(s, RejectedByStaff);
    assert_eq!(s.apply(HodEvaluate).unwrap(), EvaluatedByHod);
    assert!(s.apply(CommitteeReview).is_err());
  }

  #[test]
  fn legacy_accepted_status_feeds_committee() {
    assert_eq!(AcceptedByStaff.apply(CommitteeReview).unwrap(), PendingFacultyPanel);
  }

  #[test]
  fn reviewed_by_faculty_is_terminal() {
    for action in ACTIONS {
      assert!(ReviewedByFaculty.apply(action).is_err());
    }
  }

  #[test]
  fn traits_side_transition_never_regresses() {
    assert_eq!(SubmittedByStaff.after_traits_evaluation(), PendingCommitteeReview);
    for status in AppraisalStatus::ALL.into_iter().filter(|s| *s != SubmittedByStaff) {
      assert_eq!(status.after_traits_evaluation(), status);
    }
  }

  #[test]
  fn wire_names_round_trip() {
    for status in AppraisalStatus::ALL {
      assert_eq!(AppraisalStatus::parse(status.as_str()), Some(status));
      let json = serde_json::to_string(&status).unwrap();
      assert_eq!(json, format!("\"{}\"", status.as_str()));
    }
    assert_eq!(AppraisalStatus::parse("approved"), None);
  }
}
