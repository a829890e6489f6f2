//! Per-user profile records carrying a history of review stage outcomes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::{Role, User};

/// A review stage that leaves a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  HodReview,
  CommitteeReview,
  FacultyReview,
}

impl Stage {
  pub fn label(self) -> &'static str {
    match self {
      Self::HodReview => "HOD Review",
      Self::CommitteeReview => "Committee Review",
      Self::FacultyReview => "Faculty Review",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub stage:          Stage,
  pub score:          Option<f64>,
  pub comments:       String,
  pub reviewed_by:    String,
  pub reviewed_by_id: Uuid,
  pub date:           DateTime<Utc>,
  pub appraisal_id:   Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
  pub user_id:           Uuid,
  pub full_name:         String,
  pub phone:             String,
  pub email:             String,
  pub role:              Role,
  pub profile_photo:     Option<String>,
  pub appraisal_history: Vec<HistoryEntry>,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}

impl Profile {
  /// A fresh, history-less profile seeded from `user`.
  pub fn from_user(user: &User) -> Self {
    let now = Utc::now();
    Self {
      user_id:           user.user_id,
      full_name:         user.full_name.clone(),
      phone:             user.phone.clone(),
      email:             user.email.clone(),
      role:              user.role,
      profile_photo:     None,
      appraisal_history: Vec::new(),
      created_at:        now,
      updated_at:        now,
    }
  }

  /// Upsert `entry`: an existing entry with the same stage and appraisal id
  /// is replaced in place, otherwise `entry` is appended.
  pub fn record(&mut self, entry: HistoryEntry) {
    let existing = self
      .appraisal_history
      .iter_mut()
      .find(|e| e.stage == entry.stage && e.appraisal_id == entry.appraisal_id);
    match existing {
      Some(slot) => *slot = entry,
      None => self.appraisal_history.push(entry),
    }
    self.updated_at = Utc::now();
  }
}
