//! Personality-traits evaluations filed by an HOD against a staff member's
//! most recent appraisal.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
  Error, Result,
  appraisal::Appraisal,
  parse_ref,
  scoring::{Rounding, ScoreSummary, coerce_rating, score},
  user::{Actor, StaffCategory},
};

/// One trait as submitted: a rating and an optional remark.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TraitInput {
  #[serde(default)]
  pub rating:  Value,
  #[serde(default)]
  pub comment: Option<String>,
}

/// The raw HOD form. Every field is optional here so that missing ones turn
/// into validation errors rather than deserialization failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitsForm {
  pub staff_id:         Option<String>,
  pub staff_type:       Option<String>,
  pub overall_comments: Option<String>,
  #[serde(default)]
  pub traits:           BTreeMap<String, TraitInput>,
}

/// A validated [`TraitsForm`].
#[derive(Debug, Clone, PartialEq)]
pub struct TraitScores {
  pub staff_id:         Uuid,
  pub staff_type:       StaffCategory,
  pub overall_comments: String,
  pub ratings:          BTreeMap<String, u8>,
  pub comments:         BTreeMap<String, String>,
}

impl TraitsForm {
  pub fn validate(&self) -> Result<TraitScores> {
    let non_blank = |v: &Option<String>| {
      v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned)
    };
    let (Some(staff_id), Some(staff_type), Some(overall_comments)) = (
      non_blank(&self.staff_id),
      non_blank(&self.staff_type),
      non_blank(&self.overall_comments),
    ) else {
      return Err(Error::validation(
        "staffId, staffType and overallComments are required",
      ));
    };
    if self.traits.is_empty() {
      return Err(Error::validation(
        "at least one personality trait rating is required",
      ));
    }

    let staff_type = StaffCategory::parse(&staff_type).ok_or_else(|| {
      Error::validation(format!("staffType must be junior or senior, got {staff_type:?}"))
    })?;

    let mut ratings = BTreeMap::new();
    let mut comments = BTreeMap::new();
    for (key, input) in &self.traits {
      ratings.insert(key.clone(), coerce_rating(key, &input.rating)?);
      comments.insert(key.clone(), input.comment.clone().unwrap_or_default());
    }

    Ok(TraitScores {
      staff_id: parse_ref(&staff_id)?,
      staff_type,
      overall_comments,
      ratings,
      comments,
    })
  }
}

/// An immutable evaluation record. The percentage is kept unrounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityTraitsEvaluation {
  pub evaluation_id:    Uuid,
  pub staff_id:         Uuid,
  pub appraisal_id:     Uuid,
  pub staff_type:       StaffCategory,
  pub traits:           BTreeMap<String, u8>,
  pub comments:         BTreeMap<String, String>,
  pub overall_comments: String,
  pub summary:          ScoreSummary,
  pub evaluated_by:     String,
  pub evaluated_by_id:  Uuid,
  /// Department of the evaluating HOD.
  pub department:       String,
  pub created_at:       DateTime<Utc>,
}

impl PersonalityTraitsEvaluation {
  pub fn new(scores: TraitScores, appraisal: &Appraisal, hod: &Actor) -> Self {
    let summary = score(scores.ratings.values().copied(), Rounding::Exact);
    Self {
      evaluation_id: Uuid::new_v4(),
      staff_id: scores.staff_id,
      appraisal_id: appraisal.appraisal_id,
      staff_type: scores.staff_type,
      traits: scores.ratings,
      comments: scores.comments,
      overall_comments: scores.overall_comments,
      summary,
      evaluated_by: hod.display_name.clone(),
      evaluated_by_id: hod.user_id,
      department: hod.department.clone(),
      created_at: Utc::now(),
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn form(body: Value) -> TraitsForm { serde_json::from_value(body).unwrap() }

  #[test]
  fn validates_complete_form() {
    let id = Uuid::new_v4();
    let scores = form(json!({
      "staffId": id.to_string(),
      "staffType": "junior",
      "overallComments": "Reliable",
      "traits": {
        "punctuality": { "rating": "4", "comment": "rarely late" },
        "teamwork": { "rating": 5 },
        "initiative": {}
      }
    }))
    .validate()
    .unwrap();

    assert_eq!(scores.staff_id, id);
    assert_eq!(scores.ratings["punctuality"], 4);
    assert_eq!(scores.ratings["initiative"], 0);
    assert_eq!(scores.comments["punctuality"], "rarely late");
    assert_eq!(scores.comments["teamwork"], "");
  }

  #[test]
  fn missing_fields_are_validation_errors() {
    let err = form(json!({ "staffType": "junior", "overallComments": "x",
      "traits": { "a": { "rating": 1 } } }))
    .validate();
    assert!(matches!(err, Err(Error::Validation(_))));

    let err = form(json!({ "staffId": Uuid::new_v4().to_string(),
      "staffType": "junior", "overallComments": "x", "traits": {} }))
    .validate();
    assert!(matches!(err, Err(Error::Validation(_))));
  }

  #[test]
  fn malformed_staff_id_is_rejected() {
    let err = form(json!({ "staffId": "abc", "staffType": "senior",
      "overallComments": "x", "traits": { "a": { "rating": 1 } } }))
    .validate();
    assert!(matches!(err, Err(Error::MalformedReference(_))));
  }
}
