//! The document a staff member submits and the stage payloads reviewers
//! stamp onto it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
  Error, Result,
  normalize::{RowGroup, Submission, rows},
  scoring::ScoreSummary,
  status::AppraisalStatus,
  user::{StaffCategory, User},
};

// ─── Payload sections ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
  pub employee_name:      Option<String>,
  pub date_of_birth:      Option<String>,
  pub place_of_birth:     Option<String>,
  pub marital_status:     Option<String>,
  pub number_of_children: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentDetails {
  pub first_appointment: Option<String>,
  pub confirmation_date: Option<String>,
  pub present_status:    Option<String>,
  pub contiss_level:     Option<String>,
  pub appointment_type:  Option<String>,
  pub current_grade:     Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicQualification {
  pub institution:   String,
  pub from_year:     String,
  pub to_year:       String,
  pub qualification: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalBody {
  pub professional_body_name: String,
  pub membership_date:        String,
  pub membership_number:      String,
  pub membership_status:      String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
  pub service_department:  String,
  pub service_from:        String,
  pub service_to:          String,
  pub service_post:        String,
  pub supervising_officer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingRecord {
  pub training_date:        String,
  pub course_title:         String,
  pub training_institution: String,
  pub training_duration:    String,
  pub training_award:       String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescription {
  pub job_description:     Option<String>,
  pub difficulties:        Option<String>,
  pub additional_info:     Option<String>,
  pub major_contributions: Option<String>,
  pub publications:        Option<String>,
}

/// Move cells out of a row in order. Rows always carry `FIELDS.len()` cells.
fn take(cells: &mut std::vec::IntoIter<String>) -> String {
  cells.next().unwrap_or_default()
}

impl RowGroup for AcademicQualification {
  const FIELDS: &'static [&'static str] =
    &["institution", "fromYear", "toYear", "qualification"];

  fn from_cells(cells: Vec<String>) -> Self {
    let mut c = cells.into_iter();
    Self {
      institution:   take(&mut c),
      from_year:     take(&mut c),
      to_year:       take(&mut c),
      qualification: take(&mut c),
    }
  }
}

impl RowGroup for ProfessionalBody {
  const FIELDS: &'static [&'static str] = &[
    "professionalBodyName",
    "membershipDate",
    "membershipNumber",
    "membershipStatus",
  ];

  fn from_cells(cells: Vec<String>) -> Self {
    let mut c = cells.into_iter();
    Self {
      professional_body_name: take(&mut c),
      membership_date:        take(&mut c),
      membership_number:      take(&mut c),
      membership_status:      take(&mut c),
    }
  }
}

impl RowGroup for ServiceRecord {
  const FIELDS: &'static [&'static str] = &[
    "serviceDepartment",
    "serviceFrom",
    "serviceTo",
    "servicePost",
    "supervisingOfficer",
  ];

  fn from_cells(cells: Vec<String>) -> Self {
    let mut c = cells.into_iter();
    Self {
      service_department:  take(&mut c),
      service_from:        take(&mut c),
      service_to:          take(&mut c),
      service_post:        take(&mut c),
      supervising_officer: take(&mut c),
    }
  }
}

impl RowGroup for TrainingRecord {
  const FIELDS: &'static [&'static str] = &[
    "trainingDate",
    "courseTitle",
    "trainingInstitution",
    "trainingDuration",
    "trainingAward",
  ];

  fn from_cells(cells: Vec<String>) -> Self {
    let mut c = cells.into_iter();
    Self {
      training_date:        take(&mut c),
      course_title:         take(&mut c),
      training_institution: take(&mut c),
      training_duration:    take(&mut c),
      training_award:       take(&mut c),
    }
  }
}

/// The structured body of an appraisal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppraisalData {
  pub personal_info:           PersonalInfo,
  pub employment_details:      EmploymentDetails,
  pub academic_qualifications: Vec<AcademicQualification>,
  pub professional_bodies:     Vec<ProfessionalBody>,
  pub service_records:         Vec<ServiceRecord>,
  pub training_records:        Vec<TrainingRecord>,
  pub job_description:         JobDescription,
}

impl AppraisalData {
  /// Build the typed payload out of a raw form submission.
  pub fn from_submission(s: &Submission) -> Self {
    Self {
      personal_info:           PersonalInfo {
        employee_name:      s.scalar("employeeName"),
        date_of_birth:      s.scalar("dateOfBirth"),
        place_of_birth:     s.scalar("placeOfBirth"),
        marital_status:     s.scalar("maritalStatus"),
        number_of_children: s.scalar("numberOfChildren"),
      },
      employment_details:      EmploymentDetails {
        first_appointment: s.scalar("firstAppointment"),
        confirmation_date: s.scalar("confirmationDate"),
        present_status:    s.scalar("presentStatus"),
        contiss_level:     s.scalar("contissLevel"),
        appointment_type:  s.scalar("appointmentType"),
        current_grade:     s.scalar("currentGrade"),
      },
      academic_qualifications: rows(s),
      professional_bodies:     rows(s),
      service_records:         rows(s),
      training_records:        rows(s),
      job_description:         JobDescription {
        job_description:     s.scalar("jobDescription"),
        difficulties:        s.scalar("difficulties"),
        additional_info:     s.scalar("additionalInfo"),
        major_contributions: s.scalar("majorContributions"),
        publications:        s.scalar("publications"),
      },
    }
  }

  /// The qualification with the greatest numeric `toYear`. Unparsable years
  /// count as 0 and the first row wins a tie.
  pub fn latest_qualification(&self) -> Option<&AcademicQualification> {
    let year = |q: &AcademicQualification| q.to_year.trim().parse::<i32>().unwrap_or(0);
    self
      .academic_qualifications
      .iter()
      .fold(None, |best: Option<&AcademicQualification>, q| match best {
        Some(b) if year(b) >= year(q) => Some(b),
        _ => Some(q),
      })
  }
}

/// Read the required `staffCategory` field of a submission.
pub fn staff_category(s: &Submission) -> Result<StaffCategory> {
  let raw = s
    .scalar("staffCategory")
    .ok_or_else(|| Error::validation("staffCategory is required"))?;
  StaffCategory::parse(&raw).ok_or_else(|| {
    Error::validation(format!("staffCategory must be junior or senior, got {raw:?}"))
  })
}

// ─── Stage payloads ──────────────────────────────────────────────────────────

/// Stamped by the HOD. `ratings` holds the `item_*` fields; every other
/// submitted field is kept verbatim in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HodEvaluation {
  pub ratings:         BTreeMap<String, u8>,
  pub fields:          BTreeMap<String, Value>,
  pub summary:         ScoreSummary,
  pub evaluated_by:    String,
  pub evaluated_by_id: Uuid,
  pub evaluated_at:    DateTime<Utc>,
}

/// The owner's response to an HOD evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffDecision {
  Accepted,
  Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffReview {
  pub action:         StaffDecision,
  pub comments:       Option<String>,
  pub reviewed_by_id: Uuid,
  pub reviewed_at:    DateTime<Utc>,
}

/// A committee or faculty panel review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelReview {
  pub recommendation: String,
  pub comments:       Option<String>,
  pub score:          Option<f64>,
  pub fields:         BTreeMap<String, Value>,
  pub reviewed_by:    String,
  pub reviewed_by_id: Uuid,
  pub reviewed_at:    DateTime<Utc>,
}

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appraisal {
  pub appraisal_id:                  Uuid,
  pub staff_id:                      Uuid,
  pub staff_name:                    String,
  pub faculty:                       String,
  pub department:                    String,
  pub staff_category:                StaffCategory,
  pub data:                          AppraisalData,
  /// Opaque file references, fixed at creation.
  pub supporting_documents:          Vec<String>,
  pub status:                        AppraisalStatus,
  pub submitted_at:                  DateTime<Utc>,
  pub hod_evaluation:                Option<HodEvaluation>,
  pub staff_review:                  Option<StaffReview>,
  pub committee_review:              Option<PanelReview>,
  pub faculty_review:                Option<PanelReview>,
  pub personality_traits_evaluation: Option<Uuid>,
}

impl Appraisal {
  /// A fresh `submitted_by_staff` record owned by `owner`. Faculty and
  /// department are copied from the owner.
  pub fn new(
    owner: &User,
    staff_category: StaffCategory,
    data: AppraisalData,
    supporting_documents: Vec<String>,
  ) -> Self {
    Self {
      appraisal_id: Uuid::new_v4(),
      staff_id: owner.user_id,
      staff_name: owner.full_name.clone(),
      faculty: owner.faculty.clone(),
      department: owner.department.clone(),
      staff_category,
      data,
      supporting_documents,
      status: AppraisalStatus::SubmittedByStaff,
      submitted_at: Utc::now(),
      hod_evaluation: None,
      staff_review: None,
      committee_review: None,
      faculty_review: None,
      personality_traits_evaluation: None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn form() -> Submission {
    Submission::new()
      .with("employeeName", "Ada Obi")
      .with("currentGrade", " 08 ")
      .with("institution[]", vec!["A", "B", "C"])
      .with("fromYear[]", vec!["2001", "2005", "2010"])
      .with("toYear[]", vec!["2004", "2012", "2009"])
      .with("qualification[]", vec!["BSc", "MSc", "PhD"])
      .with("courseTitle[]", vec!["", "Leadership"])
      .with("trainingAward[]", vec!["", "Cert"])
      .with("jobDescription", "Teaching")
      .with("staffCategory", "Senior")
  }

  #[test]
  fn builds_typed_payload() {
    let data = AppraisalData::from_submission(&form());
    assert_eq!(data.personal_info.employee_name.as_deref(), Some("Ada Obi"));
    assert_eq!(data.employment_details.current_grade.as_deref(), Some("08"));
    assert_eq!(data.academic_qualifications.len(), 3);
    assert_eq!(data.academic_qualifications[2].qualification, "PhD");
    assert_eq!(data.training_records.len(), 1);
    assert_eq!(data.training_records[0].course_title, "Leadership");
    assert!(data.professional_bodies.is_empty());
    assert_eq!(data.job_description.job_description.as_deref(), Some("Teaching"));
  }

  #[test]
  fn latest_qualification_uses_greatest_to_year() {
    let data = AppraisalData::from_submission(&form());
    assert_eq!(data.latest_qualification().map(|q| q.qualification.as_str()), Some("MSc"));
    assert_eq!(AppraisalData::default().latest_qualification(), None);
  }

  #[test]
  fn latest_qualification_ties_keep_first() {
    let s = Submission::new()
      .with("institution[]", vec!["A", "B"])
      .with("toYear[]", vec!["unknown", "0"]);
    let data = AppraisalData::from_submission(&s);
    assert_eq!(data.latest_qualification().map(|q| q.institution.as_str()), Some("A"));
  }

  #[test]
  fn staff_category_is_required() {
    assert_eq!(staff_category(&form()).unwrap(), StaffCategory::Senior);
    assert!(matches!(staff_category(&Submission::new()), Err(Error::Validation(_))));
    let bad = Submission::new().with("staffCategory", "intern");
    assert!(matches!(staff_category(&bad), Err(Error::Validation(_))));
  }

  #[test]
  fn payload_serializes_with_form_field_names() {
    let data = AppraisalData::from_submission(&form());
    let json = serde_json::to_value(&data).unwrap();
    assert_eq!(json["personalInfo"]["employeeName"], "Ada Obi");
    assert_eq!(json["academicQualifications"][0]["fromYear"], "2001");
  }
}
