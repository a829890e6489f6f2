//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 UTC strings with a fixed nine fractional digits so
//! that text ordering matches time ordering. Enumerations use their wire
//! names. Nested payloads are compact JSON. UUIDs are hyphenated lowercase.

use appraisal_core::{
  appraisal::Appraisal,
  status::AppraisalStatus,
  user::{Role, StaffCategory, User},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_role(s: &str) -> Result<Role> {
  Role::parse(s).ok_or_else(|| Error::UnknownValue {
    column: "role",
    value:  s.to_owned(),
  })
}

pub fn decode_category(s: &str) -> Result<StaffCategory> {
  StaffCategory::parse(s).ok_or_else(|| Error::UnknownValue {
    column: "category",
    value:  s.to_owned(),
  })
}

pub fn decode_status(s: &str) -> Result<AppraisalStatus> {
  AppraisalStatus::parse(s).ok_or_else(|| Error::UnknownValue {
    column: "status",
    value:  s.to_owned(),
  })
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_json<T: Serialize>(value: &T) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn encode_opt_json<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
  value.map(encode_json).transpose()
}

pub fn decode_json<T: DeserializeOwned>(s: &str) -> Result<T> {
  Ok(serde_json::from_str(s)?)
}

pub fn decode_opt_json<T: DeserializeOwned>(s: Option<&str>) -> Result<Option<T>> {
  s.map(decode_json).transpose()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings of a `users` row, in [`USER_COLUMNS`] order.
pub struct RawUser {
  pub user_id:       String,
  pub full_name:     String,
  pub email:         String,
  pub phone:         String,
  pub role:          String,
  pub staff_number:  Option<String>,
  pub faculty:       String,
  pub department:    String,
  pub category:      String,
  pub password_hash: String,
  pub created_at:    String,
}

pub const USER_COLUMNS: &str = "user_id, full_name, email, phone, role, staff_number, \
                                faculty, department, category, password_hash, created_at";

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      full_name:     row.get(1)?,
      email:         row.get(2)?,
      phone:         row.get(3)?,
      role:          row.get(4)?,
      staff_number:  row.get(5)?,
      faculty:       row.get(6)?,
      department:    row.get(7)?,
      category:      row.get(8)?,
      password_hash: row.get(9)?,
      created_at:    row.get(10)?,
    })
  }

  pub fn from_user(user: &User) -> Self {
    Self {
      user_id:       encode_uuid(user.user_id),
      full_name:     user.full_name.clone(),
      email:         user.email.clone(),
      phone:         user.phone.clone(),
      role:          user.role.as_str().to_owned(),
      staff_number:  user.staff_number.clone(),
      faculty:       user.faculty.clone(),
      department:    user.department.clone(),
      category:      user.category.as_str().to_owned(),
      password_hash: user.password_hash.clone(),
      created_at:    encode_dt(user.created_at),
    }
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      full_name:     self.full_name,
      email:         self.email,
      phone:         self.phone,
      role:          decode_role(&self.role)?,
      staff_number:  self.staff_number,
      faculty:       self.faculty,
      department:    self.department,
      category:      decode_category(&self.category)?,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings of an `appraisals` row, in [`APPRAISAL_COLUMNS`] order.
pub struct RawAppraisal {
  pub appraisal_id:          String,
  pub staff_id:              String,
  pub staff_name:            String,
  pub faculty:               String,
  pub department:            String,
  pub staff_category:        String,
  pub status:                String,
  pub submitted_at:          String,
  pub data_json:             String,
  pub documents_json:        String,
  pub hod_evaluation_json:   Option<String>,
  pub staff_review_json:     Option<String>,
  pub committee_review_json: Option<String>,
  pub faculty_review_json:   Option<String>,
  pub traits_evaluation_id:  Option<String>,
}

pub const APPRAISAL_COLUMNS: &str = "appraisal_id, staff_id, staff_name, faculty, department, \
                                     staff_category, status, submitted_at, data_json, \
                                     documents_json, hod_evaluation_json, staff_review_json, \
                                     committee_review_json, faculty_review_json, \
                                     traits_evaluation_id";

impl RawAppraisal {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      appraisal_id:          row.get(0)?,
      staff_id:              row.get(1)?,
      staff_name:            row.get(2)?,
      faculty:               row.get(3)?,
      department:            row.get(4)?,
      staff_category:        row.get(5)?,
      status:                row.get(6)?,
      submitted_at:          row.get(7)?,
      data_json:             row.get(8)?,
      documents_json:        row.get(9)?,
      hod_evaluation_json:   row.get(10)?,
      staff_review_json:     row.get(11)?,
      committee_review_json: row.get(12)?,
      faculty_review_json:   row.get(13)?,
      traits_evaluation_id:  row.get(14)?,
    })
  }

  pub fn from_appraisal(a: &Appraisal) -> Result<Self> {
    Ok(Self {
      appraisal_id:          encode_uuid(a.appraisal_id),
      staff_id:              encode_uuid(a.staff_id),
      staff_name:            a.staff_name.clone(),
      faculty:               a.faculty.clone(),
      department:            a.department.clone(),
      staff_category:        a.staff_category.as_str().to_owned(),
      status:                a.status.as_str().to_owned(),
      submitted_at:          encode_dt(a.submitted_at),
      data_json:             encode_json(&a.data)?,
      documents_json:        encode_json(&a.supporting_documents)?,
      hod_evaluation_json:   encode_opt_json(a.hod_evaluation.as_ref())?,
      staff_review_json:     encode_opt_json(a.staff_review.as_ref())?,
      committee_review_json: encode_opt_json(a.committee_review.as_ref())?,
      faculty_review_json:   encode_opt_json(a.faculty_review.as_ref())?,
      traits_evaluation_id:  a.personality_traits_evaluation.map(encode_uuid),
    })
  }

  pub fn into_appraisal(self) -> Result<Appraisal> {
    Ok(Appraisal {
      appraisal_id:                  decode_uuid(&self.appraisal_id)?,
      staff_id:                      decode_uuid(&self.staff_id)?,
      staff_name:                    self.staff_name,
      faculty:                       self.faculty,
      department:                    self.department,
      staff_category:                decode_category(&self.staff_category)?,
      data:                          decode_json(&self.data_json)?,
      supporting_documents:          decode_json(&self.documents_json)?,
      status:                        decode_status(&self.status)?,
      submitted_at:                  decode_dt(&self.submitted_at)?,
      hod_evaluation:                decode_opt_json(self.hod_evaluation_json.as_deref())?,
      staff_review:                  decode_opt_json(self.staff_review_json.as_deref())?,
      committee_review:              decode_opt_json(self.committee_review_json.as_deref())?,
      faculty_review:                decode_opt_json(self.faculty_review_json.as_deref())?,
      personality_traits_evaluation: self
        .traits_evaluation_id
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
    })
  }
}
