//! Users, roles, and the verified [`Actor`] that drives every operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Faculties a user may belong to.
pub const FACULTIES: &[&str] = &[
  "Science",
  "Social Science",
  "Art",
  "Engineering",
  "Education",
  "Law",
  "Medicine",
  "Business",
  "Agriculture",
  "Environmental Studies",
  "Pharmacy",
];

const MIN_PASSWORD_LEN: usize = 6;

// ─── Roles ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Staff,
  Hod,
  Committee,
  Faculty,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Staff => "staff",
      Self::Hod => "hod",
      Self::Committee => "committee",
      Self::Faculty => "faculty",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "staff" => Some(Self::Staff),
      "hod" => Some(Self::Hod),
      "committee" => Some(Self::Committee),
      "faculty" => Some(Self::Faculty),
      _ => None,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::Staff => "Staff",
      Self::Hod => "HOD",
      Self::Committee => "Committee",
      Self::Faculty => "Faculty",
    }
  }

  /// Roles that review other people's appraisals.
  pub fn is_reviewer(self) -> bool { !matches!(self, Self::Staff) }
}

/// Junior or senior staff; selects the personality-trait rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffCategory {
  #[default]
  Junior,
  Senior,
}

impl StaffCategory {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Junior => "junior",
      Self::Senior => "senior",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "junior" => Some(Self::Junior),
      "senior" => Some(Self::Senior),
      _ => None,
    }
  }
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A registered account. `password_hash` is an argon2 PHC string and is never
/// serialised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:       Uuid,
  pub full_name:     String,
  pub email:         String,
  pub phone:         String,
  pub role:          Role,
  /// Institutional staff number; required for reviewer roles.
  pub staff_number:  Option<String>,
  pub faculty:       String,
  pub department:    String,
  pub category:      StaffCategory,
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::AppraisalStore::add_user`]. The store assigns the
/// id and creation time.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub full_name:     String,
  pub email:         String,
  pub phone:         String,
  pub role:          Role,
  pub staff_number:  Option<String>,
  pub faculty:       String,
  pub department:    String,
  pub category:      StaffCategory,
  pub password_hash: String,
}

/// Registration form as submitted by a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
  pub full_name:    String,
  pub email:        String,
  pub phone:        String,
  pub role:         Role,
  pub faculty:      String,
  pub department:   String,
  pub password:     String,
  #[serde(rename = "staffId")]
  pub staff_number: Option<String>,
  pub category:     Option<StaffCategory>,
}

impl Registration {
  /// Check the form before any password hashing or storage happens.
  pub fn validate(&self) -> Result<()> {
    for (name, value) in [
      ("fullName", &self.full_name),
      ("phone", &self.phone),
      ("department", &self.department),
    ] {
      if value.trim().is_empty() {
        return Err(Error::validation(format!("{name} is required")));
      }
    }
    if !is_email_shaped(&self.email) {
      return Err(Error::validation("a valid email address is required"));
    }
    if !FACULTIES.contains(&self.faculty.as_str()) {
      return Err(Error::validation(format!("unknown faculty {:?}", self.faculty)));
    }
    if self.password.chars().count() < MIN_PASSWORD_LEN {
      return Err(Error::validation(format!(
        "password must be at least {MIN_PASSWORD_LEN} characters"
      )));
    }
    let has_staff_number = self
      .staff_number
      .as_deref()
      .is_some_and(|s| !s.trim().is_empty());
    if self.role.is_reviewer() && !has_staff_number {
      return Err(Error::validation(
        "staffId is required for HOD, committee and faculty roles",
      ));
    }
    Ok(())
  }

  pub fn into_new_user(self, password_hash: String) -> NewUser {
    NewUser {
      full_name: self.full_name.trim().to_owned(),
      email: self.email.trim().to_owned(),
      phone: self.phone.trim().to_owned(),
      role: self.role,
      staff_number: self
        .staff_number
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty()),
      faculty: self.faculty,
      department: self.department.trim().to_owned(),
      category: self.category.unwrap_or_default(),
      password_hash,
    }
  }
}

/// `local@domain.tld` with no whitespace anywhere.
fn is_email_shaped(email: &str) -> bool {
  if email.is_empty() || email.chars().any(char::is_whitespace) {
    return false;
  }
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  let Some((host, tld)) = domain.rsplit_once('.') else {
    return false;
  };
  !local.is_empty() && !host.is_empty() && !tld.is_empty()
}

// ─── Actor ───────────────────────────────────────────────────────────────────

/// A verified identity. Produced by the authentication layer and trusted
/// unconditionally by the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
  pub user_id:      Uuid,
  pub role:         Role,
  pub department:   String,
  pub faculty:      String,
  pub display_name: String,
}

impl Actor {
  /// Fail with [`Error::Forbidden`] unless the actor holds one of `roles`.
  pub fn require_role(&self, roles: &[Role]) -> Result<()> {
    if roles.contains(&self.role) {
      Ok(())
    } else {
      Err(Error::Forbidden(format!(
        "role {} may not perform this operation",
        self.role.as_str()
      )))
    }
  }

  /// Whether this actor may read `user_id`'s profile, history and report.
  pub fn can_view_profile_of(&self, user_id: Uuid) -> bool {
    self.user_id == user_id || self.role.is_reviewer()
  }
}

impl From<&User> for Actor {
  fn from(user: &User) -> Self {
    Self {
      user_id:      user.user_id,
      role:         user.role,
      department:   user.department.clone(),
      faculty:      user.faculty.clone(),
      display_name: user.full_name.clone(),
    }
  }
}
