//! [`SqliteStore`]: the SQLite implementation of [`AppraisalStore`].

use std::path::Path;

use appraisal_core::{
  appraisal::Appraisal,
  profile::Profile,
  store::{AppraisalQuery, AppraisalStore},
  traits::PersonalityTraitsEvaluation,
  user::{NewUser, User},
};
use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    APPRAISAL_COLUMNS, RawAppraisal, RawUser, USER_COLUMNS, decode_json, encode_dt,
    encode_json, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An appraisal store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "appraisal store opened");
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Write every column of `raw` into the `appraisals` table. With `replace`
  /// unset this is a plain insert; otherwise the existing row is overwritten
  /// and the number of affected rows is returned.
  async fn write_appraisal(&self, raw: RawAppraisal, replace: bool) -> Result<usize> {
    let changed = self
      .conn
      .call(move |conn| {
        let sql = if replace {
          "UPDATE appraisals SET
             staff_id = ?2, staff_name = ?3, faculty = ?4, department = ?5,
             staff_category = ?6, status = ?7, submitted_at = ?8, data_json = ?9,
             documents_json = ?10, hod_evaluation_json = ?11, staff_review_json = ?12,
             committee_review_json = ?13, faculty_review_json = ?14,
             traits_evaluation_id = ?15
           WHERE appraisal_id = ?1"
        } else {
          "INSERT INTO appraisals (
             appraisal_id, staff_id, staff_name, faculty, department,
             staff_category, status, submitted_at, data_json,
             documents_json, hod_evaluation_json, staff_review_json,
             committee_review_json, faculty_review_json, traits_evaluation_id
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        };
        let n = conn.execute(sql, rusqlite::params![
          raw.appraisal_id,
          raw.staff_id,
          raw.staff_name,
          raw.faculty,
          raw.department,
          raw.staff_category,
          raw.status,
          raw.submitted_at,
          raw.data_json,
          raw.documents_json,
          raw.hod_evaluation_json,
          raw.staff_review_json,
          raw.committee_review_json,
          raw.faculty_review_json,
          raw.traits_evaluation_id,
        ])?;
        Ok(n)
      })
      .await?;
    Ok(changed)
  }
}

// ─── AppraisalStore impl ─────────────────────────────────────────────────────

impl AppraisalStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:       Uuid::new_v4(),
      full_name:     input.full_name,
      email:         input.email,
      phone:         input.phone,
      role:          input.role,
      staff_number:  input.staff_number,
      faculty:       input.faculty,
      department:    input.department,
      category:      input.category,
      password_hash: input.password_hash,
      created_at:    Utc::now(),
    };

    let raw = RawUser::from_user(&user);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO users ({USER_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
          ),
          rusqlite::params![
            raw.user_id,
            raw.full_name,
            raw.email,
            raw.phone,
            raw.role,
            raw.staff_number,
            raw.faculty,
            raw.department,
            raw.category,
            raw.password_hash,
            raw.created_at,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    let email = email.trim().to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
              rusqlite::params![email],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn update_user(&self, user: User) -> Result<()> {
    let id = user.user_id;
    let raw = RawUser::from_user(&user);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET
             full_name = ?2, email = ?3, phone = ?4, role = ?5, staff_number = ?6,
             faculty = ?7, department = ?8, category = ?9, password_hash = ?10
           WHERE user_id = ?1",
          rusqlite::params![
            raw.user_id,
            raw.full_name,
            raw.email,
            raw.phone,
            raw.role,
            raw.staff_number,
            raw.faculty,
            raw.department,
            raw.category,
            raw.password_hash,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::Missing { table: "users", id });
    }
    Ok(())
  }

  // ── Appraisals ────────────────────────────────────────────────────────────

  async fn insert_appraisal(&self, appraisal: Appraisal) -> Result<()> {
    self
      .write_appraisal(RawAppraisal::from_appraisal(&appraisal)?, false)
      .await?;
    Ok(())
  }

  async fn get_appraisal(&self, id: Uuid) -> Result<Option<Appraisal>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAppraisal> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {APPRAISAL_COLUMNS} FROM appraisals WHERE appraisal_id = ?1"),
              rusqlite::params![id_str],
              RawAppraisal::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAppraisal::into_appraisal).transpose()
  }

  async fn update_appraisal(&self, appraisal: Appraisal) -> Result<()> {
    let id = appraisal.appraisal_id;
    let changed = self
      .write_appraisal(RawAppraisal::from_appraisal(&appraisal)?, true)
      .await?;
    if changed == 0 {
      return Err(Error::Missing { table: "appraisals", id });
    }
    Ok(())
  }

  async fn delete_appraisal(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM appraisals WHERE appraisal_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn list_appraisals(&self, query: &AppraisalQuery) -> Result<Vec<Appraisal>> {
    // Conditions and their positional parameters are built in lockstep.
    let mut conds: Vec<String> = vec![];
    let mut params: Vec<String> = vec![];
    if let Some(staff_id) = query.staff_id {
      params.push(encode_uuid(staff_id));
      conds.push(format!("staff_id = ?{}", params.len()));
    }
    if let Some(faculty) = &query.faculty {
      params.push(faculty.clone());
      conds.push(format!("faculty = ?{}", params.len()));
    }
    if let Some(department) = &query.department {
      params.push(department.clone());
      conds.push(format!("department = ?{}", params.len()));
    }
    if !query.statuses.is_empty() {
      let placeholders: Vec<String> = query
        .statuses
        .iter()
        .map(|status| {
          params.push(status.as_str().to_owned());
          format!("?{}", params.len())
        })
        .collect();
      conds.push(format!("status IN ({})", placeholders.join(", ")));
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };
    let sql = format!(
      "SELECT {APPRAISAL_COLUMNS} FROM appraisals
       {where_clause}
       ORDER BY submitted_at DESC, rowid DESC"
    );

    let raws: Vec<RawAppraisal> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawAppraisal::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAppraisal::into_appraisal).collect()
  }

  async fn latest_appraisal_for(&self, staff_id: Uuid) -> Result<Option<Appraisal>> {
    let id_str = encode_uuid(staff_id);

    let raw: Option<RawAppraisal> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {APPRAISAL_COLUMNS} FROM appraisals
                 WHERE staff_id = ?1
                 ORDER BY submitted_at DESC, rowid DESC
                 LIMIT 1"
              ),
              rusqlite::params![id_str],
              RawAppraisal::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAppraisal::into_appraisal).transpose()
  }

  // ── Personality traits ────────────────────────────────────────────────────

  async fn insert_traits_evaluation(&self, evaluation: PersonalityTraitsEvaluation) -> Result<()> {
    let id_str = encode_uuid(evaluation.evaluation_id);
    let staff_str = encode_uuid(evaluation.staff_id);
    let appraisal_str = encode_uuid(evaluation.appraisal_id);
    let at_str = encode_dt(evaluation.created_at);
    let body = encode_json(&evaluation)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO traits_evaluations
             (evaluation_id, staff_id, appraisal_id, created_at, body_json)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, staff_str, appraisal_str, at_str, body],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_traits_evaluation(&self, id: Uuid) -> Result<Option<PersonalityTraitsEvaluation>> {
    let id_str = encode_uuid(id);

    let body: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT body_json FROM traits_evaluations WHERE evaluation_id = ?1",
              rusqlite::params![id_str],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    body.as_deref().map(decode_json).transpose()
  }

  async fn list_traits_evaluations(
    &self,
    staff_id: Option<Uuid>,
  ) -> Result<Vec<PersonalityTraitsEvaluation>> {
    let staff_str = staff_id.map(encode_uuid);

    let bodies: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT body_json FROM traits_evaluations
           WHERE ?1 IS NULL OR staff_id = ?1
           ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![staff_str], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    bodies.iter().map(|b| decode_json(b)).collect()
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
    let id_str = encode_uuid(user_id);

    let body: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT body_json FROM profiles WHERE user_id = ?1",
              rusqlite::params![id_str],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    body.as_deref().map(decode_json).transpose()
  }

  async fn save_profile(&self, profile: Profile) -> Result<()> {
    let id_str = encode_uuid(profile.user_id);
    let at_str = encode_dt(profile.updated_at);
    let body = encode_json(&profile)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (user_id, updated_at, body_json) VALUES (?1, ?2, ?3)
           ON CONFLICT(user_id) DO UPDATE SET
             updated_at = excluded.updated_at,
             body_json  = excluded.body_json",
          rusqlite::params![id_str, at_str, body],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
