//! Lays a profile's review history out as a paginated sequence of
//! [`Block`]s that a [`ReportRenderer`] turns into bytes.

use uuid::Uuid;

use crate::{appraisal::Appraisal, profile::Profile};

/// Vertical offset at the top of every page.
pub const TOP_MARGIN: u32 = 50;
/// A block placed once the offset has passed this starts a new page.
pub const PAGE_THRESHOLD: u32 = 700;

/// History table column titles.
pub const COLUMNS: [&str; 4] = ["Stage", "Score", "Reviewed By", "Date"];

const MAX_NAME_LEN: usize = 30;

// ─── Layout ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
  Title(String),
  Heading(String),
  Line(String),
  /// The [`COLUMNS`] header of a history table.
  TableHeader,
  /// Stage, score, reviewer, date.
  TableRow([String; 4]),
  /// Comments attached to the preceding row.
  Note(String),
  Rule,
  PageBreak,
}

impl Block {
  fn height(&self) -> u32 {
    match self {
      Self::Title(_) => 40,
      Self::Heading(_) => 25,
      Self::Line(_) => 15,
      Self::TableHeader => 25,
      Self::TableRow(_) => 30,
      Self::Note(_) => 25,
      Self::Rule => 10,
      Self::PageBreak => 0,
    }
  }
}

/// A compiled report, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
  pub user_id:   Uuid,
  pub full_name: String,
  pub blocks:    Vec<Block>,
}

impl Report {
  /// Number of pages the blocks span.
  pub fn page_count(&self) -> usize {
    1 + self.blocks.iter().filter(|b| **b == Block::PageBreak).count()
  }

  /// Download filename for this report with the given extension.
  pub fn filename(&self, extension: &str) -> String {
    report_filename(&self.full_name, self.user_id, extension)
  }
}

/// Appends blocks while tracking the running vertical offset.
struct Cursor {
  blocks: Vec<Block>,
  y:      u32,
}

impl Cursor {
  fn new() -> Self { Self { blocks: Vec::new(), y: TOP_MARGIN } }

  fn push(&mut self, block: Block) {
    if self.y > PAGE_THRESHOLD {
      self.blocks.push(Block::PageBreak);
      self.y = TOP_MARGIN;
    }
    self.y += block.height();
    self.blocks.push(block);
  }
}

// ─── Compiler ────────────────────────────────────────────────────────────────

/// Compile `profile`'s history. `appraisals` are the staff member's records,
/// used to label groups with their submission date.
pub fn compile(profile: &Profile, appraisals: &[Appraisal]) -> Report {
  let mut out = Cursor::new();

  out.push(Block::Title("Complete Appraisal Report".into()));
  out.push(Block::Heading("Personal Information".into()));
  out.push(Block::Line(format!("Full Name: {}", profile.full_name)));
  out.push(Block::Line(format!("Email: {}", profile.email)));
  out.push(Block::Line(format!("Phone: {}", profile.phone)));
  out.push(Block::Line(format!("Role: {}", profile.role.label())));
  out.push(Block::Rule);

  if profile.appraisal_history.is_empty() {
    out.push(Block::Line("No appraisal history available.".into()));
    return finish(profile, out);
  }

  out.push(Block::Heading("Appraisal History".into()));

  // Group by appraisal id, in order of first appearance.
  let mut groups: Vec<(Option<Uuid>, Vec<_>)> = Vec::new();
  for entry in &profile.appraisal_history {
    match groups.iter_mut().find(|(id, _)| *id == entry.appraisal_id) {
      Some((_, entries)) => entries.push(entry),
      None => groups.push((entry.appraisal_id, vec![entry])),
    }
  }

  for (appraisal_id, entries) in groups {
    let known = appraisal_id
      .and_then(|id| appraisals.iter().find(|a| a.appraisal_id == id));
    if let Some(appraisal) = known {
      out.push(Block::Heading(format!("Appraisal ID: {}", appraisal.appraisal_id)));
      out.push(Block::Line(format!(
        "Submitted: {}",
        appraisal.submitted_at.format("%Y-%m-%d")
      )));
      if let Some(q) = appraisal.data.latest_qualification() {
        out.push(Block::Line(format!(
          "Latest Qualification: {} ({}, {})",
          q.qualification, q.institution, q.to_year
        )));
      }
    }

    out.push(Block::TableHeader);
    for entry in entries {
      out.push(Block::TableRow([
        entry.stage.label().to_owned(),
        entry.score.map_or_else(|| "N/A".to_owned(), |s| s.to_string()),
        entry.reviewed_by.clone(),
        entry.date.format("%Y-%m-%d").to_string(),
      ]));
      if !entry.comments.is_empty() {
        out.push(Block::Note(format!("Comments: {}", entry.comments)));
      }
    }
    out.push(Block::Rule);
  }

  finish(profile, out)
}

fn finish(profile: &Profile, out: Cursor) -> Report {
  Report {
    user_id:   profile.user_id,
    full_name: profile.full_name.clone(),
    blocks:    out.blocks,
  }
}

// ─── Filename ────────────────────────────────────────────────────────────────

/// `appraisal-report-<name>-<id8>.<ext>`, restricted to `[A-Za-z0-9._-]`.
///
/// `<name>` is `full_name` with each run of non-alphanumerics collapsed to
/// `_`, trimmed of `_` and cut to 30 characters, or `user` if nothing is
/// left. If the result still contains anything unsafe the name is dropped
/// and twelve characters of the id are used instead.
pub fn report_filename(full_name: &str, user_id: Uuid, extension: &str) -> String {
  let mut name = String::with_capacity(full_name.len());
  for c in full_name.chars() {
    if c.is_ascii_alphanumeric() {
      name.push(c);
    } else if !name.ends_with('_') {
      name.push('_');
    }
  }
  let name: String = name.trim_matches('_').chars().take(MAX_NAME_LEN).collect();
  let name = if name.is_empty() { "user" } else { name.as_str() };

  let id = user_id.to_string();
  let candidate = format!("appraisal-report-{name}-{}.{extension}", &id[..8]);
  let safe = candidate
    .chars()
    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
  if safe {
    candidate
  } else {
    format!("appraisal-report-{}.{extension}", &id[..12])
  }
}

// ─── Rendering ───────────────────────────────────────────────────────────────

/// Turns a compiled [`Report`] into a downloadable document.
pub trait ReportRenderer: Send + Sync {
  /// MIME type of the rendered bytes.
  fn content_type(&self) -> &'static str;

  /// File extension without the leading dot.
  fn extension(&self) -> &'static str;

  fn render(&self, report: &Report) -> Vec<u8>;
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::{
    profile::{HistoryEntry, Stage},
    user::Role,
  };

  fn profile(history: Vec<HistoryEntry>) -> Profile {
    Profile {
      user_id:           Uuid::parse_str("0123abcd-4567-89ef-0123-456789abcdef").unwrap(),
      full_name:         "Ada  Obi-Eze".into(),
      phone:             "0800".into(),
      email:             "ada@example.edu".into(),
      role:              Role::Staff,
      profile_photo:     None,
      appraisal_history: history,
      created_at:        Utc::now(),
      updated_at:        Utc::now(),
    }
  }

  fn entry(stage: Stage, appraisal_id: Option<Uuid>, comments: &str) -> HistoryEntry {
    HistoryEntry {
      stage,
      score: (stage == Stage::HodReview).then_some(76.0),
      comments: comments.into(),
      reviewed_by: "Dr. Reviewer".into(),
      reviewed_by_id: Uuid::new_v4(),
      date: Utc::now(),
      appraisal_id,
    }
  }

  fn rows(report: &Report) -> Vec<&[String; 4]> {
    report
      .blocks
      .iter()
      .filter_map(|b| match b {
        Block::TableRow(cells) => Some(cells),
        _ => None,
      })
      .collect()
  }

  #[test]
  fn empty_history_has_placeholder() {
    let report = compile(&profile(vec![]), &[]);
    assert!(
      report
        .blocks
        .contains(&Block::Line("No appraisal history available.".into()))
    );
    assert!(!report.blocks.contains(&Block::TableHeader));
    assert_eq!(report.page_count(), 1);
  }

  #[test]
  fn groups_follow_first_appearance() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let report = compile(
      &profile(vec![
        entry(Stage::HodReview, Some(a), "first"),
        entry(Stage::HodReview, Some(b), ""),
        entry(Stage::CommitteeReview, Some(a), ""),
        entry(Stage::HodReview, None, ""),
      ]),
      &[],
    );

    let headers = report.blocks.iter().filter(|b| **b == Block::TableHeader).count();
    assert_eq!(headers, 3);
    let stages: Vec<_> = rows(&report).iter().map(|r| r[0].as_str()).collect();
    assert_eq!(stages, ["HOD Review", "Committee Review", "HOD Review", "HOD Review"]);
    assert_eq!(rows(&report)[1][1], "N/A");
    assert_eq!(rows(&report)[0][1], "76");
    assert!(report.blocks.contains(&Block::Note("Comments: first".into())));
  }

  #[test]
  fn known_appraisals_are_labelled() {
    use crate::{
      appraisal::{Appraisal, AppraisalData},
      normalize::Submission,
      user::{StaffCategory, User},
    };

    let p = profile(vec![]);
    let owner = User {
      user_id:       p.user_id,
      full_name:     p.full_name.clone(),
      email:         p.email.clone(),
      phone:         p.phone.clone(),
      role:          Role::Staff,
      staff_number:  None,
      faculty:       "Science".into(),
      department:    "Physics".into(),
      category:      StaffCategory::Junior,
      password_hash: String::new(),
      created_at:    Utc::now(),
    };
    let form = Submission::new()
      .with("institution[]", vec!["Lagos", "Ibadan"])
      .with("qualification[]", vec!["BSc", "MSc"])
      .with("toYear[]", vec!["2005", "2012"]);
    let appraisal = Appraisal::new(
      &owner,
      StaffCategory::Junior,
      AppraisalData::from_submission(&form),
      vec![],
    );

    let report = compile(
      &profile(vec![entry(Stage::HodReview, Some(appraisal.appraisal_id), "")]),
      std::slice::from_ref(&appraisal),
    );
    assert!(
      report
        .blocks
        .contains(&Block::Heading(format!("Appraisal ID: {}", appraisal.appraisal_id)))
    );
    assert!(
      report
        .blocks
        .contains(&Block::Line("Latest Qualification: MSc (Ibadan, 2012)".into()))
    );
  }

  #[test]
  fn long_history_paginates() {
    let history = (0..40)
      .map(|_| entry(Stage::HodReview, Some(Uuid::new_v4()), "ok"))
      .collect();
    let report = compile(&profile(history), &[]);
    assert!(report.page_count() > 1);
    assert_ne!(report.blocks.last(), Some(&Block::PageBreak));
  }

  #[test]
  fn filename_is_sanitized() {
    let p = profile(vec![]);
    assert_eq!(
      report_filename(&p.full_name, p.user_id, "txt"),
      "appraisal-report-Ada_Obi_Eze-0123abcd.txt"
    );
    assert_eq!(
      report_filename("  ***  ", p.user_id, "pdf"),
      "appraisal-report-user-0123abcd.pdf"
    );
    let long = report_filename(&"x".repeat(50), p.user_id, "pdf");
    assert_eq!(long, format!("appraisal-report-{}-0123abcd.pdf", "x".repeat(30)));
    assert_eq!(
      report_filename("Ada", p.user_id, "t xt"),
      "appraisal-report-0123abcd-456.t xt"
    );
  }
}
