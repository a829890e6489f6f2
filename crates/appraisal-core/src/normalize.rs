//! Rebuilds row records from parallel repeated fields.
//!
//! HTML forms submit a repeated group (e.g. one line per qualification) as a
//! set of same-named fields, `institution[]`, `fromYear[]`, …, that share an
//! index. [`normalize_rows`] zips those sequences back into rows.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ─── Submission ──────────────────────────────────────────────────────────────

/// A single form field: either one value or a repeated sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
  One(String),
  Many(Vec<String>),
}

impl From<&str> for FieldValue {
  fn from(s: &str) -> Self { Self::One(s.to_owned()) }
}

impl From<String> for FieldValue {
  fn from(s: String) -> Self { Self::One(s) }
}

impl<S: Into<String>> From<Vec<S>> for FieldValue {
  fn from(v: Vec<S>) -> Self { Self::Many(v.into_iter().map(Into::into).collect()) }
}

/// A flat form submission keyed by field name.
///
/// Repeated fields may be keyed either as `name[]` or `name`; lookups try the
/// bracketed form first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Submission(BTreeMap<String, FieldValue>);

impl Submission {
  pub fn new() -> Self { Self::default() }

  /// Builder-style insert.
  pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
    self.0.insert(name.to_owned(), value.into());
    self
  }

  pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
    self.0.insert(name.into(), value);
  }

  fn get(&self, name: &str) -> Option<&FieldValue> {
    self.0.get(&format!("{name}[]")).or_else(|| self.0.get(name))
  }

  /// The values of `name` as a sequence. A scalar counts as a sequence of
  /// one; an absent field is empty.
  pub fn sequence(&self, name: &str) -> &[String] {
    match self.get(name) {
      Some(FieldValue::One(s)) => std::slice::from_ref(s),
      Some(FieldValue::Many(v)) => v,
      None => &[],
    }
  }

  /// The trimmed first value of `name`, or `None` when absent or blank.
  pub fn scalar(&self, name: &str) -> Option<String> {
    self
      .sequence(name)
      .first()
      .map(|s| s.trim())
      .filter(|s| !s.is_empty())
      .map(str::to_owned)
  }
}

// ─── Row reconstruction ──────────────────────────────────────────────────────

/// Zip the sequences named by `fields` into rows.
///
/// The row count is the length of the longest sequence; shorter sequences
/// contribute empty cells. Cells are trimmed, and rows whose cells are all
/// empty are dropped. Row order follows input index order.
pub fn normalize_rows(submission: &Submission, fields: &[&str]) -> Vec<Vec<String>> {
  let columns: Vec<&[String]> =
    fields.iter().map(|f| submission.sequence(f)).collect();
  let len = columns.iter().map(|c| c.len()).max().unwrap_or(0);

  (0..len)
    .filter_map(|i| {
      let row: Vec<String> = columns
        .iter()
        .map(|c| c.get(i).map(|v| v.trim().to_owned()).unwrap_or_default())
        .collect();
      row.iter().any(|cell| !cell.is_empty()).then_some(row)
    })
    .collect()
}

/// A record type assembled from one normalized row.
pub trait RowGroup: Sized {
  /// Field names in cell order.
  const FIELDS: &'static [&'static str];

  /// Build from exactly `FIELDS.len()` cells.
  fn from_cells(cells: Vec<String>) -> Self;
}

/// Normalize the field group `R` out of `submission`.
pub fn rows<R: RowGroup>(submission: &Submission) -> Vec<R> {
  normalize_rows(submission, R::FIELDS)
    .into_iter()
    .map(R::from_cells)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  const QUALIFICATION: &[&str] = &["institution", "fromYear", "toYear", "qualification"];

  fn qualifications() -> Submission {
    Submission::new()
      .with("institution[]", vec!["A", "B", "C"])
      .with("fromYear[]", vec!["2001", "2005", "2010"])
      .with("toYear[]", vec!["2004", "2008", "2012"])
      .with("qualification[]", vec!["BSc", "MSc", "PhD"])
  }

  #[test]
  fn rows_follow_input_order() {
    let rows = normalize_rows(&qualifications(), QUALIFICATION);
    assert_eq!(rows.len(), 3);
    let institutions: Vec<_> = rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(institutions, ["A", "B", "C"]);
    assert_eq!(rows[1], ["B", "2005", "2008", "MSc"]);
  }

  #[test]
  fn normalizing_twice_is_identical() {
    let s = qualifications();
    assert_eq!(
      normalize_rows(&s, QUALIFICATION),
      normalize_rows(&s, QUALIFICATION)
    );
  }

  #[test]
  fn shorter_sequences_yield_empty_cells() {
    let s = Submission::new()
      .with("institution[]", vec!["A", "B", "C"])
      .with("fromYear[]", vec!["2001"])
      .with("qualification[]", vec!["BSc", "MSc"]);

    let rows = normalize_rows(&s, QUALIFICATION);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], ["A", "2001", "", "BSc"]);
    assert_eq!(rows[2], ["C", "", "", ""]);
  }

  #[test]
  fn blank_rows_are_dropped() {
    let s = Submission::new()
      .with("institution[]", vec!["A", "  ", "C"])
      .with("toYear[]", vec!["2004", "", "2012"]);

    let rows = normalize_rows(&s, QUALIFICATION);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], "A");
    assert_eq!(rows[1][0], "C");
  }

  #[test]
  fn scalar_counts_as_single_row_and_brackets_are_optional() {
    let s = Submission::new()
      .with("institution", "Only")
      .with("toYear", "1999");
    let rows = normalize_rows(&s, QUALIFICATION);
    assert_eq!(rows, vec![vec!["Only", "", "1999", ""]]);
  }

  #[test]
  fn absent_group_yields_nothing() {
    assert!(normalize_rows(&Submission::new(), QUALIFICATION).is_empty());
  }

  #[test]
  fn scalar_lookup_trims_and_skips_blank() {
    let s = Submission::new()
      .with("employeeName", "  Ada  ")
      .with("placeOfBirth", "   ");
    assert_eq!(s.scalar("employeeName").as_deref(), Some("Ada"));
    assert_eq!(s.scalar("placeOfBirth"), None);
    assert_eq!(s.scalar("missing"), None);
  }

  #[test]
  fn submission_deserializes_from_form_json() {
    let s: Submission = serde_json::from_str(
      r#"{"employeeName":"Ada","institution[]":["A","B"]}"#,
    )
    .unwrap();
    assert_eq!(s.sequence("institution"), ["A", "B"]);
    assert_eq!(s.scalar("employeeName").as_deref(), Some("Ada"));
  }
}
