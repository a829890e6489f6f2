//! Totals, percentages and banded ratings over items rated on a 0..=5 scale.
//!
//! Two call sites consume this module with different rounding rules: the HOD
//! evaluation rounds its percentage to the nearest whole number, the
//! personality-traits evaluation keeps the exact value. Both band the
//! percentage they end up with, so the same ratings can land in different
//! bands near a boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Highest rating a single item may receive.
pub const MAX_RATING: u8 = 5;

// ─── Rating bands ────────────────────────────────────────────────────────────

/// Qualitative band derived from a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceRating {
  Outstanding,
  VeryGood,
  Good,
  Fair,
  Unsatisfactory,
}

impl PerformanceRating {
  /// Band a percentage. Lower bounds are inclusive.
  pub fn from_percentage(percentage: f64) -> Self {
    if percentage >= 80.0 {
      Self::Outstanding
    } else if percentage >= 70.0 {
      Self::VeryGood
    } else if percentage >= 60.0 {
      Self::Good
    } else if percentage >= 50.0 {
      Self::Fair
    } else {
      Self::Unsatisfactory
    }
  }

  /// Human-facing label, e.g. `"Very Good"`.
  pub fn label(self) -> &'static str {
    match self {
      Self::Outstanding => "Outstanding",
      Self::VeryGood => "Very Good",
      Self::Good => "Good",
      Self::Fair => "Fair",
      Self::Unsatisfactory => "Unsatisfactory",
    }
  }
}

// ─── Score ───────────────────────────────────────────────────────────────────

/// How the percentage is finalised before banding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
  /// Round half away from zero to a whole percentage (HOD evaluation).
  Nearest,
  /// Keep the exact ratio (personality traits).
  Exact,
}

/// Derived figures for a set of rated items.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
  pub total_score:        u32,
  pub max_score:          u32,
  pub percentage:         f64,
  pub performance_rating: PerformanceRating,
}

/// Score a sequence of ratings. An empty sequence scores 0 of 0 at 0%.
pub fn score<I>(ratings: I, rounding: Rounding) -> ScoreSummary
where
  I: IntoIterator<Item = u8>,
{
  let (total_score, count) = ratings
    .into_iter()
    .fold((0u32, 0u32), |(sum, n), r| (sum + u32::from(r), n + 1));
  let max_score = count * u32::from(MAX_RATING);

  let exact = if max_score > 0 {
    f64::from(total_score) * 100.0 / f64::from(max_score)
  } else {
    0.0
  };
  let percentage = match rounding {
    Rounding::Nearest => exact.round(),
    Rounding::Exact => exact,
  };

  ScoreSummary {
    total_score,
    max_score,
    percentage,
    performance_rating: PerformanceRating::from_percentage(percentage),
  }
}

// ─── Input coercion ──────────────────────────────────────────────────────────

/// Turn a raw form value into a rating.
///
/// Missing and non-numeric values (null, empty or unparsable strings,
/// booleans, arrays, objects) coerce to 0. Numeric values must be whole and
/// within `0..=MAX_RATING`.
pub fn coerce_rating(key: &str, raw: &Value) -> Result<u8> {
  let n = match raw {
    Value::Number(n) => n.as_f64().unwrap_or(0.0),
    Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
    _ => 0.0,
  };
  if !n.is_finite() {
    return Ok(0);
  }
  if n.fract() != 0.0 || n < 0.0 || n > f64::from(MAX_RATING) {
    return Err(Error::validation(format!(
      "rating for {key:?} must be a whole number between 0 and {MAX_RATING}, got {n}"
    )));
  }
  Ok(n as u8)
}

/// Read an optional free-form score (e.g. a committee's overall mark).
/// Anything that is not a finite number yields `None`.
pub fn coerce_score(raw: &Value) -> Option<f64> {
  let n = match raw {
    Value::Number(n) => n.as_f64()?,
    Value::String(s) => s.trim().parse::<f64>().ok()?,
    _ => return None,
  };
  n.is_finite().then_some(n)
}
