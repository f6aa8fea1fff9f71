//! Field rules and normalization for incoming workouts
//!
//! Two entry paths share these rules: the single-record ingest (form submit or
//! a confirmed image extraction) and CSV bulk rows. Ingest fails fast with an
//! [`IngestError`]; CSV rows collect every message instead (see `csv_import`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::duration::{duration_between, is_valid_time_of_day, try_parse_duration_minutes};
use crate::models::workout::{PERSON_NAMES, WORKOUT_TYPES};
use crate::models::{DurationValue, NewWorkout, Workout};
use crate::stats::parse_workout_date;

/// ---------------------------------------------------------------------------
/// Validation Rules
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
  /// Names and types must come from the roster, duration must be a positive integer
  #[default]
  Strict,
  /// Fields only need to be present
  Lenient,
}

impl FromStr for ValidationMode {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "strict" => Ok(ValidationMode::Strict),
      "lenient" => Ok(ValidationMode::Lenient),
      other => Err(format!("Unknown validation mode: {}", other)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
  pub mode: ValidationMode,
  pub roster: Vec<String>,
  pub workout_types: Vec<String>,
}

impl Default for ValidationRules {
  fn default() -> Self {
    Self::new(ValidationMode::Strict, default_roster())
  }
}

pub fn default_roster() -> Vec<String> {
  PERSON_NAMES.iter().map(|s| s.to_string()).collect()
}

impl ValidationRules {
  pub fn new(mode: ValidationMode, roster: Vec<String>) -> Self {
    Self {
      mode,
      roster,
      workout_types: WORKOUT_TYPES.iter().map(|s| s.to_string()).collect(),
    }
  }

  pub fn lenient() -> Self {
    Self::new(ValidationMode::Lenient, default_roster())
  }

  fn strict(&self) -> bool {
    self.mode == ValidationMode::Strict
  }

  pub fn check_person(&self, value: &str) -> Option<String> {
    if value.is_empty() {
      return Some("Missing person name".to_string());
    }
    if self.strict() && !self.roster.iter().any(|p| p == value) {
      return Some(format!("Invalid person name: {}", value));
    }
    None
  }

  pub fn check_workout_type(&self, value: &str) -> Option<String> {
    if value.is_empty() {
      return Some("Missing workout type".to_string());
    }
    if self.strict() && !self.workout_types.iter().any(|t| t == value) {
      return Some(format!("Invalid workout type: {}", value));
    }
    None
  }

  pub fn check_time(&self, label: &str, value: &str) -> Option<String> {
    if value.is_empty() {
      return Some(format!("Missing {}", label));
    }
    if !is_valid_time_of_day(value) {
      return Some(format!("Invalid {}: {} (use HH:MM format)", label, value));
    }
    None
  }

  pub fn check_duration(&self, value: &str) -> Option<String> {
    if value.is_empty() {
      return Some("Missing duration".to_string());
    }
    if self.strict() && !matches!(value.parse::<u32>(), Ok(minutes) if minutes > 0) {
      return Some(format!("Invalid duration: {}", value));
    }
    None
  }

  pub fn check_date(&self, value: &str) -> Option<String> {
    if value.is_empty() {
      return Some("Missing date".to_string());
    }
    if !is_iso_date(value) {
      return Some(format!("Invalid date format: {} (use YYYY-MM-DD)", value));
    }
    None
  }
}

/// `YYYY-MM-DD` with digits in every position and a real calendar date
pub fn is_iso_date(value: &str) -> bool {
  let bytes = value.as_bytes();
  if bytes.len() != 10 {
    return false;
  }
  let shape_ok = bytes.iter().enumerate().all(|(i, b)| match i {
    4 | 7 => *b == b'-',
    _ => b.is_ascii_digit(),
  });
  shape_ok && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// ---------------------------------------------------------------------------
/// Single Record Ingest
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
  #[error("Missing required field: {0}")]
  MissingField(&'static str),

  #[error("Invalid date: {0}")]
  InvalidDate(String),

  #[error("Invalid time: {0} (use HH:MM format)")]
  InvalidTime(String),

  #[error("Invalid duration: {0}")]
  InvalidDuration(String),

  #[error("End time {end} is before start time {start}; give a duration for overnight workouts")]
  EndBeforeStart { start: String, end: String },

  #[error("Duration is required unless both start and end times are given")]
  MissingDuration,
}

impl Serialize for IngestError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Validate an ingest payload and turn it into a storable workout.
///
/// The date is rewritten as `YYYY-MM-DD`, a missing duration is derived from
/// the start and end times, and an end time before the start time is rejected.
pub fn normalize_workout(input: NewWorkout) -> Result<Workout, IngestError> {
  let person_name = input.person_name.trim().to_string();
  if person_name.is_empty() {
    return Err(IngestError::MissingField("personName"));
  }
  let workout_type = input.workout_type.trim().to_string();
  if workout_type.is_empty() {
    return Err(IngestError::MissingField("workoutType"));
  }

  let raw_date = input.date.trim();
  if raw_date.is_empty() {
    return Err(IngestError::MissingField("date"));
  }
  let date = parse_workout_date(raw_date).ok_or_else(|| IngestError::InvalidDate(raw_date.to_string()))?;

  let start_time = non_empty(input.start_time);
  let end_time = non_empty(input.end_time);
  for time in start_time.iter().chain(end_time.iter()) {
    if !is_valid_time_of_day(time) {
      return Err(IngestError::InvalidTime(time.clone()));
    }
  }

  // A supplied duration wins; the times are only consulted when it is missing
  let minutes = match input.duration.filter(|d| !d.is_blank()) {
    Some(value) => {
      try_parse_duration_minutes(&value).ok_or_else(|| IngestError::InvalidDuration(value.to_string()))?
    }
    None => match (&start_time, &end_time) {
      (Some(start), Some(end)) => match duration_between(start, end) {
        Some(minutes) if minutes < 0 => {
          return Err(IngestError::EndBeforeStart {
            start: start.clone(),
            end: end.clone(),
          })
        }
        Some(minutes) => minutes as f64,
        None => return Err(IngestError::MissingDuration),
      },
      _ => return Err(IngestError::MissingDuration),
    },
  };

  Ok(
    Workout {
      id: None,
      day_of_week: String::new(),
      person_name,
      workout_type,
      start_time,
      end_time,
      duration: DurationValue::Minutes(minutes),
      date: date.format("%Y-%m-%d").to_string(),
      name: non_empty(input.name),
    }
    .with_derived_fields(),
  )
}
