use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default participant roster for the entry form and strict CSV checks
pub const PERSON_NAMES: [&str; 8] = ["Cortese", "Greg", "JP", "Kyle", "Nick", "Amanda", "Niki", "Stu"];

/// Fixed workout categories
pub const WORKOUT_TYPES: [&str; 4] = ["Gym", "HIIT", "Cardio", "Activity"];

/// Duration as it arrives from a form, a CSV cell or a spreadsheet cell.
/// Either a number of minutes or text such as "45" or "1:30".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
  Minutes(f64),
  Text(String),
}

impl DurationValue {
  /// Duration in decimal minutes, 0 when the text cannot be parsed
  pub fn minutes(&self) -> f64 {
    crate::duration::parse_duration_minutes(self)
  }

  pub fn is_blank(&self) -> bool {
    matches!(self, DurationValue::Text(s) if s.trim().is_empty())
  }
}

impl Default for DurationValue {
  fn default() -> Self {
    DurationValue::Minutes(0.0)
  }
}

impl fmt::Display for DurationValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DurationValue::Minutes(m) if m.fract() == 0.0 => write!(f, "{}", *m as i64),
      DurationValue::Minutes(m) => write!(f, "{}", m),
      DurationValue::Text(s) => f.write_str(s),
    }
  }
}

impl From<f64> for DurationValue {
  fn from(minutes: f64) -> Self {
    DurationValue::Minutes(minutes)
  }
}

impl From<&str> for DurationValue {
  fn from(text: &str) -> Self {
    DurationValue::Text(text.to_string())
  }
}

/// One exercise session as read from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>,
  /// Derived from `date` at read time, never authoritative
  #[serde(default)]
  pub day_of_week: String,
  pub person_name: String,
  pub workout_type: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub start_time: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub end_time: Option<String>,
  #[serde(default)]
  pub duration: DurationValue,
  pub date: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
}

impl Workout {
  /// Recompute derived fields from the authoritative ones
  pub fn with_derived_fields(mut self) -> Self {
    self.day_of_week = crate::stats::parse_workout_date(&self.date)
      .map(weekday_name)
      .unwrap_or_default();
    self
  }

  pub fn duration_minutes(&self) -> f64 {
    self.duration.minutes()
  }
}

/// English weekday name used for the spreadsheet's first column
pub fn weekday_name(date: NaiveDate) -> String {
  match date.weekday() {
    Weekday::Mon => "Monday",
    Weekday::Tue => "Tuesday",
    Weekday::Wed => "Wednesday",
    Weekday::Thu => "Thursday",
    Weekday::Fri => "Friday",
    Weekday::Sat => "Saturday",
    Weekday::Sun => "Sunday",
  }
  .to_string()
}

/// Ingest payload: `{personName, workoutType, startTime?, endTime?, duration, date, name?}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkout {
  pub person_name: String,
  pub workout_type: String,
  #[serde(default)]
  pub start_time: Option<String>,
  #[serde(default)]
  pub end_time: Option<String>,
  #[serde(default)]
  pub duration: Option<DurationValue>,
  pub date: String,
  #[serde(default)]
  pub name: Option<String>,
}

/// Partial update for an existing workout; absent fields keep their value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPatch {
  pub person_name: Option<String>,
  pub workout_type: Option<String>,
  pub start_time: Option<String>,
  pub end_time: Option<String>,
  pub duration: Option<DurationValue>,
  pub date: Option<String>,
  pub name: Option<String>,
}

impl WorkoutPatch {
  /// Overlay this patch on an existing workout, producing a fresh ingest payload
  pub fn apply(&self, existing: &Workout) -> NewWorkout {
    let times_changed = self.start_time.is_some() || self.end_time.is_some();
    NewWorkout {
      person_name: self.person_name.clone().unwrap_or_else(|| existing.person_name.clone()),
      workout_type: self.workout_type.clone().unwrap_or_else(|| existing.workout_type.clone()),
      start_time: self.start_time.clone().or_else(|| existing.start_time.clone()),
      end_time: self.end_time.clone().or_else(|| existing.end_time.clone()),
      // New times without a new duration means the duration gets re-derived
      duration: match (&self.duration, times_changed) {
        (Some(d), _) => Some(d.clone()),
        (None, true) => None,
        (None, false) => Some(existing.duration.clone()),
      },
      date: self.date.clone().unwrap_or_else(|| existing.date.clone()),
      name: self.name.clone().or_else(|| existing.name.clone()),
    }
  }
}

/// Row shape of the local SQLite store
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorkoutRow {
  pub id: i64,
  pub person_name: String,
  pub workout_type: String,
  pub start_time: Option<String>,
  pub end_time: Option<String>,
  pub duration: String,
  pub date: String,
  pub name: Option<String>,
}

impl From<WorkoutRow> for Workout {
  fn from(row: WorkoutRow) -> Self {
    Workout {
      id: Some(row.id),
      day_of_week: String::new(),
      person_name: row.person_name,
      workout_type: row.workout_type,
      start_time: row.start_time,
      end_time: row.end_time,
      duration: DurationValue::Text(row.duration),
      date: row.date,
      name: row.name,
    }
    .with_derived_fields()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_duration_value_deserializes_number_or_text() {
    let number: DurationValue = serde_json::from_str("45").unwrap();
    assert_eq!(number, DurationValue::Minutes(45.0));

    let text: DurationValue = serde_json::from_str("\"1:30\"").unwrap();
    assert_eq!(text, DurationValue::Text("1:30".to_string()));
  }

  #[test]
  fn test_duration_value_display() {
    assert_eq!(DurationValue::Minutes(45.0).to_string(), "45");
    assert_eq!(DurationValue::Minutes(12.5).to_string(), "12.5");
    assert_eq!(DurationValue::from("1:30").to_string(), "1:30");
  }

  #[test]
  fn test_new_workout_accepts_camel_case_payload() {
    let json = r#"{
      "personName": "Greg",
      "workoutType": "Gym",
      "startTime": "09:00",
      "endTime": "09:45",
      "duration": 45,
      "date": "2024-01-15"
    }"#;
    let workout: NewWorkout = serde_json::from_str(json).unwrap();
    assert_eq!(workout.person_name, "Greg");
    assert_eq!(workout.duration, Some(DurationValue::Minutes(45.0)));
    assert!(workout.name.is_none());
  }

  #[test]
  fn test_derived_day_of_week() {
    let workout = Workout {
      id: None,
      day_of_week: "Friday".to_string(),
      person_name: "Greg".to_string(),
      workout_type: "Gym".to_string(),
      start_time: None,
      end_time: None,
      duration: DurationValue::Minutes(60.0),
      date: "2024-01-15".to_string(),
      name: None,
    }
    .with_derived_fields();
    assert_eq!(workout.day_of_week, "Monday");

    let unparseable = Workout { date: "someday".to_string(), ..workout }.with_derived_fields();
    assert_eq!(unparseable.day_of_week, "");
  }

  #[test]
  fn test_patch_rederives_duration_when_times_change() {
    let existing = Workout {
      id: Some(2),
      day_of_week: String::new(),
      person_name: "Greg".to_string(),
      workout_type: "Gym".to_string(),
      start_time: Some("09:00".to_string()),
      end_time: Some("09:45".to_string()),
      duration: DurationValue::Minutes(45.0),
      date: "2024-01-15".to_string(),
      name: None,
    };

    let patch = WorkoutPatch {
      end_time: Some("10:00".to_string()),
      ..Default::default()
    };
    let merged = patch.apply(&existing);
    assert_eq!(merged.end_time.as_deref(), Some("10:00"));
    assert!(merged.duration.is_none());

    let rename = WorkoutPatch {
      person_name: Some("Kyle".to_string()),
      ..Default::default()
    };
    let merged = rename.apply(&existing);
    assert_eq!(merged.person_name, "Kyle");
    assert_eq!(merged.duration, Some(DurationValue::Minutes(45.0)));
  }
}
