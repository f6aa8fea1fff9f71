//! CSV bulk import
//!
//! Rows are validated independently and invalid rows are kept with their error
//! messages so the admin can see what to fix. Only a missing header column (or
//! a file with no data rows) rejects the whole file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{DurationValue, NewWorkout};
use crate::validation::ValidationRules;

/// Columns every upload must carry, in template order
pub const REQUIRED_COLUMNS: [&str; 6] = ["personName", "workoutType", "startTime", "endTime", "duration", "date"];

pub const TEMPLATE_FILENAME: &str = "workout_template.csv";

const TEMPLATE: &str = "personName,workoutType,startTime,endTime,duration,date
Greg,Gym,09:00,09:45,45,2024-01-15
Cortese,HIIT,18:00,18:30,30,2024-01-15
Greg,Cardio,07:00,08:00,60,2024-01-16
Cortese,Activity,12:00,12:25,25,2024-01-16
";

/// Downloadable example file matching the column contract
pub fn csv_template() -> &'static str {
  TEMPLATE
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CsvError {
  #[error("Missing required columns: {}", .0.join(", "))]
  MissingColumns(Vec<String>),

  #[error("CSV file must contain at least a header row and one data row")]
  NoDataRows,
}

impl Serialize for CsvError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// One parsed data row with its validation outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvRow {
  /// 1-based line in the uploaded text, blank lines included
  pub line: usize,
  pub person_name: String,
  pub workout_type: String,
  pub start_time: String,
  pub end_time: String,
  pub duration: String,
  pub date: String,
  pub is_valid: bool,
  pub errors: Vec<String>,
}

impl CsvRow {
  pub fn to_new_workout(&self) -> NewWorkout {
    NewWorkout {
      person_name: self.person_name.clone(),
      workout_type: self.workout_type.clone(),
      start_time: Some(self.start_time.clone()),
      end_time: Some(self.end_time.clone()),
      duration: Some(DurationValue::Text(self.duration.clone())),
      date: self.date.clone(),
      name: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvPreview {
  pub rows: Vec<CsvRow>,
  pub total: usize,
  pub valid: usize,
  pub invalid: usize,
}

impl CsvPreview {
  pub fn valid_rows(&self) -> impl Iterator<Item = &CsvRow> {
    self.rows.iter().filter(|r| r.is_valid)
  }

  /// Status line shown after processing
  pub fn summary(&self) -> String {
    format!(
      "Processed {} rows: {} valid, {} invalid",
      self.total, self.valid, self.invalid
    )
  }
}

/// Parse and validate CSV text.
///
/// Fields are split on plain commas; quoted fields are not supported.
pub fn parse_csv(text: &str, rules: &ValidationRules) -> Result<CsvPreview, CsvError> {
  let text = text.trim_start_matches('\u{feff}');
  let lines: Vec<(usize, &str)> = text
    .lines()
    .enumerate()
    .filter(|(_, l)| !l.trim().is_empty())
    .collect();

  let Some((_, header_line)) = lines.first() else {
    return Err(CsvError::NoDataRows);
  };
  let headers: Vec<&str> = header_line.split(',').map(str::trim).collect();

  let missing: Vec<String> = REQUIRED_COLUMNS
    .iter()
    .filter(|col| !headers.contains(*col))
    .map(|col| col.to_string())
    .collect();
  if !missing.is_empty() {
    return Err(CsvError::MissingColumns(missing));
  }
  if lines.len() < 2 {
    return Err(CsvError::NoDataRows);
  }

  let rows: Vec<CsvRow> = lines[1..]
    .iter()
    .map(|(idx, line)| {
      let values: Vec<&str> = line.split(',').map(str::trim).collect();
      let record: HashMap<&str, &str> = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| (*header, values.get(idx).copied().unwrap_or("")))
        .collect();
      validate_row(idx + 1, &record, rules)
    })
    .collect();

  let valid = rows.iter().filter(|r| r.is_valid).count();
  let total = rows.len();

  tracing::debug!(total, valid, "parsed csv upload");

  Ok(CsvPreview {
    rows,
    total,
    valid,
    invalid: total - valid,
  })
}

fn validate_row(line: usize, record: &HashMap<&str, &str>, rules: &ValidationRules) -> CsvRow {
  let field = |name: &str| record.get(name).copied().unwrap_or("").to_string();

  let row_person = field("personName");
  let row_type = field("workoutType");
  let row_start = field("startTime");
  let row_end = field("endTime");
  let row_duration = field("duration");
  let row_date = field("date");

  let errors: Vec<String> = [
    rules.check_person(&row_person),
    rules.check_workout_type(&row_type),
    rules.check_time("start time", &row_start),
    rules.check_time("end time", &row_end),
    rules.check_duration(&row_duration),
    rules.check_date(&row_date),
  ]
  .into_iter()
  .flatten()
  .collect();

  CsvRow {
    line,
    person_name: row_person,
    workout_type: row_type,
    start_time: row_start,
    end_time: row_end,
    duration: row_duration,
    date: row_date,
    is_valid: errors.is_empty(),
    errors,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_template_parses_cleanly_in_strict_mode() {
    let preview = parse_csv(csv_template(), &ValidationRules::default()).unwrap();
    assert_eq!(preview.total, 4);
    assert_eq!(preview.valid, 4);
    assert_eq!(preview.invalid, 0);
    assert_eq!(preview.rows[0].person_name, "Greg");
    assert_eq!(preview.rows[0].line, 2);
    assert_eq!(preview.summary(), "Processed 4 rows: 4 valid, 0 invalid");
  }

  #[test]
  fn test_missing_columns_abort_whole_file() {
    let text = "personName,workoutType,duration\nGreg,Gym,45\n";
    let err = parse_csv(text, &ValidationRules::default()).unwrap_err();
    assert_eq!(
      err,
      CsvError::MissingColumns(vec!["startTime".into(), "endTime".into(), "date".into()])
    );
    assert_eq!(err.to_string(), "Missing required columns: startTime, endTime, date");
  }

  #[test]
  fn test_header_only_or_empty_is_rejected() {
    let rules = ValidationRules::default();
    assert_eq!(
      parse_csv("personName,workoutType,startTime,endTime,duration,date\n\n", &rules),
      Err(CsvError::NoDataRows)
    );
    assert_eq!(parse_csv("   \n", &rules), Err(CsvError::NoDataRows));
  }

  #[test]
  fn test_invalid_rows_are_kept_with_errors() {
    let text = "personName,workoutType,startTime,endTime,duration,date
Greg,Gym,09:00,09:45,45,2024-01-15
Bob,Yoga,9am,09:45,0,15/01/2024
";
    let preview = parse_csv(text, &ValidationRules::default()).unwrap();
    assert_eq!(preview.total, 2);
    assert_eq!(preview.valid, 1);
    assert_eq!(preview.invalid, 1);

    let bad = &preview.rows[1];
    assert!(!bad.is_valid);
    assert_eq!(
      bad.errors,
      vec![
        "Invalid person name: Bob",
        "Invalid workout type: Yoga",
        "Invalid start time: 9am (use HH:MM format)",
        "Invalid duration: 0",
        "Invalid date format: 15/01/2024 (use YYYY-MM-DD)",
      ]
    );
  }

  #[test]
  fn test_is_valid_iff_no_errors() {
    let text = "personName,workoutType,startTime,endTime,duration,date
Greg,Gym,09:00,09:45,45,2024-01-15
,,,,,
Kyle,HIIT,10:00,10:30,30
Nick,Cardio,25:00,10:30,abc,2024-13-01
";
    let preview = parse_csv(text, &ValidationRules::default()).unwrap();
    assert_eq!(preview.total, 4);
    for row in &preview.rows {
      assert_eq!(row.is_valid, row.errors.is_empty());
    }
    assert_eq!(preview.valid + preview.invalid, preview.total);
  }

  #[test]
  fn test_missing_trailing_fields_become_empty() {
    let text = "personName,workoutType,startTime,endTime,duration,date\nKyle,HIIT,10:00,10:30,30\n";
    let preview = parse_csv(text, &ValidationRules::default()).unwrap();
    let row = &preview.rows[0];
    assert_eq!(row.date, "");
    assert_eq!(row.errors, vec!["Missing date"]);
  }

  #[test]
  fn test_column_order_and_extra_columns_are_tolerated() {
    let text = "\u{feff}date, duration ,notes,endTime,startTime,workoutType,personName\r
2024-01-15,45,leg day,09:45,09:00,Gym,Greg\r
";
    let preview = parse_csv(text, &ValidationRules::default()).unwrap();
    assert_eq!(preview.valid, 1);
    let row = &preview.rows[0];
    assert_eq!(row.person_name, "Greg");
    assert_eq!(row.duration, "45");
  }

  #[test]
  fn test_lenient_mode_accepts_free_text() {
    let text = "personName,workoutType,startTime,endTime,duration,date\nBob,Yoga,06:00,06:50,0:50,2024-03-01\n";
    assert_eq!(parse_csv(text, &ValidationRules::default()).unwrap().valid, 0);
    assert_eq!(parse_csv(text, &ValidationRules::lenient()).unwrap().valid, 1);
  }

  #[test]
  fn test_row_converts_to_ingest_payload() {
    let preview = parse_csv(csv_template(), &ValidationRules::default()).unwrap();
    let payload = preview.rows[1].to_new_workout();
    assert_eq!(payload.person_name, "Cortese");
    assert_eq!(payload.start_time.as_deref(), Some("18:00"));
    assert_eq!(payload.duration, Some(DurationValue::Text("30".into())));
    assert_eq!(preview.valid_rows().count(), 4);
  }

  #[test]
  fn test_row_line_counts_blank_lines() {
    let text = "personName,workoutType,startTime,endTime,duration,date\n\nGreg,Gym,09:00,09:45,45,2024-01-15\n  \nBob,Gym,09:00,09:45,45,2024-01-15\n";
    let preview = parse_csv(text, &ValidationRules::default()).unwrap();
    assert_eq!(preview.total, 2);
    assert_eq!(preview.rows[0].line, 3);
    assert_eq!(preview.rows[1].line, 5);
    assert!(preview.rows[1].errors[0].contains("Bob"));
  }
}
