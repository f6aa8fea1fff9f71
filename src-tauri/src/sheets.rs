//! Google Sheets values API client
//!
//! The spreadsheet tab holds one workout per row, header in row 1:
//! `dayOfWeek, personName, workoutType, duration, date, name, startTime, endTime`.
//! Row numbers double as workout ids.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::models::{DurationValue, Workout};

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_SHEET_NAME: &str = "Workouts";
const FIRST_COLUMN: &str = "A";
const LAST_COLUMN: &str = "H";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetsConfig {
  pub spreadsheet_id: String,
  pub sheet_name: String,
  pub access_token: String,
  pub api_base: String,
}

impl SheetsConfig {
  /// Browser URL of the spreadsheet
  pub fn spreadsheet_url(&self) -> String {
    format!("https://docs.google.com/spreadsheets/d/{}/edit", self.spreadsheet_id)
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("Invalid sheets URL: {0}")]
  Url(String),

  #[error("Authentication failed - check GOOGLE_ACCESS_TOKEN")]
  Unauthorized,

  #[error("Permission denied - make sure the sheet is shared with the token's account")]
  Forbidden,

  #[error("Sheet not found - check GOOGLE_SHEET_ID and GOOGLE_SHEET_NAME")]
  NotFound,

  #[error("Sheets API error ({status}): {message}")]
  Api { status: u16, message: String },
}

impl Serialize for SheetsError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ValueRange {
  #[serde(default)]
  values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
struct ValueRangeBody {
  values: Vec<Vec<String>>,
}

/// Response of `values:append`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
  updates: Option<AppendUpdates>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
  updated_range: Option<String>,
}

/// ---------------------------------------------------------------------------
/// Row Mapping
/// ---------------------------------------------------------------------------

fn cell_text(value: &serde_json::Value) -> String {
  match value {
    serde_json::Value::String(s) => s.trim().to_string(),
    serde_json::Value::Null => String::new(),
    other => other.to_string(),
  }
}

fn optional(text: String) -> Option<String> {
  (!text.is_empty()).then_some(text)
}

/// Map one sheet row to a workout; `None` for blank rows
pub fn workout_from_row(row_number: i64, row: &[serde_json::Value]) -> Option<Workout> {
  let cell = |i: usize| row.get(i).map(cell_text).unwrap_or_default();

  if row.iter().all(|v| cell_text(v).is_empty()) {
    return None;
  }

  Some(
    Workout {
      id: Some(row_number),
      day_of_week: String::new(),
      person_name: cell(1),
      workout_type: cell(2),
      start_time: optional(cell(6)),
      end_time: optional(cell(7)),
      duration: DurationValue::Text(cell(3)),
      date: cell(4),
      name: optional(cell(5)),
    }
    .with_derived_fields(),
  )
}

/// Cells written for a workout, in column order
pub fn row_for_workout(workout: &Workout) -> Vec<String> {
  let workout = workout.clone().with_derived_fields();
  vec![
    workout.day_of_week,
    workout.person_name,
    workout.workout_type,
    workout.duration.to_string(),
    workout.date,
    workout.name.unwrap_or_default(),
    workout.start_time.unwrap_or_default(),
    workout.end_time.unwrap_or_default(),
  ]
}

/// Parse the first row number out of an A1 range such as `Workouts!A12:H12`
fn first_row_of_range(range: &str) -> Option<i64> {
  let cells = range.rsplit('!').next()?;
  let first = cells.split(':').next()?;
  first.trim_start_matches(|c: char| c.is_ascii_alphabetic()).parse().ok()
}

/// ---------------------------------------------------------------------------
/// Client
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SheetsClient {
  client: Client,
  config: SheetsConfig,
}

impl SheetsClient {
  pub fn new(config: SheetsConfig) -> Self {
    Self {
      client: Client::new(),
      config,
    }
  }

  fn data_range(&self) -> String {
    format!("{}!{}:{}", self.config.sheet_name, FIRST_COLUMN, LAST_COLUMN)
  }

  fn row_range(&self, row_number: i64) -> String {
    format!(
      "{}!{}{}:{}{}",
      self.config.sheet_name, FIRST_COLUMN, row_number, LAST_COLUMN, row_number
    )
  }

  /// `{base}/v4/spreadsheets/{id}/values/{range}{suffix}`
  fn values_url(&self, range: &str, suffix: &str) -> Result<Url, SheetsError> {
    let mut url = Url::parse(&self.config.api_base).map_err(|e| SheetsError::Url(e.to_string()))?;
    url
      .path_segments_mut()
      .map_err(|_| SheetsError::Url(self.config.api_base.clone()))?
      .pop_if_empty()
      .extend(["v4", "spreadsheets", self.config.spreadsheet_id.as_str(), "values"])
      .push(&format!("{}{}", range, suffix));
    Ok(url)
  }

  async fn check(response: reqwest::Response) -> Result<reqwest::Response, SheetsError> {
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }
    match status {
      reqwest::StatusCode::UNAUTHORIZED => Err(SheetsError::Unauthorized),
      reqwest::StatusCode::FORBIDDEN => Err(SheetsError::Forbidden),
      reqwest::StatusCode::NOT_FOUND => Err(SheetsError::NotFound),
      _ => {
        let message = response.text().await.unwrap_or_default();
        Err(SheetsError::Api {
          status: status.as_u16(),
          message,
        })
      }
    }
  }

  /// Fetch every workout row (the header row is skipped)
  pub async fn fetch_workouts(&self) -> Result<Vec<Workout>, SheetsError> {
    let url = self.values_url(&self.data_range(), "")?;

    let response = self
      .client
      .get(url)
      .bearer_auth(&self.config.access_token)
      .send()
      .await?;
    let range: ValueRange = Self::check(response).await?.json().await?;

    let workouts: Vec<Workout> = range
      .values
      .iter()
      .enumerate()
      .skip(1)
      .filter_map(|(i, row)| workout_from_row(i as i64 + 1, row))
      .collect();

    tracing::debug!(count = workouts.len(), "fetched workouts from sheet");
    Ok(workouts)
  }

  /// Append one workout; returns the row number it landed on when the API reports it
  pub async fn append_workout(&self, workout: &Workout) -> Result<Option<i64>, SheetsError> {
    let mut url = self.values_url(&self.data_range(), ":append")?;
    url
      .query_pairs_mut()
      .append_pair("valueInputOption", "USER_ENTERED")
      .append_pair("insertDataOption", "INSERT_ROWS");

    let body = ValueRangeBody {
      values: vec![row_for_workout(workout)],
    };

    let response = self
      .client
      .post(url)
      .bearer_auth(&self.config.access_token)
      .json(&body)
      .send()
      .await?;
    let appended: AppendResponse = Self::check(response).await?.json().await?;

    Ok(
      appended
        .updates
        .and_then(|u| u.updated_range)
        .and_then(|r| first_row_of_range(&r)),
    )
  }

  /// Overwrite the row holding workout `row_number`
  pub async fn update_row(&self, row_number: i64, workout: &Workout) -> Result<(), SheetsError> {
    let mut url = self.values_url(&self.row_range(row_number), "")?;
    url.query_pairs_mut().append_pair("valueInputOption", "USER_ENTERED");

    let body = ValueRangeBody {
      values: vec![row_for_workout(workout)],
    };

    let response = self
      .client
      .put(url)
      .bearer_auth(&self.config.access_token)
      .json(&body)
      .send()
      .await?;
    Self::check(response).await?;
    Ok(())
  }

  /// Blank out a row. The row itself stays so other row ids do not shift.
  pub async fn clear_row(&self, row_number: i64) -> Result<(), SheetsError> {
    let url = self.values_url(&self.row_range(row_number), ":clear")?;

    let response = self
      .client
      .post(url)
      .bearer_auth(&self.config.access_token)
      .json(&serde_json::json!({}))
      .send()
      .await?;
    Self::check(response).await?;
    Ok(())
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
