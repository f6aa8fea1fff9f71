//! Workout store: the spreadsheet, a local SQLite file, or the demo dataset
//!
//! Every write goes through [`normalize_workout`] first, so all backends hold
//! the same normalized shape. The demo backend validates like the others but
//! only reports what it would have done.

use serde::{Deserialize, Serialize};

use crate::csv_import::CsvPreview;
use crate::db::DbPool;
use crate::demo::demo_workouts;
use crate::models::{NewWorkout, Workout, WorkoutPatch, WorkoutRow};
use crate::sheets::{SheetsClient, SheetsError};
use crate::stats::WorkoutSource;
use crate::validation::{normalize_workout, IngestError};

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("Spreadsheet error: {0}")]
  Sheets(#[from] SheetsError),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Invalid workout: {0}")]
  Invalid(#[from] IngestError),

  #[error("Workout {0} not found")]
  NotFound(i64),
}

impl Serialize for StoreError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Results
/// ---------------------------------------------------------------------------

/// Outcome of add/update/delete as shown to the admin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResult {
  pub success: bool,
  /// True when nothing was persisted (demo backend)
  pub simulated: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub workout: Option<Workout>,
}

impl MutationResult {
  fn persisted(message: impl Into<String>, workout: Option<Workout>) -> Self {
    Self {
      success: true,
      simulated: false,
      message: message.into(),
      workout,
    }
  }

  fn simulated(message: impl Into<String>, workout: Option<Workout>) -> Self {
    Self {
      success: true,
      simulated: true,
      message: message.into(),
      workout,
    }
  }
}

/// Counts reported after a bulk CSV upload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
  pub success_count: usize,
  pub error_count: usize,
  /// Rows that failed validation and were never sent
  pub skipped_invalid: usize,
  pub simulated: bool,
}

impl UploadSummary {
  pub fn message(&self) -> String {
    if self.error_count == 0 {
      format!("Successfully uploaded {} workouts", self.success_count)
    } else {
      format!(
        "Uploaded {} workouts, {} failed",
        self.success_count, self.error_count
      )
    }
  }
}

/// ---------------------------------------------------------------------------
/// Store
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum WorkoutStore {
  Sheets(SheetsClient),
  Local(DbPool),
  Demo,
}

const SELECT_WORKOUTS: &str =
  "SELECT id, person_name, workout_type, start_time, end_time, duration, date, name FROM workouts";

impl WorkoutStore {
  pub fn is_demo(&self) -> bool {
    matches!(self, WorkoutStore::Demo)
  }

  pub fn backend_name(&self) -> &'static str {
    match self {
      WorkoutStore::Sheets(_) => "sheets",
      WorkoutStore::Local(_) => "local",
      WorkoutStore::Demo => "demo",
    }
  }

  /// All stored workouts in insertion order
  pub async fn list(&self) -> Result<Vec<Workout>, StoreError> {
    match self {
      WorkoutStore::Sheets(client) => Ok(client.fetch_workouts().await?),
      WorkoutStore::Local(pool) => {
        let rows = sqlx::query_as::<_, WorkoutRow>(&format!("{} ORDER BY id ASC", SELECT_WORKOUTS))
          .fetch_all(pool)
          .await?;
        Ok(rows.into_iter().map(Workout::from).collect())
      }
      WorkoutStore::Demo => Ok(demo_workouts()),
    }
  }

  /// Workouts for reading. Falls back to the demo dataset when the store
  /// cannot be read, so the dashboard always has something to show.
  pub async fn load_workouts_or_demo(&self) -> (Vec<Workout>, WorkoutSource) {
    if self.is_demo() {
      return (demo_workouts(), WorkoutSource::Demo);
    }

    match self.list().await {
      Ok(workouts) => (workouts, WorkoutSource::Store),
      Err(e) => {
        tracing::warn!(backend = self.backend_name(), error = %e, "store read failed, serving demo data");
        (demo_workouts(), WorkoutSource::DemoFallback)
      }
    }
  }

  pub async fn find(&self, id: i64) -> Result<Workout, StoreError> {
    match self {
      WorkoutStore::Local(pool) => {
        let row = sqlx::query_as::<_, WorkoutRow>(&format!("{} WHERE id = ?1", SELECT_WORKOUTS))
          .bind(id)
          .fetch_optional(pool)
          .await?;
        row.map(Workout::from).ok_or(StoreError::NotFound(id))
      }
      _ => self
        .list()
        .await?
        .into_iter()
        .find(|w| w.id == Some(id))
        .ok_or(StoreError::NotFound(id)),
    }
  }

  /// Validate and append one workout
  pub async fn add(&self, input: NewWorkout) -> Result<MutationResult, StoreError> {
    let workout = normalize_workout(input)?;

    match self {
      WorkoutStore::Sheets(client) => {
        let row = client.append_workout(&workout).await?;
        tracing::info!(person = %workout.person_name, row, "appended workout to sheet");
        Ok(MutationResult::persisted(
          "Workout added successfully",
          Some(Workout { id: row, ..workout }),
        ))
      }
      WorkoutStore::Local(pool) => {
        let id = insert_row(pool, &workout).await?;
        tracing::info!(person = %workout.person_name, id, "stored workout");
        Ok(MutationResult::persisted(
          "Workout added successfully",
          Some(Workout { id: Some(id), ..workout }),
        ))
      }
      WorkoutStore::Demo => {
        tracing::info!(person = %workout.person_name, "demo mode, workout not saved");
        Ok(MutationResult::simulated(
          "Demo mode: workout validated but not saved (no spreadsheet configured)",
          Some(workout),
        ))
      }
    }
  }

  /// Apply a patch to an existing workout, re-validating the merged record
  pub async fn update(&self, id: i64, patch: &WorkoutPatch) -> Result<MutationResult, StoreError> {
    let existing = self.find(id).await?;
    let workout = Workout {
      id: Some(id),
      ..normalize_workout(patch.apply(&existing))?
    };

    match self {
      WorkoutStore::Sheets(client) => {
        client.update_row(id, &workout).await?;
        tracing::info!(row = id, "updated sheet row");
        Ok(MutationResult::persisted("Workout updated successfully", Some(workout)))
      }
      WorkoutStore::Local(pool) => {
        sqlx::query(
          r#"
          UPDATE workouts
          SET person_name = ?1, workout_type = ?2, start_time = ?3, end_time = ?4,
              duration = ?5, date = ?6, name = ?7
          WHERE id = ?8
          "#,
        )
        .bind(&workout.person_name)
        .bind(&workout.workout_type)
        .bind(&workout.start_time)
        .bind(&workout.end_time)
        .bind(workout.duration.to_string())
        .bind(&workout.date)
        .bind(&workout.name)
        .bind(id)
        .execute(pool)
        .await?;
        tracing::info!(id, "updated workout");
        Ok(MutationResult::persisted("Workout updated successfully", Some(workout)))
      }
      WorkoutStore::Demo => Ok(MutationResult::simulated(
        "Demo mode: update validated but not saved",
        Some(workout),
      )),
    }
  }

  pub async fn delete(&self, id: i64) -> Result<MutationResult, StoreError> {
    match self {
      WorkoutStore::Sheets(client) => {
        self.find(id).await?;
        client.clear_row(id).await?;
        tracing::info!(row = id, "cleared sheet row");
        Ok(MutationResult::persisted("Workout deleted successfully", None))
      }
      WorkoutStore::Local(pool) => {
        let result = sqlx::query("DELETE FROM workouts WHERE id = ?1")
          .bind(id)
          .execute(pool)
          .await?;
        if result.rows_affected() == 0 {
          return Err(StoreError::NotFound(id));
        }
        tracing::info!(id, "deleted workout");
        Ok(MutationResult::persisted("Workout deleted successfully", None))
      }
      WorkoutStore::Demo => {
        self.find(id).await?;
        Ok(MutationResult::simulated("Demo mode: delete not saved", None))
      }
    }
  }

  /// Append the valid rows of a CSV preview one at a time.
  ///
  /// A row that fails to save is counted and logged; the rest still go through.
  pub async fn upload_rows(&self, preview: &CsvPreview) -> UploadSummary {
    let mut summary = UploadSummary {
      skipped_invalid: preview.invalid,
      simulated: self.is_demo(),
      ..UploadSummary::default()
    };

    for row in preview.valid_rows() {
      match self.add(row.to_new_workout()).await {
        Ok(_) => summary.success_count += 1,
        Err(e) => {
          tracing::warn!(line = row.line, error = %e, "csv row upload failed");
          summary.error_count += 1;
        }
      }
    }

    tracing::info!(
      success = summary.success_count,
      failed = summary.error_count,
      skipped = summary.skipped_invalid,
      "csv upload finished"
    );
    summary
  }
}

async fn insert_row(pool: &DbPool, workout: &Workout) -> Result<i64, sqlx::Error> {
  let result = sqlx::query(
    r#"
    INSERT INTO workouts (person_name, workout_type, start_time, end_time, duration, date, name)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    "#,
  )
  .bind(&workout.person_name)
  .bind(&workout.workout_type)
  .bind(&workout.start_time)
  .bind(&workout.end_time)
  .bind(workout.duration.to_string())
  .bind(&workout.date)
  .bind(&workout.name)
  .execute(pool)
  .await?;

  Ok(result.last_insert_rowid())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
