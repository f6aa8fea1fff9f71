//! Test utilities and helpers for integration and unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock data factories
//! - Helper assertions

use crate::models::{DurationValue, NewWorkout, Workout};
use serde_json::json;
use sqlx::SqlitePool;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Seed the database with test workouts, alternating between two people
/// on consecutive days starting 2024-01-15. Returns the IDs of created rows.
pub async fn seed_test_workouts(pool: &SqlitePool, count: usize) -> Vec<i64> {
  let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid seed date");
  let mut workout_ids = Vec::new();

  for i in 0..count {
    let (person, workout_type) = if i % 2 == 0 { ("Greg", "Gym") } else { ("Cortese", "HIIT") };
    let date = start + chrono::Duration::days(i as i64);

    let result = sqlx::query(
      r#"
      INSERT INTO workouts (person_name, workout_type, start_time, end_time, duration, date)
      VALUES (?1, ?2, ?3, ?4, ?5, ?6)
      "#,
    )
    .bind(person)
    .bind(workout_type)
    .bind("09:00")
    .bind("09:45")
    .bind("45")
    .bind(date.format("%Y-%m-%d").to_string())
    .execute(pool)
    .await
    .expect("Failed to insert test workout");

    workout_ids.push(result.last_insert_rowid());
  }

  workout_ids
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Create a stored-looking workout with a duration in minutes
pub fn mock_workout(person_name: &str, workout_type: &str, date: &str, minutes: f64) -> Workout {
  Workout {
    id: None,
    day_of_week: String::new(),
    person_name: person_name.to_string(),
    workout_type: workout_type.to_string(),
    start_time: None,
    end_time: None,
    duration: DurationValue::Minutes(minutes),
    date: date.to_string(),
    name: None,
  }
  .with_derived_fields()
}

/// Create a form-style ingest payload with start/end times and no explicit duration
pub fn mock_new_workout(person_name: &str, workout_type: &str, date: &str) -> NewWorkout {
  NewWorkout {
    person_name: person_name.to_string(),
    workout_type: workout_type.to_string(),
    start_time: Some("09:00".to_string()),
    end_time: Some("09:45".to_string()),
    duration: None,
    date: date.to_string(),
    name: None,
  }
}

/// Sheets `values.get` response body: header row plus the given rows
pub fn mock_sheet_values(rows: &[[&str; 8]]) -> String {
  let mut values = vec![json!([
    "dayOfWeek",
    "personName",
    "workoutType",
    "duration",
    "date",
    "name",
    "startTime",
    "endTime"
  ])];
  values.extend(rows.iter().map(|row| json!(row)));

  json!({
    "range": "Workouts!A1:H100",
    "majorDimension": "ROWS",
    "values": values,
  })
  .to_string()
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> =
      sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = 'workouts'")
        .fetch_all(&pool)
        .await
        .expect("Failed to query tables");

    assert_eq!(tables.len(), 1);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_workouts_returns_correct_count() {
    let pool = setup_test_db().await;

    let ids = seed_test_workouts(&pool, 5).await;
    assert_eq!(ids.len(), 5);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workouts")
      .fetch_one(&pool)
      .await
      .expect("Failed to count workouts");

    assert_eq!(count, 5);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let workout = mock_workout("Greg", "Gym", "2024-01-15", 45.0);
    assert_eq!(workout.day_of_week, "Monday");
    assert_eq!(workout.duration_minutes(), 45.0);

    let payload = mock_new_workout("Kyle", "HIIT", "2024-01-16");
    assert!(payload.duration.is_none());
    assert_eq!(payload.start_time.as_deref(), Some("09:00"));

    let body: serde_json::Value =
      serde_json::from_str(&mock_sheet_values(&[["Monday", "Greg", "Gym", "45", "2024-01-15", "", "", ""]])).unwrap();
    assert_eq!(body["values"].as_array().unwrap().len(), 2);
  }
}
