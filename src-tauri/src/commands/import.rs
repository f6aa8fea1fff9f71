use crate::csv_import::{csv_template, parse_csv, CsvError, CsvPreview, TEMPLATE_FILENAME};
use crate::db::AppState;
use crate::store::UploadSummary;
use serde::Serialize;
use std::sync::Arc;
use tauri::State;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvTemplate {
  pub filename: &'static str,
  pub content: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
  #[serde(flatten)]
  pub summary: UploadSummary,
  pub message: String,
}

#[tauri::command]
pub fn get_csv_template() -> CsvTemplate {
  CsvTemplate {
    filename: TEMPLATE_FILENAME,
    content: csv_template(),
  }
}

/// Parse and validate without writing anything
#[tauri::command]
pub fn preview_csv(state: State<'_, Arc<AppState>>, csv_text: String) -> Result<CsvPreview, CsvError> {
  parse_csv(&csv_text, &state.config.rules)
}

/// Validate, then append every valid row. Invalid rows are skipped and counted.
#[tauri::command]
pub async fn upload_csv(state: State<'_, Arc<AppState>>, csv_text: String) -> Result<UploadResult, CsvError> {
  let preview = parse_csv(&csv_text, &state.config.rules)?;
  tracing::info!(message = %preview.summary(), "csv upload received");

  let summary = state.store.upload_rows(&preview).await;
  Ok(UploadResult {
    message: summary.message(),
    summary,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::AppConfig;
  use crate::store::WorkoutStore;
  use crate::test_utils::*;
  use serial_test::serial;
  use tauri::Manager;

  const HEADER: &str = "personName,workoutType,startTime,endTime,duration,date\n";

  #[test]
  fn test_get_csv_template() {
    let template = get_csv_template();
    assert_eq!(template.filename, "workout_template.csv");
    assert!(template.content.starts_with(HEADER));
  }

  #[tokio::test]
  #[serial]
  async fn test_preview_csv_reports_rows() {
    let app = tauri::test::mock_app();
    app.manage(Arc::new(AppState::new(WorkoutStore::Demo, AppConfig::default())));

    let text = format!("{}Greg,Gym,09:00,09:45,45,2024-01-15\nGreg,Gym,09:00,09:45,soon,2024-01-15\n", HEADER);
    let preview = preview_csv(app.state(), text).unwrap();
    assert_eq!(preview.valid, 1);
    assert_eq!(preview.invalid, 1);
    assert_eq!(preview.rows[1].errors, vec!["Invalid duration: soon"]);

    let err = preview_csv(app.state(), "name,date\nGreg,2024-01-15\n".into()).unwrap_err();
    assert!(matches!(err, CsvError::MissingColumns(_)));
  }

  #[tokio::test]
  #[serial]
  async fn test_upload_csv_local_store() {
    let pool = setup_test_db().await;
    let app = tauri::test::mock_app();
    app.manage(Arc::new(AppState::new(WorkoutStore::Local(pool.clone()), AppConfig::default())));

    let result = upload_csv(app.state(), csv_template().to_string()).await.unwrap();
    assert_eq!(result.summary.success_count, 4);
    assert_eq!(result.summary.error_count, 0);
    assert_eq!(result.message, "Successfully uploaded 4 workouts");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workouts")
      .fetch_one(&pool)
      .await
      .unwrap();
    assert_eq!(count, 4);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_upload_csv_header_only_is_rejected() {
    let app = tauri::test::mock_app();
    app.manage(Arc::new(AppState::new(WorkoutStore::Demo, AppConfig::default())));

    let err = upload_csv(app.state(), HEADER.to_string()).await.unwrap_err();
    assert_eq!(err, CsvError::NoDataRows);
  }
}
