pub mod dashboard;
pub mod image;
pub mod import;

use crate::db::AppState;
use crate::models::{NewWorkout, Workout, WorkoutPatch};
use crate::store::MutationResult;
use crate::validation::ValidationMode;
use serde::Serialize;
use std::sync::Arc;
use tauri::State;
use tauri_plugin_opener::OpenerExt;

/// ---------------------------------------------------------------------------
/// Workouts
/// ---------------------------------------------------------------------------

/// Every workout in the store, or the demo dataset when the store is not
/// configured or cannot be read
#[tauri::command]
pub async fn get_workouts(state: State<'_, Arc<AppState>>) -> Result<Vec<Workout>, String> {
  let (workouts, _) = state.store.load_workouts_or_demo().await;
  Ok(workouts)
}

#[tauri::command]
pub async fn add_workout(
  state: State<'_, Arc<AppState>>,
  workout: NewWorkout,
) -> Result<MutationResult, String> {
  state.store.add(workout).await.map_err(|e| {
    tracing::warn!(error = %e, "add workout failed");
    format!("Failed to add workout: {}", e)
  })
}

#[tauri::command]
pub async fn update_workout(
  state: State<'_, Arc<AppState>>,
  id: i64,
  patch: WorkoutPatch,
) -> Result<MutationResult, String> {
  state.store.update(id, &patch).await.map_err(|e| {
    tracing::warn!(id, error = %e, "update workout failed");
    format!("Failed to update workout: {}", e)
  })
}

#[tauri::command]
pub async fn delete_workout(state: State<'_, Arc<AppState>>, id: i64) -> Result<MutationResult, String> {
  state.store.delete(id).await.map_err(|e| {
    tracing::warn!(id, error = %e, "delete workout failed");
    format!("Failed to delete workout: {}", e)
  })
}

/// ---------------------------------------------------------------------------
/// Entry Form Reference Data
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
  pub people: Vec<String>,
  pub workout_types: Vec<String>,
  pub validation_mode: ValidationMode,
  /// Which store backs the app: "sheets", "local" or "demo"
  pub backend: &'static str,
}

#[tauri::command]
pub fn get_roster(state: State<'_, Arc<AppState>>) -> Roster {
  let rules = &state.config.rules;
  Roster {
    people: rules.roster.clone(),
    workout_types: rules.workout_types.clone(),
    validation_mode: rules.mode,
    backend: state.store.backend_name(),
  }
}

/// Open the backing spreadsheet in the default browser
#[tauri::command]
pub async fn open_workout_sheet<R: tauri::Runtime>(
  app: tauri::AppHandle<R>,
  state: State<'_, Arc<AppState>>,
) -> Result<String, String> {
  let url = state
    .config
    .sheets
    .as_ref()
    .map(|sheets| sheets.spreadsheet_url())
    .ok_or_else(|| "No spreadsheet configured (set GOOGLE_SHEET_ID)".to_string())?;

  app
    .opener()
    .open_url(url.clone(), None::<&str>)
    .map_err(|e| format!("Failed to open spreadsheet: {}", e))?;

  Ok(url)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
