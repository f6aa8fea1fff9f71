use crate::db::AppState;
use crate::stats::{
  cumulative_series, leaderboard, weekly_breakdown, CumulativePoint, Dashboard, LeaderboardEntry,
  PersonStats, WeeklyPoint,
};
use std::sync::Arc;
use tauri::State;

/// ---------------------------------------------------------------------------
/// Dashboard Bundle
/// ---------------------------------------------------------------------------

/// Everything the dashboard page draws, computed from one read of the store
#[tauri::command]
pub async fn get_dashboard(
  state: State<'_, Arc<AppState>>,
  person_name: Option<String>,
) -> Result<Dashboard, String> {
  let (workouts, source) = state.store.load_workouts_or_demo().await;
  let person_name = person_name.filter(|p| !p.trim().is_empty());

  tracing::debug!(count = workouts.len(), ?source, person = ?person_name, "building dashboard");
  Ok(Dashboard::build(&workouts, source, person_name.as_deref()))
}

/// ---------------------------------------------------------------------------
/// Individual Views
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn get_person_stats(
  state: State<'_, Arc<AppState>>,
  person_name: String,
) -> Result<PersonStats, String> {
  let (workouts, _) = state.store.load_workouts_or_demo().await;
  Ok(PersonStats::compute(&workouts, &person_name))
}

#[tauri::command]
pub async fn get_leaderboard(state: State<'_, Arc<AppState>>) -> Result<Vec<LeaderboardEntry>, String> {
  let (workouts, _) = state.store.load_workouts_or_demo().await;
  Ok(leaderboard(&workouts))
}

#[tauri::command]
pub async fn get_cumulative_series(
  state: State<'_, Arc<AppState>>,
) -> Result<Vec<CumulativePoint>, String> {
  let (workouts, _) = state.store.load_workouts_or_demo().await;
  Ok(cumulative_series(&workouts))
}

#[tauri::command]
pub async fn get_weekly_breakdown(state: State<'_, Arc<AppState>>) -> Result<Vec<WeeklyPoint>, String> {
  let (workouts, _) = state.store.load_workouts_or_demo().await;
  Ok(weekly_breakdown(&workouts))
}
