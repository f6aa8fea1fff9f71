mod commands;
mod config;
mod csv_import;
mod db;
mod demo;
mod duration;
mod llm;
mod models;
mod sheets;
mod stats;
mod store;
mod validation;

#[cfg(test)]
mod test_utils;

use config::AppConfig;
use db::AppState;
use std::sync::Arc;
use store::WorkoutStore;
use tauri::Manager;
use tracing_subscriber::EnvFilter;

/// Log to stderr, filtered by `RUST_LOG` (default `info`)
fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();
  init_tracing();

  tauri::Builder::default()
    .plugin(tauri_plugin_opener::init())
    .setup(|app| {
      let config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "invalid configuration, running with demo data");
        AppConfig::default()
      });

      let app_handle = app.handle().clone();
      tauri::async_runtime::block_on(async move {
        let store = match db::open_store(&app_handle, &config).await {
          Ok(store) => store,
          Err(e) => {
            tracing::error!(error = %e, "failed to open workout store, running with demo data");
            WorkoutStore::Demo
          }
        };
        app_handle.manage(Arc::new(AppState::new(store, config)));
      });
      Ok(())
    })
    .invoke_handler(tauri::generate_handler![
      commands::get_workouts,
      commands::add_workout,
      commands::update_workout,
      commands::delete_workout,
      commands::get_roster,
      commands::open_workout_sheet,
      // Dashboard
      commands::dashboard::get_dashboard,
      commands::dashboard::get_person_stats,
      commands::dashboard::get_leaderboard,
      commands::dashboard::get_cumulative_series,
      commands::dashboard::get_weekly_breakdown,
      // CSV import
      commands::import::get_csv_template,
      commands::import::preview_csv,
      commands::import::upload_csv,
      // Image extraction
      commands::image::process_workout_image,
    ])
    .run(tauri::generate_context!())
    .expect("error while running tauri application");
}
