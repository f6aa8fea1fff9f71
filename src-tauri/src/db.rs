use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::PathBuf;
use tauri::Manager;

use crate::config::{AppConfig, StoreBackend};
use crate::sheets::SheetsClient;
use crate::store::WorkoutStore;

pub type DbPool = SqlitePool;

/// Application state shared by every command
pub struct AppState {
  pub store: WorkoutStore,
  pub config: AppConfig,
}

impl AppState {
  pub fn new(store: WorkoutStore, config: AppConfig) -> Self {
    Self { store, config }
  }
}

/// Get the path to the database file
/// Stored in the platform app data dir, e.g.
/// ~/Library/Application Support/com.workoutchallenge.dashboard/workout-challenge.db
fn get_db_path<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> Result<PathBuf, Box<dyn std::error::Error>> {
  let data_dir = app
    .path()
    .app_data_dir()
    .map_err(|e| format!("Failed to get app data dir: {}", e))?;

  fs::create_dir_all(&data_dir)?;

  Ok(data_dir.join("workout-challenge.db"))
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> Result<DbPool, Box<dyn std::error::Error>> {
  let db_path = get_db_path(app)?;
  let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

  tracing::info!(path = %db_path.display(), "initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  tracing::info!("database initialized");

  Ok(pool)
}

/// Open the store the configuration asks for
pub async fn open_store<R: tauri::Runtime>(
  app: &tauri::AppHandle<R>,
  config: &AppConfig,
) -> Result<WorkoutStore, Box<dyn std::error::Error>> {
  let store = match (config.backend, &config.sheets) {
    (StoreBackend::Sheets, Some(sheets)) => WorkoutStore::Sheets(SheetsClient::new(sheets.clone())),
    (StoreBackend::Sheets, None) => return Err("Sheets backend selected without GOOGLE_SHEET_ID".into()),
    (StoreBackend::Local, _) => WorkoutStore::Local(initialize_db(app).await?),
    (StoreBackend::Demo, _) => WorkoutStore::Demo,
  };

  tracing::info!(backend = store.backend_name(), "workout store ready");
  Ok(store)
}
