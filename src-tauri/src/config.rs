//! Runtime configuration read from the environment (`.env` is loaded in `run()`)

use serde::Serialize;
use std::env;
use std::str::FromStr;

use crate::sheets::{SheetsConfig, DEFAULT_SHEET_NAME, SHEETS_API_BASE};
use crate::validation::{default_roster, ValidationMode, ValidationRules};

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("Missing configuration: {0}")]
  Missing(String),

  #[error("Invalid value for {var}: {value}")]
  Invalid { var: String, value: String },
}

impl Serialize for ConfigError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Store Selection
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
  /// Google spreadsheet
  Sheets,
  /// SQLite file in the app data dir
  Local,
  /// Bundled demo data, writes are simulated
  Demo,
}

impl FromStr for StoreBackend {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "sheets" | "google" => Ok(StoreBackend::Sheets),
      "local" | "sqlite" => Ok(StoreBackend::Local),
      "demo" => Ok(StoreBackend::Demo),
      other => Err(ConfigError::Invalid {
        var: "WORKOUT_STORE".into(),
        value: other.into(),
      }),
    }
  }
}

/// ---------------------------------------------------------------------------
/// App Config
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub backend: StoreBackend,
  pub sheets: Option<SheetsConfig>,
  pub rules: ValidationRules,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      backend: StoreBackend::Demo,
      sheets: None,
      rules: ValidationRules::default(),
    }
  }
}

fn var(name: &str) -> Option<String> {
  env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl AppConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    let sheets = sheets_from_env()?;

    let backend = match var("WORKOUT_STORE") {
      Some(value) => value.parse()?,
      None if sheets.is_some() => StoreBackend::Sheets,
      None => StoreBackend::Demo,
    };

    if backend == StoreBackend::Sheets && sheets.is_none() {
      return Err(ConfigError::Missing("GOOGLE_SHEET_ID".into()));
    }

    let mode = match var("CSV_VALIDATION") {
      Some(value) => value.parse::<ValidationMode>().map_err(|_| ConfigError::Invalid {
        var: "CSV_VALIDATION".into(),
        value,
      })?,
      None => ValidationMode::default(),
    };

    let roster = var("WORKOUT_ROSTER")
      .map(|list| {
        list
          .split(',')
          .map(|name| name.trim().to_string())
          .filter(|name| !name.is_empty())
          .collect::<Vec<_>>()
      })
      .filter(|names| !names.is_empty())
      .unwrap_or_else(default_roster);

    Ok(Self {
      backend,
      sheets,
      rules: ValidationRules::new(mode, roster),
    })
  }
}

/// Spreadsheet settings, `None` when no sheet id is set.
/// A sheet id without an access token is an error.
fn sheets_from_env() -> Result<Option<SheetsConfig>, ConfigError> {
  let Some(spreadsheet_id) = var("GOOGLE_SHEET_ID") else {
    return Ok(None);
  };
  let access_token = var("GOOGLE_ACCESS_TOKEN").ok_or_else(|| ConfigError::Missing("GOOGLE_ACCESS_TOKEN".into()))?;

  Ok(Some(SheetsConfig {
    spreadsheet_id,
    sheet_name: var("GOOGLE_SHEET_NAME").unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string()),
    access_token,
    api_base: var("GOOGLE_SHEETS_API_BASE").unwrap_or_else(|| SHEETS_API_BASE.to_string()),
  }))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  const ALL_VARS: [&str; 7] = [
    "WORKOUT_STORE",
    "GOOGLE_SHEET_ID",
    "GOOGLE_SHEET_NAME",
    "GOOGLE_ACCESS_TOKEN",
    "GOOGLE_SHEETS_API_BASE",
    "WORKOUT_ROSTER",
    "CSV_VALIDATION",
  ];

  fn with_env<F: FnOnce()>(set: &[(&str, &str)], f: F) {
    let vars: Vec<(&str, Option<&str>)> = ALL_VARS
      .iter()
      .map(|name| (*name, set.iter().find(|(k, _)| k == name).map(|(_, v)| *v)))
      .collect();
    temp_env::with_vars(vars, f);
  }

  #[test]
  #[serial]
  fn test_defaults_to_demo_without_sheet() {
    with_env(&[], || {
      let config = AppConfig::from_env().unwrap();
      assert_eq!(config.backend, StoreBackend::Demo);
      assert!(config.sheets.is_none());
      assert_eq!(config.rules, ValidationRules::default());
    });
  }

  #[test]
  #[serial]
  fn test_sheet_settings_select_sheets_backend() {
    with_env(&[("GOOGLE_SHEET_ID", "abc"), ("GOOGLE_ACCESS_TOKEN", "tok")], || {
      let config = AppConfig::from_env().unwrap();
      assert_eq!(config.backend, StoreBackend::Sheets);
      let sheets = config.sheets.unwrap();
      assert_eq!(sheets.sheet_name, "Workouts");
      assert_eq!(sheets.api_base, SHEETS_API_BASE);
    });
  }

  #[test]
  #[serial]
  fn test_sheet_id_without_token_is_missing_config() {
    with_env(&[("GOOGLE_SHEET_ID", "abc")], || {
      assert_eq!(
        AppConfig::from_env().unwrap_err(),
        ConfigError::Missing("GOOGLE_ACCESS_TOKEN".into())
      );
    });
  }

  #[test]
  #[serial]
  fn test_explicit_sheets_backend_requires_sheet() {
    with_env(&[("WORKOUT_STORE", "sheets")], || {
      assert_eq!(
        AppConfig::from_env().unwrap_err(),
        ConfigError::Missing("GOOGLE_SHEET_ID".into())
      );
    });
  }

  #[test]
  #[serial]
  fn test_local_backend_roster_and_lenient_mode() {
    with_env(
      &[
        ("WORKOUT_STORE", "Local"),
        ("WORKOUT_ROSTER", "Ann, Bea ,,Cy"),
        ("CSV_VALIDATION", "lenient"),
      ],
      || {
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.backend, StoreBackend::Local);
        assert_eq!(config.rules.roster, vec!["Ann", "Bea", "Cy"]);
        assert_eq!(config.rules.mode, ValidationMode::Lenient);
      },
    );
  }

  #[test]
  #[serial]
  fn test_invalid_values_are_reported() {
    with_env(&[("WORKOUT_STORE", "excel")], || {
      assert_eq!(
        AppConfig::from_env().unwrap_err().to_string(),
        "Invalid value for WORKOUT_STORE: excel"
      );
    });
    with_env(&[("CSV_VALIDATION", "loose")], || {
      assert!(matches!(AppConfig::from_env(), Err(ConfigError::Invalid { .. })));
    });
  }
}
