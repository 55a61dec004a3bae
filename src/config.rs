//! Service configuration: optional TOML file (CONFIG_PATH) plus a few env overrides.
//!
//! ```toml
//! [storage]
//! data_dir = "./data"
//! namespace = "german_learning_local_v1"
//! ephemeral = false
//!
//! [remote]
//! table = "submissions"
//! saved_reset_ms = 2000
//! timeout_secs = 20
//!
//! [curriculum.expected]
//! act1_q0 = ["münchen", "aus münchen"]
//!
//! [curriculum.solutions]
//! act5 = "Hallo! Ich bin Leonard."
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub storage: StorageCfg,
  #[serde(default)]
  pub remote: RemoteCfg,
  #[serde(default)]
  pub curriculum: CurriculumCfg,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StorageCfg {
  pub data_dir: PathBuf,
  /// Bucket for answers.
  pub namespace: String,
  /// Bucket for the student's name and email.
  pub user_namespace: String,
  /// Keep buckets in process memory only (nothing written under `data_dir`).
  pub ephemeral: bool,
}

impl Default for StorageCfg {
  fn default() -> Self {
    Self {
      data_dir: PathBuf::from("./data"),
      namespace: "german_learning_local_v1".into(),
      user_namespace: "german_learning_user".into(),
      ephemeral: false,
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RemoteCfg {
  pub table: String,
  /// How long a field shows "saved" before going back to idle.
  pub saved_reset_ms: u64,
  pub timeout_secs: u64,
}

impl Default for RemoteCfg {
  fn default() -> Self {
    Self { table: "submissions".into(), saved_reset_ms: 2000, timeout_secs: 20 }
  }
}

impl RemoteCfg {
  pub fn saved_reset(&self) -> Duration {
    Duration::from_millis(self.saved_reset_ms)
  }
}

/// Content overrides keyed by field id.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct CurriculumCfg {
  #[serde(default)]
  pub expected: HashMap<String, Vec<String>>,
  #[serde(default)]
  pub solutions: HashMap<String, String>,
}

impl AppConfig {
  /// CONFIG_PATH (if any) then DATA_DIR. Never fails: bad files are logged and defaults kept.
  pub fn from_env() -> Self {
    let mut cfg = load_config_from_env().unwrap_or_default();
    if let Ok(dir) = std::env::var("DATA_DIR") {
      if !dir.trim().is_empty() {
        cfg.storage.data_dir = PathBuf::from(dir);
      }
    }
    cfg
  }
}

/// Attempt to load `AppConfig` from CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "deutsch_syntax", %path, "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "deutsch_syntax", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "deutsch_syntax", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str(s)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_file_gives_defaults() {
    let cfg = parse_config("").unwrap();
    assert_eq!(cfg.storage.namespace, "german_learning_local_v1");
    assert_eq!(cfg.remote.saved_reset(), Duration::from_secs(2));
    assert_eq!(cfg.remote.table, "submissions");
    assert!(cfg.curriculum.expected.is_empty());
  }

  #[test]
  fn partial_sections_keep_remaining_defaults() {
    let cfg = parse_config(
      r#"
      [storage]
      data_dir = "/var/lib/deutsch"

      [remote]
      saved_reset_ms = 500

      [curriculum.expected]
      act1_q0 = ["hamburg"]

      [curriculum.solutions]
      act5 = "Hallo! Ich bin Leonard."
      "#,
    )
    .unwrap();
    assert_eq!(cfg.storage.data_dir, PathBuf::from("/var/lib/deutsch"));
    assert_eq!(cfg.storage.user_namespace, "german_learning_user");
    assert!(!cfg.storage.ephemeral);
    assert_eq!(cfg.remote.saved_reset_ms, 500);
    assert_eq!(cfg.remote.timeout_secs, 20);
    assert_eq!(cfg.curriculum.expected["act1_q0"], vec!["hamburg".to_string()]);
    assert_eq!(cfg.curriculum.solutions["act5"], "Hallo! Ich bin Leonard.");
  }

  #[test]
  fn malformed_toml_is_an_error() {
    assert!(parse_config("[remote\nsaved_reset_ms = 1").is_err());
    assert!(parse_config("[remote]\nsaved_reset_ms = \"soon\"").is_err());
  }
}
