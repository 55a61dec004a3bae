//! Local key-value buckets: the server-side stand-in for the browser's local storage.
//!
//! One bucket is one JSON object in one file (`<dir>/<profile>.<namespace>.json`), so values
//! survive restarts. Keys are field ids, values are raw answer text.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, instrument};

use crate::error::StoreError;

/// Synchronous get/set/clear over a single namespaced bucket.
pub trait LocalStore: Send + Sync {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
  fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
  fn clear(&self) -> Result<(), StoreError>;
}

/// Bucket backed by a JSON file.
pub struct JsonFileStore {
  path: PathBuf,
  // serializes read-modify-write cycles within this process
  lock: Mutex<()>,
}

impl JsonFileStore {
  pub fn new(dir: &Path, profile: &str, namespace: &str) -> Self {
    Self { path: dir.join(format!("{profile}.{namespace}.json")), lock: Mutex::new(()) }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn io_err(&self, source: std::io::Error) -> StoreError {
    StoreError::Io { path: self.path.display().to_string(), source }
  }

  fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
    match std::fs::read_to_string(&self.path) {
      Ok(s) if s.trim().is_empty() => Ok(BTreeMap::new()),
      Ok(s) => serde_json::from_str(&s)
        .map_err(|source| StoreError::Corrupt { path: self.path.display().to_string(), source }),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
      Err(e) => Err(self.io_err(e)),
    }
  }

  fn write_all(&self, data: &BTreeMap<String, String>) -> Result<(), StoreError> {
    if let Some(parent) = self.path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
    }
    let body = serde_json::to_string_pretty(data)
      .map_err(|source| StoreError::Corrupt { path: self.path.display().to_string(), source })?;
    let tmp = self.path.with_extension("json.tmp");
    std::fs::write(&tmp, body).map_err(|e| self.io_err(e))?;
    std::fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))
  }
}

impl LocalStore for JsonFileStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
    Ok(self.read_all()?.remove(key))
  }

  #[instrument(level = "debug", skip(self, value), fields(path = %self.path.display(), value_len = value.len()))]
  fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
    let mut data = self.read_all()?;
    data.insert(key.to_string(), value.to_string());
    self.write_all(&data)?;
    debug!(target: "deutsch_syntax", %key, "Local bucket updated");
    Ok(())
  }

  fn clear(&self) -> Result<(), StoreError> {
    let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
    match std::fs::remove_file(&self.path) {
      Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(self.io_err(e)),
      _ => Ok(()),
    }
  }
}

/// In-process bucket for `storage.ephemeral = true`; contents die with the process.
#[derive(Default)]
pub struct MemoryStore {
  data: Mutex<HashMap<String, String>>,
}

impl LocalStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    Ok(self.data.lock().unwrap_or_else(|p| p.into_inner()).get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    self.data.lock().unwrap_or_else(|p| p.into_inner()).insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn clear(&self) -> Result<(), StoreError> {
    self.data.lock().unwrap_or_else(|p| p.into_inner()).clear();
    Ok(())
  }
}
