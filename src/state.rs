//! Application state: curriculum, persistence collaborators and the live sessions.
//!
//! This module owns:
//!   - the curriculum (built-in content plus config overrides)
//!   - the local bucket directory and namespaces
//!   - the optional remote submission store
//!   - sessions by profile id (one per student/browser profile)

use std::{collections::HashMap, path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::curriculum::Curriculum;
use crate::remote::{RestSubmissions, SubmissionStore};
use crate::session::{Session, SessionEnv};
use crate::store::{JsonFileStore, LocalStore, MemoryStore};
use crate::util::is_valid_profile_id;

#[derive(Clone)]
pub struct AppState {
    pub curriculum: Arc<Curriculum>,
    pub sessions: Arc<RwLock<HashMap<String, Arc<Session>>>>,
    pub remote: Option<Arc<dyn SubmissionStore>>,
    pub data_dir: PathBuf,
    pub namespace: String,
    pub user_namespace: String,
    pub ephemeral: bool,
    pub saved_reset: Duration,
}

impl AppState {
    /// Build state from env: load config, apply curriculum overrides, init the remote client.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Self {
        let cfg = AppConfig::from_env();
        let remote = RestSubmissions::from_env(&cfg.remote).map(|r| {
            info!(target: "deutsch_syntax", base_url = %r.base_url, table = %r.table, "Remote submissions enabled.");
            Arc::new(r) as Arc<dyn SubmissionStore>
        });
        if remote.is_none() {
            info!(target: "deutsch_syntax", "Remote submissions disabled (SUBMISSIONS_URL / SUBMISSIONS_API_KEY unset). Local saves only.");
        }
        Self::new(&cfg, remote)
    }

    pub fn new(cfg: &AppConfig, remote: Option<Arc<dyn SubmissionStore>>) -> Self {
        let curriculum = Curriculum::with_overrides(&cfg.curriculum);
        let fields: usize = curriculum.exercises.iter().map(|e| e.field_ids().len()).sum();
        info!(
            target: "lesson",
            exercises = curriculum.total(),
            fields,
            expected = curriculum.expected.len(),
            solutions = curriculum.solutions.len(),
            "Curriculum loaded"
        );
        Self {
            curriculum: Arc::new(curriculum),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            remote,
            data_dir: cfg.storage.data_dir.clone(),
            namespace: cfg.storage.namespace.clone(),
            user_namespace: cfg.storage.user_namespace.clone(),
            ephemeral: cfg.storage.ephemeral,
            saved_reset: cfg.remote.saved_reset(),
        }
    }

    fn bucket(&self, profile: &str, namespace: &str) -> Arc<dyn LocalStore> {
        if self.ephemeral {
            return Arc::new(MemoryStore::default());
        }
        let store = JsonFileStore::new(&self.data_dir, profile, namespace);
        debug!(target: "deutsch_syntax", %profile, path = %store.path().display(), "Local bucket bound");
        Arc::new(store)
    }

    fn session_env(&self, profile: &str) -> SessionEnv {
        SessionEnv {
            curriculum: self.curriculum.clone(),
            answers: self.bucket(profile, &self.namespace),
            user: self.bucket(profile, &self.user_namespace),
            remote: self.remote.clone(),
            saved_reset: self.saved_reset,
        }
    }

    /// Get or create the session for `profile` (a fresh UUID when absent).
    /// Returns None for profile ids that are not safe as file names.
    #[instrument(level = "info", skip(self))]
    pub async fn open_session(&self, profile: Option<&str>) -> Option<Arc<Session>> {
        let profile = match profile {
            Some(p) if is_valid_profile_id(p) => p.to_string(),
            Some(_) => return None,
            None => Uuid::new_v4().to_string(),
        };
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(profile.clone())
            .or_insert_with(|| {
                info!(target: "deutsch_syntax", %profile, "Session opened");
                Arc::new(Session::open(profile.clone(), self.session_env(&profile)))
            })
            .clone();
        Some(session)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_session(&self, profile: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(profile).cloned()
    }
}
