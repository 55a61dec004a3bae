//! Per-student session: the field registry, identity and completion map behind one lock.
//!
//! All mutation goes through the methods below; views are pure projections of the state.
//! The remote save is the only operation that awaits I/O, and it never holds the lock
//! while doing so, so other fields stay editable (and this field too: the save works on the
//! text captured when it was requested).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::curriculum::{Curriculum, NO_FEEDBACK_YET};
use crate::domain::{Field, FieldId, FieldState, Phase, SaveStatus};
use crate::error::{RemoteError, SaveError};
use crate::feedback::compose;
use crate::identity::StudentIdentity;
use crate::progress::{CompletionMap, ProgressView};
use crate::remote::{Submission, SubmissionStore};
use crate::store::LocalStore;

pub const CLEARED_NOTICE: &str = "Respuesta borrada.";
pub const SAVED_LOCAL_NOTICE: &str = "✅ Respuesta guardada localmente.";
pub const SAVED_REMOTE_NOTICE: &str = "✅ Respuesta guardada en el servidor.";
pub const IDENTITY_SAVED_NOTICE: &str = "✅ Datos guardados. ¡Ya puedes empezar con las actividades!";

const USER_NAME_KEY: &str = "fullName";
const USER_EMAIL_KEY: &str = "email";

static EMPTY_FIELD: Field = Field {
  text: String::new(),
  feedback: None,
  solution_visible: false,
  hint_visible: false,
  phase: Phase::Empty,
  status: SaveStatus::Idle,
  save_seq: 0,
};

/// Field id -> record. Lookups of untouched fields yield the empty/idle record.
#[derive(Clone, Debug, Default)]
pub struct FieldRegistry {
  fields: BTreeMap<FieldId, Field>,
}

impl FieldRegistry {
  pub fn get(&self, id: &FieldId) -> &Field {
    self.fields.get(id).unwrap_or(&EMPTY_FIELD)
  }

  pub fn get_mut(&mut self, id: &FieldId) -> &mut Field {
    self.fields.entry(id.clone()).or_default()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&FieldId, &Field)> {
    self.fields.iter()
  }
}

#[derive(Default)]
struct SessionData {
  fields: FieldRegistry,
  identity: StudentIdentity,
  completion: CompletionMap,
}

/// Collaborators a session is wired to.
#[derive(Clone)]
pub struct SessionEnv {
  pub curriculum: Arc<Curriculum>,
  /// Answer bucket (keys are field ids).
  pub answers: Arc<dyn LocalStore>,
  /// Bucket remembering the student's name and email.
  pub user: Arc<dyn LocalStore>,
  pub remote: Option<Arc<dyn SubmissionStore>>,
  pub saved_reset: Duration,
}

pub struct Session {
  pub profile: String,
  env: SessionEnv,
  inner: RwLock<SessionData>,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
  pub id: FieldId,
  pub text: String,
  pub feedback: String,
  pub state: FieldState,
  pub status: SaveStatus,
  pub solution_visible: bool,
  pub hint_visible: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub solution: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub hint: Option<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityView {
  pub full_name: String,
  pub email: String,
  pub name_valid: bool,
  pub email_valid: bool,
}

impl From<&StudentIdentity> for IdentityView {
  fn from(id: &StudentIdentity) -> Self {
    Self {
      full_name: id.full_name.clone(),
      email: id.email.clone(),
      name_valid: id.name_valid(),
      email_valid: id.email_valid(),
    }
  }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
  pub profile: String,
  pub identity: IdentityView,
  pub progress: ProgressView,
  pub remote_enabled: bool,
  pub fields: Vec<FieldView>,
}

impl Session {
  /// New session; restores a previously saved identity from the user bucket.
  pub fn open(profile: impl Into<String>, env: SessionEnv) -> Self {
    let profile = profile.into();
    let identity = match (env.user.get(USER_NAME_KEY), env.user.get(USER_EMAIL_KEY)) {
      (Ok(name), Ok(email)) => StudentIdentity::new(name.unwrap_or_default(), email.unwrap_or_default()),
      (Err(e), _) | (_, Err(e)) => {
        warn!(target: "deutsch_syntax", %profile, error = %e, "Could not restore saved identity");
        StudentIdentity::default()
      }
    };
    Self {
      profile,
      env,
      inner: RwLock::new(SessionData { identity, ..SessionData::default() }),
    }
  }

  pub fn remote_enabled(&self) -> bool {
    self.env.remote.is_some()
  }

  pub fn curriculum(&self) -> &Curriculum {
    &self.env.curriculum
  }

  fn project(&self, id: &FieldId, f: &Field) -> FieldView {
    let solution = if f.solution_visible { self.env.curriculum.solution(id).map(str::to_string) } else { None };
    let hint = if f.hint_visible { self.env.curriculum.hint(id).map(str::to_string) } else { None };
    FieldView {
      id: id.clone(),
      text: f.text.clone(),
      feedback: f.feedback.clone().unwrap_or_else(|| NO_FEEDBACK_YET.to_string()),
      state: f.state(),
      status: f.status,
      solution_visible: f.solution_visible,
      hint_visible: f.hint_visible,
      solution,
      hint,
    }
  }

  fn feedback_for(&self, id: &FieldId, text: &str) -> String {
    compose(text, &id.to_string(), &self.env.curriculum.expected)
  }

  pub async fn field(&self, id: &FieldId) -> FieldView {
    let data = self.inner.read().await;
    self.project(id, data.fields.get(id))
  }

  /// Store new text and recompute feedback right away.
  #[instrument(level = "debug", skip(self, text), fields(profile = %self.profile, field = %id, text_len = text.len()))]
  pub async fn update(&self, id: &FieldId, text: &str) -> FieldView {
    let feedback = self.feedback_for(id, text);
    let mut data = self.inner.write().await;
    let f = data.fields.get_mut(id);
    f.text = text.to_string();
    f.feedback = Some(feedback);
    f.phase = if text.trim().is_empty() { Phase::Empty } else { Phase::Draft };
    self.project(id, f)
  }

  /// Re-run analysis on the current text. Idempotent.
  #[instrument(level = "debug", skip(self), fields(profile = %self.profile, field = %id))]
  pub async fn review(&self, id: &FieldId) -> FieldView {
    let mut data = self.inner.write().await;
    let feedback = self.feedback_for(id, &data.fields.get(id).text);
    let f = data.fields.get_mut(id);
    f.feedback = Some(feedback);
    if f.phase != Phase::Empty {
      f.phase = Phase::Reviewed;
    }
    debug!(target: "lesson", field = %id, "Answer reviewed");
    self.project(id, f)
  }

  pub async fn toggle_solution(&self, id: &FieldId) -> FieldView {
    let mut data = self.inner.write().await;
    let f = data.fields.get_mut(id);
    f.solution_visible = !f.solution_visible;
    self.project(id, f)
  }

  pub async fn toggle_hint(&self, id: &FieldId) -> FieldView {
    let mut data = self.inner.write().await;
    let f = data.fields.get_mut(id);
    f.hint_visible = !f.hint_visible;
    self.project(id, f)
  }

  /// Empty the text and show the cleared notice. Save status is left alone.
  #[instrument(level = "debug", skip(self), fields(profile = %self.profile, field = %id))]
  pub async fn clear(&self, id: &FieldId) -> FieldView {
    let mut data = self.inner.write().await;
    let f = data.fields.get_mut(id);
    f.text.clear();
    f.feedback = Some(CLEARED_NOTICE.to_string());
    f.phase = Phase::Empty;
    self.project(id, f)
  }

  /// Write the current text into the local answer bucket. No identity required.
  #[instrument(level = "info", skip(self), fields(profile = %self.profile, field = %id))]
  pub async fn save_local(&self, id: &FieldId) -> Result<FieldView, SaveError> {
    let data = self.inner.read().await;
    let f = data.fields.get(id);
    self.env.answers.set(&id.to_string(), &f.text).map_err(|e| {
      error!(target: "deutsch_syntax", field = %id, error = %e, "Local save failed");
      SaveError::from(e)
    })?;
    info!(target: "lesson", field = %id, text_len = f.text.len(), "Answer saved locally");
    Ok(self.project(id, f))
  }

  /// Restore the locally stored text (empty if none) through the regular update path.
  #[instrument(level = "info", skip(self), fields(profile = %self.profile, field = %id))]
  pub async fn load_local(&self, id: &FieldId) -> Result<FieldView, SaveError> {
    let stored = self.env.answers.get(&id.to_string())?.unwrap_or_default();
    Ok(self.update(id, &stored).await)
  }

  /// Send the field's current text to the submission store.
  ///
  /// Preconditions (checked in this order, no state change when they fail): valid identity,
  /// configured remote store, non-blank text. One attempt, no retry. On success the status
  /// goes back to idle after `saved_reset`, unless something newer happened to it meanwhile.
  ///
  /// The insert and the status write-back run on their own task, so a caller that goes away
  /// mid-save (closed HTTP request, dropped socket) still leaves the field `saved` or `error`.
  #[instrument(level = "info", skip(self), fields(profile = %self.profile, field = %id))]
  pub async fn save_remote(self: &Arc<Self>, id: &FieldId) -> Result<FieldView, SaveError> {
    let (remote, record, seq) = {
      let mut data = self.inner.write().await;
      if !data.identity.is_valid() {
        return Err(SaveError::InvalidIdentity);
      }
      let Some(remote) = self.env.remote.clone() else {
        return Err(SaveError::RemoteNotConfigured);
      };
      let (full_name, email) = data.identity.normalized();
      let f = data.fields.get_mut(id);
      if f.text.trim().is_empty() {
        return Err(SaveError::EmptyContent);
      }
      f.status = SaveStatus::Saving;
      f.save_seq += 1;
      let record = Submission {
        full_name,
        email,
        activity_id: id.exercise.clone(),
        field_id: id.to_string(),
        content: f.text.clone(),
      };
      (remote, record, f.save_seq)
    };

    let session = Arc::clone(self);
    let field = id.clone();
    let task = tokio::spawn(async move {
      let outcome = remote.insert(&record).await;
      session.finish_remote_save(&field, seq, outcome).await
    });
    task.await.map_err(|e| {
      error!(target: "lesson", field = %id, seq, error = %e, "Remote save task did not complete");
      SaveError::Remote(RemoteError::Network(e.to_string()))
    })?
  }

  async fn finish_remote_save(
    self: &Arc<Self>,
    id: &FieldId,
    seq: u64,
    outcome: Result<(), RemoteError>,
  ) -> Result<FieldView, SaveError> {
    let mut data = self.inner.write().await;
    let f = data.fields.get_mut(id);
    match outcome {
      Ok(()) => {
        f.status = SaveStatus::Saved;
        info!(target: "lesson", field = %id, seq, "Answer saved remotely");
        self.schedule_saved_reset(id.clone(), seq);
        Ok(self.project(id, f))
      }
      Err(e) => {
        f.status = SaveStatus::Error;
        error!(target: "lesson", field = %id, seq, error = %e, "Remote save failed");
        Err(SaveError::Remote(e))
      }
    }
  }

  fn schedule_saved_reset(self: &Arc<Self>, id: FieldId, seq: u64) {
    let session = Arc::clone(self);
    let delay = self.env.saved_reset;
    tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      let mut data = session.inner.write().await;
      let f = data.fields.get_mut(&id);
      if f.status == SaveStatus::Saved && f.save_seq == seq {
        f.status = SaveStatus::Idle;
        debug!(target: "lesson", field = %id, seq, "Saved status reset");
      }
    });
  }

  pub async fn identity(&self) -> IdentityView {
    IdentityView::from(&self.inner.read().await.identity)
  }

  pub async fn set_identity(&self, full_name: &str, email: &str) -> IdentityView {
    let mut data = self.inner.write().await;
    data.identity = StudentIdentity::new(full_name, email);
    IdentityView::from(&data.identity)
  }

  /// Remember name and email in the user bucket. Only allowed once both are valid.
  #[instrument(level = "info", skip(self), fields(profile = %self.profile))]
  pub async fn save_identity(&self) -> Result<IdentityView, SaveError> {
    let data = self.inner.read().await;
    if !data.identity.is_valid() {
      return Err(SaveError::InvalidIdentity);
    }
    self.env.user.set(USER_NAME_KEY, &data.identity.full_name)?;
    self.env.user.set(USER_EMAIL_KEY, &data.identity.email)?;
    info!(target: "deutsch_syntax", profile = %self.profile, "Student identity saved locally");
    Ok(IdentityView::from(&data.identity))
  }

  /// Flip completion for an exercise. Unknown exercise ids are ignored.
  pub async fn toggle_complete(&self, exercise_id: &str) -> ProgressView {
    let mut data = self.inner.write().await;
    if self.env.curriculum.exercise(exercise_id).is_some() {
      let done = data.completion.toggle(exercise_id);
      info!(target: "lesson", exercise = %exercise_id, done, "Completion toggled");
    } else {
      warn!(target: "lesson", exercise = %exercise_id, "Completion toggle for unknown exercise ignored");
    }
    ProgressView::of(&data.completion, self.env.curriculum.total())
  }

  pub async fn progress(&self) -> ProgressView {
    ProgressView::of(&self.inner.read().await.completion, self.env.curriculum.total())
  }

  pub async fn snapshot(&self) -> SessionView {
    let data = self.inner.read().await;
    SessionView {
      profile: self.profile.clone(),
      identity: IdentityView::from(&data.identity),
      progress: ProgressView::of(&data.completion, self.env.curriculum.total()),
      remote_enabled: self.remote_enabled(),
      fields: data.fields.iter().map(|(id, f)| self.project(id, f)).collect(),
    }
  }
}
