//! Domain models: exercises and their answer fields, per-field state, and the analysis record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of sub-item inside an exercise. Decides the suffix of the field id.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
  Question,
  Task,
  Verb,
}

impl ItemKind {
  fn prefix(self) -> &'static str {
    match self {
      ItemKind::Question => "q",
      ItemKind::Task => "task",
      ItemKind::Verb => "verb",
    }
  }
}

/// Addressable answer slot: exercise id plus an optional sub-item.
/// Canonical text form is `act1_q0`, `act2_task1`, `act3_verb2` or just `act4`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId {
  pub exercise: String,
  pub item: Option<(ItemKind, usize)>,
}

impl FieldId {
  pub fn whole(exercise: &str) -> Self {
    Self { exercise: exercise.to_string(), item: None }
  }

  pub fn item(exercise: &str, kind: ItemKind, index: usize) -> Self {
    Self { exercise: exercise.to_string(), item: Some((kind, index)) }
  }
}

impl fmt::Display for FieldId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.item {
      Some((kind, idx)) => write!(f, "{}_{}{}", self.exercise, kind.prefix(), idx),
      None => f.write_str(&self.exercise),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFieldIdError(pub String);

impl fmt::Display for ParseFieldIdError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "malformed field id: {:?}", self.0)
  }
}

impl std::error::Error for ParseFieldIdError {}

impl FromStr for FieldId {
  type Err = ParseFieldIdError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let bad = || ParseFieldIdError(s.to_string());
    let valid_exercise = |e: &str| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric());

    let Some((exercise, suffix)) = s.split_once('_') else {
      return if valid_exercise(s) { Ok(FieldId::whole(s)) } else { Err(bad()) };
    };
    if !valid_exercise(exercise) {
      return Err(bad());
    }
    for kind in [ItemKind::Task, ItemKind::Verb, ItemKind::Question] {
      if let Some(digits) = suffix.strip_prefix(kind.prefix()) {
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
          let idx = digits.parse::<usize>().map_err(|_| bad())?;
          return Ok(FieldId::item(exercise, kind, idx));
        }
      }
    }
    Err(bad())
  }
}

impl Serialize for FieldId {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for FieldId {
  fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}

/// One prompt inside an exercise (reading question, task, or verb drill).
#[derive(Clone, Debug, Serialize)]
pub struct ExerciseItem {
  pub prompt: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub hint: Option<String>,
}

/// Ordered sub-items of an exercise. Free-text exercises own a single field keyed by the exercise id.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum ExerciseItems {
  Questions(Vec<ExerciseItem>),
  Tasks(Vec<ExerciseItem>),
  Verbs(Vec<ExerciseItem>),
  FreeText,
}

/// Static exercise definition. Built at start, never mutated.
#[derive(Clone, Debug, Serialize)]
pub struct Exercise {
  pub id: String,
  pub title: String,
  pub difficulty: String,
  pub items: ExerciseItems,
}

impl Exercise {
  /// Field ids owned by this exercise, in display order.
  pub fn field_ids(&self) -> Vec<FieldId> {
    let indexed = |kind: ItemKind, items: &[ExerciseItem]| {
      (0..items.len()).map(|i| FieldId::item(&self.id, kind, i)).collect()
    };
    match &self.items {
      ExerciseItems::Questions(v) => indexed(ItemKind::Question, v),
      ExerciseItems::Tasks(v) => indexed(ItemKind::Task, v),
      ExerciseItems::Verbs(v) => indexed(ItemKind::Verb, v),
      ExerciseItems::FreeText => vec![FieldId::whole(&self.id)],
    }
  }

  pub fn item(&self, field: &FieldId) -> Option<&ExerciseItem> {
    if field.exercise != self.id {
      return None;
    }
    match (&self.items, field.item) {
      (ExerciseItems::Questions(v), Some((ItemKind::Question, i)))
      | (ExerciseItems::Tasks(v), Some((ItemKind::Task, i)))
      | (ExerciseItems::Verbs(v), Some((ItemKind::Verb, i))) => v.get(i),
      _ => None,
    }
  }

  pub fn owns(&self, field: &FieldId) -> bool {
    match (&self.items, field.item) {
      (ExerciseItems::FreeText, None) => field.exercise == self.id,
      _ => self.item(field).is_some(),
    }
  }
}

/// Remote save status of a field.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
  #[default]
  Idle,
  Saving,
  Saved,
  Error,
}

/// Editing phase of a field, independent of its save status.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  #[default]
  Empty,
  Draft,
  Reviewed,
}

/// Combined lifecycle state: a non-idle save status wins over the editing phase.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldState {
  Empty,
  Draft,
  Reviewed,
  Saving,
  Saved,
  Error,
}

/// Per-field record held by the session registry. `Default` is the empty/idle record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Field {
  pub text: String,
  pub feedback: Option<String>,
  pub solution_visible: bool,
  pub hint_visible: bool,
  pub phase: Phase,
  pub status: SaveStatus,
  /// Bumped on every remote save attempt; the deferred "saved" revert only fires for its own attempt.
  pub save_seq: u64,
}

impl Field {
  pub fn state(&self) -> FieldState {
    match (self.status, self.phase) {
      (SaveStatus::Saving, _) => FieldState::Saving,
      (SaveStatus::Saved, _) => FieldState::Saved,
      (SaveStatus::Error, _) => FieldState::Error,
      (SaveStatus::Idle, Phase::Empty) => FieldState::Empty,
      (SaveStatus::Idle, Phase::Draft) => FieldState::Draft,
      (SaveStatus::Idle, Phase::Reviewed) => FieldState::Reviewed,
    }
  }
}

/// Rough proficiency bucket derived from the score.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Level {
  #[serde(rename = "Básico")]
  Basico,
  #[serde(rename = "Intermedio")]
  Intermedio,
  #[serde(rename = "Avanzado")]
  Avanzado,
}

impl Level {
  pub fn from_score(score: u8) -> Self {
    if score >= 75 {
      Level::Avanzado
    } else if score >= 45 {
      Level::Intermedio
    } else {
      Level::Basico
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Level::Basico => "Básico",
      Level::Intermedio => "Intermedio",
      Level::Avanzado => "Avanzado",
    }
  }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// Result of the lexical grammar heuristic. Derived from text, never stored.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
  pub word_count: usize,
  pub capitalized_sentence: bool,
  pub ends_with_punctuation: bool,
  pub pronoun_present: bool,
  pub verb_present: bool,
  pub verb_second_pos: bool,
  pub verbs_found: Vec<&'static str>,
  pub suggestions: Vec<&'static str>,
  pub score: u8,
  pub level: Level,
}

impl Default for Analysis {
  fn default() -> Self {
    Self {
      word_count: 0,
      capitalized_sentence: false,
      ends_with_punctuation: false,
      pronoun_present: false,
      verb_present: false,
      verb_second_pos: false,
      verbs_found: Vec::new(),
      suggestions: Vec::new(),
      score: 0,
      level: Level::Basico,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn field_id_text_form_round_trips() {
    for s in ["act1_q0", "act2_task1", "act3_verb3", "act4"] {
      let id: FieldId = s.parse().unwrap();
      assert_eq!(id.to_string(), s);
    }
    let id: FieldId = "act1_q5".parse().unwrap();
    assert_eq!(id, FieldId::item("act1", ItemKind::Question, 5));
  }

  #[test]
  fn field_id_rejects_garbage() {
    for s in ["", "act1_", "act1_x3", "act1_q", "act1_q-1", "act 1", "_q0", "act1_qa"] {
      assert!(s.parse::<FieldId>().is_err(), "{s} should not parse");
    }
  }

  #[test]
  fn save_status_takes_precedence_in_combined_state() {
    let mut f = Field { phase: Phase::Draft, ..Field::default() };
    assert_eq!(f.state(), FieldState::Draft);
    f.status = SaveStatus::Saving;
    assert_eq!(f.state(), FieldState::Saving);
    assert_eq!(Field::default().state(), FieldState::Empty);
  }

  #[test]
  fn level_thresholds() {
    assert_eq!(Level::from_score(0), Level::Basico);
    assert_eq!(Level::from_score(44), Level::Basico);
    assert_eq!(Level::from_score(45), Level::Intermedio);
    assert_eq!(Level::from_score(74), Level::Intermedio);
    assert_eq!(Level::from_score(75), Level::Avanzado);
    assert_eq!(Level::from_score(100), Level::Avanzado);
  }
}
