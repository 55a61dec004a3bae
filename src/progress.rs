//! Completion tracking. Independent of field contents and save status.

use std::collections::BTreeSet;

use serde::Serialize;

/// Exercise ids marked done.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompletionMap {
  done: BTreeSet<String>,
}

impl CompletionMap {
  /// Flip the flag for `exercise_id`; returns the new value.
  pub fn toggle(&mut self, exercise_id: &str) -> bool {
    if self.done.remove(exercise_id) {
      false
    } else {
      self.done.insert(exercise_id.to_string());
      true
    }
  }

  pub fn len(&self) -> usize {
    self.done.len()
  }

  pub fn ids(&self) -> impl Iterator<Item = &str> {
    self.done.iter().map(String::as_str)
  }
}

/// `round(100 * completed / total)`; 0 when there is nothing to complete.
pub fn completion_percent(completed: usize, total: usize) -> u8 {
  if total == 0 {
    return 0;
  }
  let pct = (100.0 * completed as f64 / total as f64).round();
  pct.clamp(0.0, 100.0) as u8
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
  pub completed: Vec<String>,
  pub completed_count: usize,
  pub total: usize,
  pub percent: u8,
}

impl ProgressView {
  pub fn of(map: &CompletionMap, total: usize) -> Self {
    Self {
      completed: map.ids().map(str::to_string).collect(),
      completed_count: map.len(),
      total,
      percent: completion_percent(map.len(), total),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn percent_rounds() {
    assert_eq!(completion_percent(3, 6), 50);
    assert_eq!(completion_percent(1, 6), 17);
    assert_eq!(completion_percent(0, 6), 0);
    assert_eq!(completion_percent(6, 6), 100);
    assert_eq!(completion_percent(1, 3), 33);
    assert_eq!(completion_percent(2, 3), 67);
    assert_eq!(completion_percent(0, 0), 0);
  }

  #[test]
  fn toggle_flips() {
    let mut m = CompletionMap::default();
    assert!(m.toggle("act1"));
    assert!(m.toggle("act3"));
    assert_eq!(m.ids().collect::<Vec<_>>(), vec!["act1", "act3"]);
    assert!(!m.toggle("act1"));
    assert_eq!(m.len(), 1);

    let v = ProgressView::of(&m, 6);
    assert_eq!(v.completed, vec!["act3".to_string()]);
    assert_eq!(v.percent, 17);
  }
}
