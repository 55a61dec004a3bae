//! Human-facing feedback built on top of `analyze`, plus loose matching against expected answers.

use std::collections::HashMap;

use crate::analyzer::analyze;

/// Minimum token overlap for a "similar" verdict.
pub const SIMILARITY_THRESHOLD: f64 = 0.6;

const STRIPPED_PUNCT: [char; 4] = ['.', ',', '!', '?'];

/// Compose multi-line feedback for `text` typed into `field_id`.
/// Pure: depends only on its three inputs.
pub fn compose(text: &str, field_id: &str, expected: &HashMap<String, Vec<String>>) -> String {
  let a = analyze(text);

  let mut fb = format!("🔤 Palabras: {}. Nivel estimado: {} ({}%).", a.word_count, a.level, a.score);
  if a.verbs_found.is_empty() {
    fb.push_str(" ❌ No detecté verbos conocidos.");
  } else {
    let shown: Vec<&str> = a.verbs_found.iter().take(5).copied().collect();
    fb.push_str(&format!(" ✓ Verbo(s) detectado(s): {}.", shown.join(", ")));
  }
  if a.verb_second_pos {
    fb.push_str(" ✅ Verbo en 2ª posición (V2) detectado.");
  } else if a.word_count >= 3 {
    fb.push_str(" ⚠️ No parece haber verbo en 2ª posición (V2).");
  }
  if a.pronoun_present {
    fb.push_str(" ✓ Pronombre personal detectado.");
  }
  if !a.capitalized_sentence {
    fb.push_str(" ⚠️ Considera iniciar con mayúscula.");
  }
  if !a.ends_with_punctuation {
    fb.push_str(" ℹ️ Puedes añadir puntuación final.");
  }
  if !a.suggestions.is_empty() {
    fb.push_str("\nSugerencias: ");
    fb.push_str(&a.suggestions.join(" "));
  }

  if let Some(answers) = expected.get(field_id) {
    fb.push('\n');
    fb.push_str(&match_expected(text, answers).to_string());
  }
  fb
}

/// Outcome of comparing an answer against the expected keyword set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExpectedMatch {
  Direct,
  /// Best token-overlap fraction, at or above the threshold.
  Similar(f64),
  NoMatch,
}

impl std::fmt::Display for ExpectedMatch {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ExpectedMatch::Direct => f.write_str("✅ Coincide con la respuesta esperada."),
      ExpectedMatch::Similar(ratio) => write!(
        f,
        "✅ Similar a la respuesta esperada ({}% tokens coincidentes).",
        (ratio * 100.0).round() as u32
      ),
      ExpectedMatch::NoMatch => f.write_str(
        "❌ No coincide con la respuesta esperada. Usa \"Mostrar solución\" si quieres ver el modelo.",
      ),
    }
  }
}

pub fn match_expected(text: &str, answers: &[String]) -> ExpectedMatch {
  let lower = text.to_lowercase();
  if answers.iter().any(|e| lower.contains(e.as_str())) {
    return ExpectedMatch::Direct;
  }

  let tokens = bare_tokens(&lower);
  let best = answers
    .iter()
    .map(|e| {
      let etoks = bare_tokens(e);
      let overlap = etoks.iter().filter(|t| tokens.contains(t)).count();
      overlap as f64 / etoks.len().max(tokens.len()).max(1) as f64
    })
    .fold(0.0_f64, f64::max);

  if best >= SIMILARITY_THRESHOLD {
    ExpectedMatch::Similar(best)
  } else {
    ExpectedMatch::NoMatch
  }
}

fn bare_tokens(s: &str) -> Vec<String> {
  s.replace(STRIPPED_PUNCT, "")
    .split_whitespace()
    .map(str::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::curriculum::Curriculum;

  fn expected() -> HashMap<String, Vec<String>> {
    Curriculum::default().expected
  }

  #[test]
  fn summary_line_comes_first() {
    let fb = compose("Ich komme aus Berlin.", "act6", &expected());
    assert!(fb.starts_with("🔤 Palabras: 4. Nivel estimado: Avanzado (95%)."));
    assert!(fb.contains("✓ Verbo(s) detectado(s): komme."));
    assert!(fb.contains("✅ Verbo en 2ª posición (V2) detectado."));
    assert!(fb.contains("✓ Pronombre personal detectado."));
    assert!(!fb.contains("Sugerencias"));
    // no expected answers registered for act6
    assert_eq!(fb.lines().count(), 1);
  }

  #[test]
  fn direct_keyword_match() {
    let fb = compose("Sebastian kommt aus München", "act1_q0", &expected());
    assert!(fb.ends_with("✅ Coincide con la respuesta esperada."), "{fb}");
  }

  #[test]
  fn partial_overlap_below_threshold_is_no_match() {
    let fb = compose("Er wohnt in Bayern", "act1_q0", &expected());
    assert!(fb.contains("❌ No coincide con la respuesta esperada."), "{fb}");
    assert!(fb.contains("Mostrar solución"));
  }

  #[test]
  fn token_overlap_counts_against_the_longer_side() {
    let answers = vec!["annas vater ist österreicher".to_string()];
    // 3 of 4 expected tokens, input has 4 tokens
    assert_eq!(match_expected("Annas Vater ist Schweizer", &answers), ExpectedMatch::Similar(0.75));
    // same overlap, but the input is longer: 3 / 6
    assert_eq!(match_expected("Annas Vater ist ein guter Schweizer", &answers), ExpectedMatch::NoMatch);
    let fb = ExpectedMatch::Similar(0.75).to_string();
    assert!(fb.contains("(75% tokens coincidentes)"));
  }

  #[test]
  fn punctuation_is_ignored_for_overlap() {
    let answers = vec!["er hat einen papagei".to_string()];
    assert_eq!(match_expected("Er, hat! einen? Hund.", &answers), ExpectedMatch::Similar(0.75));
  }

  #[test]
  fn lists_at_most_five_verbs() {
    let fb = compose("ich bin, du bist, er ist, wir sind, ihr seid, sie haben", "act6", &expected());
    assert!(fb.contains("Verbo(s) detectado(s): bin, bist, ist, sind, seid."), "{fb}");
  }

  #[test]
  fn empty_text_reports_no_verbs_and_the_empty_suggestion() {
    let fb = compose("   ", "act1_q4", &expected());
    assert!(fb.starts_with("🔤 Palabras: 0. Nivel estimado: Básico (0%). ❌ No detecté verbos conocidos."));
    assert!(fb.contains("\nSugerencias: No hay texto."));
    assert!(fb.ends_with("si quieres ver el modelo."));
  }

  #[test]
  fn compose_is_deterministic() {
    let e = expected();
    assert_eq!(compose("Sie heißen Twix", "act1_q4", &e), compose("Sie heißen Twix", "act1_q4", &e));
  }
}
