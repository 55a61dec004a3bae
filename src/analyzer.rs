//! Shallow lexical grammar heuristic for short German answers.
//!
//! Not a parser: the verb-second check only looks at the second whitespace token, so a
//! multi-word first constituent ("Am Montag gehe ich") is reported as missing V2.

use crate::domain::{Analysis, Level};
use crate::lexicon;

pub const SUGGEST_EMPTY: &str = "No hay texto. Escribe una oración o palabras clave.";
pub const SUGGEST_VERB: &str = "Incluye un verbo conjugado (p.ej. 'ich bin', 'er hat', 'wir kommen').";
pub const SUGGEST_V2: &str =
  "Verifica la posición del verbo: en oraciones declarativas el verbo suele estar en 2ª posición (V2).";
pub const SUGGEST_CAPITAL: &str = "Empieza la oración con mayúscula.";
pub const SUGGEST_PUNCT: &str = "Agrega punto final o signo de interrogación si corresponde.";
pub const SUGGEST_PRONOUN: &str = "Añade un pronombre o sujeto para mayor claridad (p.ej. 'Ich', 'Er').";

const TRAILING_PUNCT: [char; 4] = ['.', ',', '!', '?'];

/// Analyze free text. Pure; recomputed on every call.
pub fn analyze(text: &str) -> Analysis {
  let trimmed = text.trim();
  if trimmed.is_empty() {
    return Analysis { suggestions: vec![SUGGEST_EMPTY], ..Analysis::default() };
  }

  let tokens: Vec<&str> = trimmed.split_whitespace().collect();
  let word_count = tokens.len();
  let capitalized_sentence = trimmed
    .chars()
    .next()
    .is_some_and(|c| c.is_ascii_uppercase() || matches!(c, 'Ä' | 'Ö' | 'Ü'));
  let ends_with_punctuation = trimmed.ends_with(['.', '!', '?']);

  let lower = trimmed.to_lowercase();
  let pronoun_present = lexicon::contains_pronoun(&lower);
  let verbs_found = lexicon::verbs_in(&lower);
  let verb_present = !verbs_found.is_empty();

  let verb_second_pos = tokens.get(1).is_some_and(|second| {
    let bare: String = second.chars().filter(|c| !TRAILING_PUNCT.contains(c)).collect();
    lexicon::is_verb(&bare.to_lowercase())
  });

  let mut score: u32 = match word_count {
    n if n >= 3 => 25,
    2 => 10,
    _ => 0,
  };
  if verb_present { score += 30; }
  if pronoun_present { score += 10; }
  if verb_second_pos { score += 20; }
  if capitalized_sentence { score += 5; }
  if ends_with_punctuation { score += 5; }
  let score = score.min(100) as u8;

  let mut suggestions = Vec::new();
  if !verb_present { suggestions.push(SUGGEST_VERB); }
  if !verb_second_pos && word_count >= 3 { suggestions.push(SUGGEST_V2); }
  if !capitalized_sentence { suggestions.push(SUGGEST_CAPITAL); }
  if !ends_with_punctuation { suggestions.push(SUGGEST_PUNCT); }
  if !pronoun_present && word_count < 4 { suggestions.push(SUGGEST_PRONOUN); }

  Analysis {
    word_count,
    capitalized_sentence,
    ends_with_punctuation,
    pronoun_present,
    verb_present,
    verb_second_pos,
    verbs_found,
    suggestions,
    score,
    level: Level::from_score(score),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_input_short_circuits() {
    for s in ["", "   ", "\n\t "] {
      let a = analyze(s);
      assert_eq!(a.score, 0);
      assert_eq!(a.word_count, 0);
      assert_eq!(a.suggestions, vec![SUGGEST_EMPTY]);
      assert_eq!(a.level, Level::Basico);
    }
  }

  #[test]
  fn full_declarative_sentence_scores_high() {
    let a = analyze("Ich komme aus Berlin.");
    assert_eq!(a.word_count, 4);
    assert!(a.capitalized_sentence && a.ends_with_punctuation);
    assert!(a.pronoun_present && a.verb_present && a.verb_second_pos);
    assert_eq!(a.verbs_found, vec!["komme"]);
    // 25 + 30 + 10 + 20 + 5 + 5
    assert_eq!(a.score, 95);
    assert_eq!(a.level, Level::Avanzado);
    assert!(a.suggestions.is_empty());
  }

  #[test]
  fn second_token_verb_adds_twenty() {
    let with_v2 = analyze("heute kommt Anna");
    let without = analyze("heute Anna kommt");
    assert!(with_v2.verb_second_pos);
    assert!(!without.verb_second_pos);
    assert_eq!(with_v2.score - without.score, 20);
  }

  #[test]
  fn second_token_is_stripped_of_punctuation_and_lowercased() {
    assert!(analyze("Wo WOHNST, du").verb_second_pos);
    assert!(analyze("Ja, bin!").verb_second_pos);
  }

  #[test]
  fn fronted_phrase_is_not_recognised_as_v2() {
    let a = analyze("Am Montag gehe ich.");
    assert!(a.verb_present);
    assert!(!a.verb_second_pos);
    assert!(a.suggestions.contains(&SUGGEST_V2));
  }

  #[test]
  fn suggestions_follow_fixed_order() {
    let a = analyze("hallo welt");
    assert_eq!(a.suggestions, vec![SUGGEST_VERB, SUGGEST_CAPITAL, SUGGEST_PUNCT, SUGGEST_PRONOUN]);

    let a = analyze("das auto ist rot und schnell");
    assert_eq!(a.suggestions, vec![SUGGEST_V2, SUGGEST_CAPITAL, SUGGEST_PUNCT]);
  }

  #[test]
  fn word_count_bonus_tiers() {
    assert_eq!(analyze("Hallo").score, 5);
    assert_eq!(analyze("Hallo Welt").score, 15);
    assert_eq!(analyze("Hallo liebe Welt").score, 30);
  }

  #[test]
  fn umlaut_capital_counts_as_capitalized() {
    assert!(analyze("Über alles").capitalized_sentence);
    assert!(!analyze("über alles").capitalized_sentence);
    assert!(!analyze("éclair").capitalized_sentence);
  }

  #[test]
  fn score_never_exceeds_hundred() {
    let texts = [
      "Ich bin Student und ich habe einen Hund!",
      "Er ist hier, sie ist dort, wir sind da.",
      "Sie kommt, geht, liest, hat, ist, wird.",
    ];
    for t in texts {
      let a = analyze(t);
      assert!(a.score <= 100, "{t}: {}", a.score);
    }
    assert_eq!(analyze("Ich bin Student und ich habe einen Hund!").score, 95);
  }
}
