//! Static word lists used by the grammar heuristic.
//!
//! Matching is whole-word and case-insensitive. The verb list is ordered; detected verbs are
//! reported in this order, each entry at most once.

use once_cell::sync::Lazy;
use regex::Regex;

/// Personal pronouns. "sie" and "Sie" collapse once lowercased.
pub const PRONOUNS: &[&str] = &["ich", "du", "er", "sie", "es", "wir", "ihr", "Sie"];

/// Common finite and infinitive forms: copula, auxiliaries, modals and frequent regular verbs.
pub const VERBS: &[&str] = &[
  "sein", "bin", "bist", "ist", "sind", "seid",
  "haben", "habe", "hast", "hat",
  "kommen", "komme", "kommst", "kommt",
  "wohnen", "wohne", "wohnst", "wohnt",
  "werden", "werde", "wirst", "wird",
  "mögen", "mag", "magst", "möchtest", "möchte",
  "können", "kann", "kannst", "könnt",
  "müssen", "muss", "musst",
  "machen", "gehe", "gehst", "geht",
  "arbeiten", "lernen", "spielen", "reisen", "fotografieren",
  "hatte", "sah", "hatten",
  "lesen", "hören", "lieben",
];

fn whole_word(word: &str) -> Regex {
  // Patterns are built from the constant lists above; they always compile.
  Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word))).expect("lexicon pattern")
}

static PRONOUN_RES: Lazy<Vec<Regex>> = Lazy::new(|| PRONOUNS.iter().map(|p| whole_word(p)).collect());

static VERB_RES: Lazy<Vec<(&'static str, Regex)>> =
  Lazy::new(|| VERBS.iter().map(|v| (*v, whole_word(v))).collect());

pub fn contains_pronoun(text: &str) -> bool {
  PRONOUN_RES.iter().any(|re| re.is_match(text))
}

/// Verb forms occurring in `text`, in lexicon order.
pub fn verbs_in(text: &str) -> Vec<&'static str> {
  VERB_RES
    .iter()
    .filter(|(_, re)| re.is_match(text))
    .map(|(v, _)| *v)
    .collect()
}

/// Exact (already lowercased) lookup, used for the second-token check.
pub fn is_verb(word: &str) -> bool {
  VERBS.contains(&word)
}
