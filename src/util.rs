//! Small utility helpers used across modules.

/// Log-safe truncation for large strings, cut on a char boundary.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}

/// Profile ids end up in file names: 1..=64 of ASCII alphanumerics, '-' or '_'.
pub fn is_valid_profile_id(id: &str) -> bool {
  (1..=64).contains(&id.len()) && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn truncation_respects_multibyte_chars() {
    assert_eq!(trunc_for_log("kurz", 10), "kurz");
    // 'ü' is two bytes; cutting at 2 would split it
    assert_eq!(trunc_for_log("Müller", 2), "M… (7 bytes total)");
  }

  #[test]
  fn profile_ids() {
    assert!(is_valid_profile_id("juana-perez_01"));
    assert!(is_valid_profile_id(&uuid::Uuid::new_v4().to_string()));
    assert!(!is_valid_profile_id(""));
    assert!(!is_valid_profile_id("../etc"));
    assert!(!is_valid_profile_id("a b"));
    assert!(!is_valid_profile_id(&"x".repeat(65)));
  }
}
