//! Student identity captured from two free-text inputs. Validity is derived, never stored.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// ASCII-only case folding: `ſ` or the Kelvin sign must not pass as `s` / `k`.
static INSTITUTIONAL_EMAIL: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?i-u)^[a-z0-9._%+-]+@azc\.uam\.mx$").expect("email pattern"));

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentIdentity {
  pub full_name: String,
  pub email: String,
}

impl StudentIdentity {
  pub fn new(full_name: impl Into<String>, email: impl Into<String>) -> Self {
    Self { full_name: full_name.into(), email: email.into() }
  }

  /// At least a first name and a surname.
  pub fn name_valid(&self) -> bool {
    self.full_name.split_whitespace().count() >= 2
  }

  pub fn email_valid(&self) -> bool {
    INSTITUTIONAL_EMAIL.is_match(self.email.trim())
  }

  pub fn is_valid(&self) -> bool {
    self.name_valid() && self.email_valid()
  }

  /// Name and email as sent to the submission store.
  pub fn normalized(&self) -> (String, String) {
    (self.full_name.trim().to_string(), self.email.trim().to_lowercase())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn name_needs_two_tokens() {
    assert!(StudentIdentity::new("Juana Pérez García", "").name_valid());
    assert!(StudentIdentity::new("  Juana   Pérez ", "").name_valid());
    assert!(!StudentIdentity::new("Juana", "").name_valid());
    assert!(!StudentIdentity::new("   ", "").name_valid());
  }

  #[test]
  fn email_must_be_institutional() {
    assert!(StudentIdentity::new("", "al2201@azc.uam.mx").email_valid());
    assert!(StudentIdentity::new("", " Juana.Perez@AZC.UAM.MX ").email_valid());
    assert!(!StudentIdentity::new("", "juana@uam.mx").email_valid());
    assert!(!StudentIdentity::new("", "juana@azc.uam.mx.evil.com").email_valid());
    assert!(!StudentIdentity::new("", "@azc.uam.mx").email_valid());
    assert!(!StudentIdentity::new("", "ju ana@azc.uam.mx").email_valid());
  }

  #[test]
  fn non_ascii_letters_do_not_fold_into_the_local_part() {
    assert!(!StudentIdentity::new("", "\u{17F}ofia@azc.uam.mx").email_valid());
    assert!(!StudentIdentity::new("", "\u{212A}arla@azc.uam.mx").email_valid());
    assert!(StudentIdentity::new("", "SOFIA@azc.uam.mx").email_valid());
  }

  #[test]
  fn normalization_trims_and_lowercases_email() {
    let id = StudentIdentity::new(" Juana Pérez ", " Juana@AZC.uam.mx");
    assert_eq!(id.normalized(), ("Juana Pérez".to_string(), "juana@azc.uam.mx".to_string()));
    assert!(id.is_valid());
  }
}
