//! Error types for persistence and session operations.
//!
//! `Display` is for logs; `notice()` is the Spanish text shown next to the field.

use thiserror::Error;

/// Local key-value bucket failures.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("local store io error at {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("local store at {path} holds invalid JSON: {source}")]
  Corrupt {
    path: String,
    #[source]
    source: serde_json::Error,
  },
}

/// Remote submission store failures.
#[derive(Debug, Error)]
pub enum RemoteError {
  #[error("submission store returned HTTP {status}: {message}")]
  Api { status: u16, message: String },

  #[error("network error: {0}")]
  Network(String),
}

/// Why a save (local or remote) did not happen or did not succeed.
#[derive(Debug, Error)]
pub enum SaveError {
  #[error("student identity is incomplete or not institutional")]
  InvalidIdentity,

  #[error("remote submission store is not configured")]
  RemoteNotConfigured,

  #[error("field has no content to save")]
  EmptyContent,

  #[error(transparent)]
  Remote(#[from] RemoteError),

  #[error(transparent)]
  Local(#[from] StoreError),
}

impl SaveError {
  pub fn notice(&self) -> &'static str {
    match self {
      SaveError::InvalidIdentity => {
        "Por favor completa tu nombre completo y usa un correo institucional válido (azc.uam.mx) antes de guardar."
      }
      SaveError::RemoteNotConfigured => {
        "El servidor de respuestas no está configurado en este entorno. Usa guardado local o configura SUBMISSIONS_URL y SUBMISSIONS_API_KEY."
      }
      SaveError::EmptyContent => "No hay contenido para guardar.",
      SaveError::Remote(_) => "Error al guardar en el backend. Revisa los registros del servidor y las variables de entorno.",
      SaveError::Local(_) => "No se pudo guardar localmente.",
    }
  }

  /// Validation and configuration errors abort before any state change.
  pub fn is_precondition(&self) -> bool {
    matches!(self, SaveError::InvalidIdentity | SaveError::RemoteNotConfigured | SaveError::EmptyContent)
  }
}
