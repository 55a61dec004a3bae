//! Remote submission store.
//!
//! The session only needs "insert one record, tell me if it worked". The shipped client speaks
//! the PostgREST dialect (`POST {base}/rest/v1/{table}` with `apikey` + bearer headers).
//!
//! NOTE: the API key is never logged, and neither is the submitted text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::config::RemoteCfg;
use crate::error::RemoteError;
use crate::util::trunc_for_log;

/// One answer as stored remotely.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Submission {
  pub full_name: String,
  /// Always lowercased.
  pub email: String,
  pub activity_id: String,
  pub field_id: String,
  pub content: String,
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
  async fn insert(&self, record: &Submission) -> Result<(), RemoteError>;
}

#[derive(Clone)]
pub struct RestSubmissions {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub table: String,
}

impl RestSubmissions {
  /// Construct the client if SUBMISSIONS_URL and SUBMISSIONS_API_KEY are both set; otherwise None.
  pub fn from_env(cfg: &RemoteCfg) -> Option<Self> {
    let base_url = std::env::var("SUBMISSIONS_URL").ok().filter(|s| !s.trim().is_empty())?;
    let api_key = std::env::var("SUBMISSIONS_API_KEY").ok().filter(|s| !s.trim().is_empty())?;
    match Self::new(&base_url, &api_key, cfg) {
      Ok(c) => Some(c),
      Err(e) => {
        error!(target: "deutsch_syntax", error = %e, "Failed to build HTTP client for submissions");
        None
      }
    }
  }

  pub fn new(base_url: &str, api_key: &str, cfg: &RemoteCfg) -> Result<Self, RemoteError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.timeout_secs))
      .build()
      .map_err(|e| RemoteError::Network(e.to_string()))?;
    Ok(Self {
      client,
      api_key: api_key.to_string(),
      base_url: base_url.trim_end_matches('/').to_string(),
      table: cfg.table.clone(),
    })
  }
}

#[async_trait]
impl SubmissionStore for RestSubmissions {
  #[instrument(level = "info", skip(self, record), fields(table = %self.table, field_id = %record.field_id, content_len = record.content.len()))]
  async fn insert(&self, record: &Submission) -> Result<(), RemoteError> {
    let url = format!("{}/rest/v1/{}", self.base_url, self.table);
    let started = std::time::Instant::now();

    let res = self.client.post(&url)
      .header(USER_AGENT, "deutsch-syntax-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header("apikey", &self.api_key)
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .header("Prefer", "return=minimal")
      .json(&[record])
      .send()
      .await
      .map_err(|e| RemoteError::Network(e.to_string()))?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      return Err(RemoteError::Api { status: status.as_u16(), message: trunc_for_log(&body, 300) });
    }

    info!(target: "deutsch_syntax", status = status.as_u16(), elapsed_ms = started.elapsed().as_millis() as u64, "Submission stored");
    Ok(())
  }
}
