//! HTTP endpoint handlers. These are thin wrappers that forward to the session.
//! Each handler is instrumented; answer text is logged by length only.

use std::sync::Arc;
use axum::{
  extract::{Path, State},
  response::{IntoResponse, Response},
  Json,
};
use tracing::{error, info, instrument, warn};

use crate::analyzer::analyze;
use crate::domain::FieldId;
use crate::error::SaveError;
use crate::feedback::compose;
use crate::protocol::*;
use crate::routes::{save_status_code, ApiError};
use crate::session::{FieldView, Session, IDENTITY_SAVED_NOTICE, SAVED_LOCAL_NOTICE, SAVED_REMOTE_NOTICE};
use crate::state::AppState;

async fn session(state: &AppState, profile: &str) -> Result<Arc<Session>, ApiError> {
  state
    .get_session(profile)
    .await
    .ok_or_else(|| ApiError::NotFound(format!("Unknown session: {}", profile)))
}

async fn session_field(state: &AppState, profile: &str, raw: &str) -> Result<(Arc<Session>, FieldId), ApiError> {
  let s = session(state, profile).await?;
  let id: FieldId = raw.parse().map_err(|e: crate::domain::ParseFieldIdError| ApiError::BadRequest(e.to_string()))?;
  if !s.curriculum().has_field(&id) {
    return Err(ApiError::NotFound(format!("Unknown field: {}", id)));
  }
  Ok((s, id))
}

/// Field projection with the action's notice; failures keep the field view and carry the error notice.
async fn field_outcome(s: &Session, id: &FieldId, result: Result<FieldView, SaveError>, ok_notice: Option<&str>) -> Response {
  match result {
    Ok(field) => Json(FieldOut { field, notice: ok_notice.map(str::to_string) }).into_response(),
    Err(e) => {
      if e.is_precondition() {
        warn!(target: "lesson", field = %id, error = %e, "Field action rejected");
      } else {
        error!(target: "lesson", field = %id, error = %e, "Field action failed");
      }
      let field = s.field(id).await;
      (save_status_code(&e), Json(FieldOut { field, notice: Some(e.notice().to_string()) })).into_response()
    }
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, remote_enabled: state.remote.is_some() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_curriculum(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(curriculum_out(&state.curriculum))
}

#[instrument(level = "info", skip(body), fields(text_len = body.text.len()))]
pub async fn http_post_analyze(Json(body): Json<AnalyzeIn>) -> impl IntoResponse {
  Json(analyze(&body.text))
}

#[instrument(level = "info", skip(state, body), fields(field_id = %body.field_id, text_len = body.text.len()))]
pub async fn http_post_feedback(
  State(state): State<Arc<AppState>>,
  Json(body): Json<FeedbackIn>,
) -> impl IntoResponse {
  let feedback = compose(&body.text, &body.field_id, &state.curriculum.expected);
  Json(FeedbackOut { feedback })
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_open_session(
  State(state): State<Arc<AppState>>,
  body: Option<Json<OpenSessionIn>>,
) -> Result<impl IntoResponse, ApiError> {
  let body = body.map(|Json(b)| b).unwrap_or_default();
  let s = state
    .open_session(body.profile.as_deref())
    .await
    .ok_or_else(|| ApiError::BadRequest("profile must be 1-64 chars of [A-Za-z0-9_-]".into()))?;
  info!(target: "deutsch_syntax", profile = %s.profile, "HTTP session opened");
  Ok(Json(s.snapshot().await))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(profile): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  let s = session(&state, &profile).await?;
  Ok(Json(s.snapshot().await))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_progress(
  State(state): State<Arc<AppState>>,
  Path(profile): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  let s = session(&state, &profile).await?;
  Ok(Json(s.progress().await))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_put_identity(
  State(state): State<Arc<AppState>>,
  Path(profile): Path<String>,
  Json(body): Json<IdentityIn>,
) -> Result<impl IntoResponse, ApiError> {
  let s = session(&state, &profile).await?;
  let identity = s.set_identity(&body.full_name, &body.email).await;
  Ok(Json(IdentityOut { identity, notice: None }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_save_identity(
  State(state): State<Arc<AppState>>,
  Path(profile): Path<String>,
) -> Result<Response, ApiError> {
  let s = session(&state, &profile).await?;
  Ok(match s.save_identity().await {
    Ok(identity) => Json(IdentityOut { identity, notice: Some(IDENTITY_SAVED_NOTICE.into()) }).into_response(),
    Err(e) => {
      let identity = s.identity().await;
      (save_status_code(&e), Json(IdentityOut { identity, notice: Some(e.notice().into()) })).into_response()
    }
  })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_field(
  State(state): State<Arc<AppState>>,
  Path((profile, field_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
  let (s, id) = session_field(&state, &profile, &field_id).await?;
  Ok(Json(FieldOut { field: s.field(&id).await, notice: None }))
}

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.len()))]
pub async fn http_put_answer(
  State(state): State<Arc<AppState>>,
  Path((profile, field_id)): Path<(String, String)>,
  Json(body): Json<AnswerIn>,
) -> Result<impl IntoResponse, ApiError> {
  let (s, id) = session_field(&state, &profile, &field_id).await?;
  Ok(Json(FieldOut { field: s.update(&id, &body.text).await, notice: None }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_review(
  State(state): State<Arc<AppState>>,
  Path((profile, field_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
  let (s, id) = session_field(&state, &profile, &field_id).await?;
  Ok(Json(FieldOut { field: s.review(&id).await, notice: None }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_toggle_solution(
  State(state): State<Arc<AppState>>,
  Path((profile, field_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
  let (s, id) = session_field(&state, &profile, &field_id).await?;
  Ok(Json(FieldOut { field: s.toggle_solution(&id).await, notice: None }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_toggle_hint(
  State(state): State<Arc<AppState>>,
  Path((profile, field_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
  let (s, id) = session_field(&state, &profile, &field_id).await?;
  Ok(Json(FieldOut { field: s.toggle_hint(&id).await, notice: None }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_clear(
  State(state): State<Arc<AppState>>,
  Path((profile, field_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
  let (s, id) = session_field(&state, &profile, &field_id).await?;
  Ok(Json(FieldOut { field: s.clear(&id).await, notice: None }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_save_local(
  State(state): State<Arc<AppState>>,
  Path((profile, field_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
  let (s, id) = session_field(&state, &profile, &field_id).await?;
  let result = s.save_local(&id).await;
  Ok(field_outcome(&s, &id, result, Some(SAVED_LOCAL_NOTICE)).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_load_local(
  State(state): State<Arc<AppState>>,
  Path((profile, field_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
  let (s, id) = session_field(&state, &profile, &field_id).await?;
  let result = s.load_local(&id).await;
  Ok(field_outcome(&s, &id, result, None).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_save_remote(
  State(state): State<Arc<AppState>>,
  Path((profile, field_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
  let (s, id) = session_field(&state, &profile, &field_id).await?;
  let result = s.save_remote(&id).await;
  info!(target: "lesson", field = %id, ok = result.is_ok(), "HTTP save_remote finished");
  Ok(field_outcome(&s, &id, result, Some(SAVED_REMOTE_NOTICE)).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_toggle_complete(
  State(state): State<Arc<AppState>>,
  Path((profile, exercise_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
  let s = session(&state, &profile).await?;
  if s.curriculum().exercise(&exercise_id).is_none() {
    return Err(ApiError::NotFound(format!("Unknown exercise: {}", exercise_id)));
  }
  Ok(Json(s.toggle_complete(&exercise_id).await))
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::body::{to_bytes, Body};
  use axum::http::{Request, StatusCode};
  use serde_json::{json, Value};
  use tower::ServiceExt;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  use crate::config::{AppConfig, RemoteCfg};
  use crate::remote::{RestSubmissions, SubmissionStore};
  use crate::routes::build_router;

  fn app(dir: &std::path::Path, remote: Option<Arc<dyn SubmissionStore>>) -> axum::Router {
    let mut cfg = AppConfig::default();
    cfg.storage.data_dir = dir.to_path_buf();
    build_router(Arc::new(AppState::new(&cfg, remote)))
  }

  async fn call(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        req = req.header("content-type", "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
  }

  #[tokio::test]
  async fn stateless_endpoints() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), None);

    let (status, v) = call(&app, "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v, json!({ "ok": true, "remoteEnabled": false }));

    let (_, v) = call(&app, "POST", "/api/v1/analyze", Some(json!({ "text": "Ich komme aus Berlin." }))).await;
    assert_eq!(v["score"], 95);
    assert_eq!(v["level"], "Avanzado");
    assert_eq!(v["verbSecondPos"], true);

    let (_, v) = call(
      &app,
      "POST",
      "/api/v1/feedback",
      Some(json!({ "fieldId": "act1_q0", "text": "Sebastian kommt aus München" })),
    )
    .await;
    assert!(v["feedback"].as_str().unwrap().contains("Coincide con la respuesta esperada"));

    let (_, v) = call(&app, "GET", "/api/v1/curriculum", None).await;
    assert_eq!(v["exercises"].as_array().unwrap().len(), 6);
  }

  #[tokio::test]
  async fn field_lifecycle_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), None);

    let (status, v) = call(&app, "POST", "/api/v1/sessions", Some(json!({ "profile": "juana" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["profile"], "juana");

    let (_, v) = call(&app, "PUT", "/api/v1/sessions/juana/fields/act1_q3", Some(json!({ "text": "Er hat einen Hund." }))).await;
    assert_eq!(v["field"]["state"], "draft");
    assert!(v["field"]["feedback"].as_str().unwrap().contains("Coincide"));

    let (_, v) = call(&app, "POST", "/api/v1/sessions/juana/fields/act1_q3/review", None).await;
    assert_eq!(v["field"]["state"], "reviewed");

    let (status, v) = call(&app, "POST", "/api/v1/sessions/juana/fields/act1_q3/save_local", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["notice"], SAVED_LOCAL_NOTICE);

    let (_, v) = call(&app, "POST", "/api/v1/sessions/juana/fields/act1_q3/solution", None).await;
    assert_eq!(v["field"]["solution"], "Er hat einen Hund.");

    let (_, v) = call(&app, "POST", "/api/v1/sessions/juana/fields/act1_q3/clear", None).await;
    assert_eq!(v["field"]["text"], "");
    assert_eq!(v["field"]["feedback"], "Respuesta borrada.");

    let (_, v) = call(&app, "POST", "/api/v1/sessions/juana/fields/act1_q3/load_local", None).await;
    assert_eq!(v["field"]["text"], "Er hat einen Hund.");

    let (status, v) = call(&app, "POST", "/api/v1/sessions/juana/fields/act1_q3/save_remote", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(v["notice"].as_str().unwrap().contains("correo institucional"));
    assert_eq!(v["field"]["status"], "idle");

    let (_, v) = call(&app, "POST", "/api/v1/sessions/juana/exercises/act1/complete", None).await;
    assert_eq!(v["completedCount"], 1);
    assert_eq!(v["percent"], 17);
  }

  #[tokio::test]
  async fn lookups_fail_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), None);
    call(&app, "POST", "/api/v1/sessions", Some(json!({ "profile": "p1" }))).await;

    let (status, _) = call(&app, "GET", "/api/v1/sessions/nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, "GET", "/api/v1/sessions/p1/fields/act1_q9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, v) = call(&app, "GET", "/api/v1/sessions/p1/fields/act1_xx", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(v["message"].as_str().unwrap().contains("malformed field id"));
    let (status, _) = call(&app, "POST", "/api/v1/sessions/p1/exercises/act9/complete", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, "POST", "/api/v1/sessions", Some(json!({ "profile": "a/b" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn remote_save_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/rest/v1/submissions"))
      .respond_with(ResponseTemplate::new(201))
      .expect(1)
      .mount(&server)
      .await;
    let remote = RestSubmissions::new(&server.uri(), "anon", &RemoteCfg::default()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), Some(Arc::new(remote) as Arc<dyn SubmissionStore>));
    call(&app, "POST", "/api/v1/sessions", Some(json!({ "profile": "juana" }))).await;

    let (_, v) = call(
      &app,
      "PUT",
      "/api/v1/sessions/juana/identity",
      Some(json!({ "fullName": "Juana Pérez", "email": "juana@azc.uam.mx" })),
    )
    .await;
    assert_eq!(v["identity"]["nameValid"], true);
    assert_eq!(v["identity"]["emailValid"], true);

    // blank answer is rejected before any request is made
    let (status, v) = call(&app, "POST", "/api/v1/sessions/juana/fields/act5/save_remote", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["notice"], "No hay contenido para guardar.");

    call(&app, "PUT", "/api/v1/sessions/juana/fields/act5", Some(json!({ "text": "Hallo! Ich bin Leonard." }))).await;
    let (status, v) = call(&app, "POST", "/api/v1/sessions/juana/fields/act5/save_remote", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["field"]["status"], "saved");
    assert_eq!(v["notice"], SAVED_REMOTE_NOTICE);
  }

  #[tokio::test]
  async fn remote_failure_is_a_bad_gateway_with_field_notice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
      .mount(&server)
      .await;
    let remote = RestSubmissions::new(&server.uri(), "anon", &RemoteCfg::default()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), Some(Arc::new(remote) as Arc<dyn SubmissionStore>));
    call(&app, "POST", "/api/v1/sessions", Some(json!({ "profile": "juana" }))).await;
    call(&app, "PUT", "/api/v1/sessions/juana/identity", Some(json!({ "fullName": "Juana Pérez", "email": "juana@azc.uam.mx" }))).await;
    call(&app, "PUT", "/api/v1/sessions/juana/fields/act6", Some(json!({ "text": "Ich bin Juana." }))).await;

    let (status, v) = call(&app, "POST", "/api/v1/sessions/juana/fields/act6/save_remote", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(v["field"]["status"], "error");
    assert!(v["notice"].as_str().unwrap().starts_with("Error al guardar en el backend"));

    // other fields keep working
    let (status, v) = call(&app, "PUT", "/api/v1/sessions/juana/fields/act4", Some(json!({ "text": "Lena: Hallo!" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["field"]["status"], "idle");
  }
}
