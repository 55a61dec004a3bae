//! WebSocket upgrade + message loop. Each connection binds one session (`?profile=` or a fresh
//! one); each client message is parsed as JSON, applied to that session, and answered with a
//! single JSON message. Remote saves answer later, once the submission store has replied; the
//! loop keeps serving the connection in the meantime.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    Query, State, WebSocketUpgrade,
  },
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::analyzer::analyze;
use crate::error::SaveError;
use crate::protocol::{curriculum_out, ClientWsMessage, ServerWsMessage};
use crate::session::{FieldView, Session, IDENTITY_SAVED_NOTICE, SAVED_LOCAL_NOTICE, SAVED_REMOTE_NOTICE};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
  pub profile: Option<String>,
}

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(
  ws: WebSocketUpgrade,
  State(state): State<Arc<AppState>>,
  Query(q): Query<WsQuery>,
) -> axum::response::Response {
  info!(target: "deutsch_syntax", "WebSocket upgrade requested");
  match state.open_session(q.profile.as_deref()).await {
    Some(session) => ws.on_upgrade(move |socket| handle_ws(socket, state, session)).into_response(),
    None => (StatusCode::BAD_REQUEST, "invalid profile id").into_response(),
  }
}

#[instrument(level = "info", skip(socket, state, session), fields(profile = %session.profile))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, session: Arc<Session>) {
  info!(target: "deutsch_syntax", "WebSocket connected");
  // Replies from detached dispatches (remote saves) come back through here.
  let (tx, mut rx) = mpsc::unbounded_channel::<ServerWsMessage>();

  loop {
    let reply_msg = tokio::select! {
      incoming = socket.recv() => match incoming {
        Some(Ok(Message::Text(txt))) => match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "deutsch_syntax", kind = message_kind(&incoming), "WS received");
            match dispatch(incoming, &state, &session, &tx).await {
              Some(reply) => reply,
              None => continue,
            }
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid message: {}", e) },
        },
        Some(Ok(Message::Ping(payload))) => {
          let _ = socket.send(Message::Pong(payload)).await;
          continue;
        }
        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
        Some(Ok(_)) => continue,
      },
      Some(reply) = rx.recv() => reply,
    };

    if let Err(e) = socket.send(Message::Text(encode(&reply_msg))).await {
      error!(target: "deutsch_syntax", error = %e, "WS send error");
      break;
    }
  }
  info!(target: "deutsch_syntax", "WebSocket disconnected");
}

fn encode(msg: &ServerWsMessage) -> String {
  serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  })
}

/// Answer `msg` right away, or, for a remote save, run it on its own task and deliver the
/// reply through `tx` so the connection keeps serving other messages meanwhile.
pub async fn dispatch(
  msg: ClientWsMessage,
  state: &Arc<AppState>,
  session: &Arc<Session>,
  tx: &mpsc::UnboundedSender<ServerWsMessage>,
) -> Option<ServerWsMessage> {
  if !matches!(msg, ClientWsMessage::SaveRemote { .. }) {
    return Some(handle_client_ws(msg, state, session).await);
  }
  let (state, session, tx) = (state.clone(), session.clone(), tx.clone());
  tokio::spawn(async move {
    let reply = handle_client_ws(msg, &state, &session).await;
    // receiver gone means the socket closed; the session already holds the outcome
    let _ = tx.send(reply);
  });
  None
}

// Message bodies carry answer text; log only the kind.
fn message_kind(m: &ClientWsMessage) -> &'static str {
  match m {
    ClientWsMessage::Ping => "ping",
    ClientWsMessage::Curriculum => "curriculum",
    ClientWsMessage::Snapshot => "snapshot",
    ClientWsMessage::Analyze { .. } => "analyze",
    ClientWsMessage::SetIdentity { .. } => "set_identity",
    ClientWsMessage::SaveIdentity => "save_identity",
    ClientWsMessage::UpdateAnswer { .. } => "update_answer",
    ClientWsMessage::Review { .. } => "review",
    ClientWsMessage::ToggleSolution { .. } => "toggle_solution",
    ClientWsMessage::ToggleHint { .. } => "toggle_hint",
    ClientWsMessage::Clear { .. } => "clear",
    ClientWsMessage::SaveLocal { .. } => "save_local",
    ClientWsMessage::LoadLocal { .. } => "load_local",
    ClientWsMessage::SaveRemote { .. } => "save_remote",
    ClientWsMessage::ToggleComplete { .. } => "toggle_complete",
  }
}

fn field_msg(field: FieldView) -> ServerWsMessage {
  ServerWsMessage::Field { field, notice: None }
}

async fn field_result(session: &Session, result: Result<FieldView, SaveError>, id: &crate::domain::FieldId, ok: Option<&str>) -> ServerWsMessage {
  match result {
    Ok(field) => ServerWsMessage::Field { field, notice: ok.map(str::to_string) },
    Err(e) => ServerWsMessage::Field { field: session.field(id).await, notice: Some(e.notice().to_string()) },
  }
}

pub async fn handle_client_ws(msg: ClientWsMessage, state: &AppState, session: &Arc<Session>) -> ServerWsMessage {
  // Field messages must name a field the curriculum knows.
  let unknown = |id: &crate::domain::FieldId| ServerWsMessage::Error { message: format!("Unknown field: {}", id) };
  let check = |id: &crate::domain::FieldId| session.curriculum().has_field(id);

  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,
    ClientWsMessage::Curriculum => ServerWsMessage::Curriculum { curriculum: curriculum_out(&state.curriculum) },
    ClientWsMessage::Snapshot => ServerWsMessage::Session { session: session.snapshot().await },
    ClientWsMessage::Analyze { text } => ServerWsMessage::Analysis { analysis: analyze(&text) },

    ClientWsMessage::SetIdentity { full_name, email } => ServerWsMessage::Identity {
      identity: session.set_identity(&full_name, &email).await,
      notice: None,
    },
    ClientWsMessage::SaveIdentity => match session.save_identity().await {
      Ok(identity) => ServerWsMessage::Identity { identity, notice: Some(IDENTITY_SAVED_NOTICE.into()) },
      Err(e) => ServerWsMessage::Identity { identity: session.identity().await, notice: Some(e.notice().into()) },
    },

    ClientWsMessage::UpdateAnswer { field_id, .. }
    | ClientWsMessage::Review { field_id }
    | ClientWsMessage::ToggleSolution { field_id }
    | ClientWsMessage::ToggleHint { field_id }
    | ClientWsMessage::Clear { field_id }
    | ClientWsMessage::SaveLocal { field_id }
    | ClientWsMessage::LoadLocal { field_id }
    | ClientWsMessage::SaveRemote { field_id }
      if !check(&field_id) => unknown(&field_id),

    ClientWsMessage::UpdateAnswer { field_id, text } => field_msg(session.update(&field_id, &text).await),
    ClientWsMessage::Review { field_id } => field_msg(session.review(&field_id).await),
    ClientWsMessage::ToggleSolution { field_id } => field_msg(session.toggle_solution(&field_id).await),
    ClientWsMessage::ToggleHint { field_id } => field_msg(session.toggle_hint(&field_id).await),
    ClientWsMessage::Clear { field_id } => field_msg(session.clear(&field_id).await),
    ClientWsMessage::SaveLocal { field_id } => {
      let r = session.save_local(&field_id).await;
      field_result(session, r, &field_id, Some(SAVED_LOCAL_NOTICE)).await
    }
    ClientWsMessage::LoadLocal { field_id } => {
      let r = session.load_local(&field_id).await;
      field_result(session, r, &field_id, None).await
    }
    ClientWsMessage::SaveRemote { field_id } => {
      let r = session.save_remote(&field_id).await;
      info!(target: "lesson", field = %field_id, ok = r.is_ok(), "WS save_remote finished");
      field_result(session, r, &field_id, Some(SAVED_REMOTE_NOTICE)).await
    }

    ClientWsMessage::ToggleComplete { exercise_id } => {
      if session.curriculum().exercise(&exercise_id).is_none() {
        return ServerWsMessage::Error { message: format!("Unknown exercise: {}", exercise_id) };
      }
      ServerWsMessage::Progress { progress: session.toggle_complete(&exercise_id).await }
    }
  }
}
