//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::curriculum::Curriculum;
use crate::domain::{Analysis, ExerciseItems, FieldId};
use crate::progress::ProgressView;
use crate::session::{FieldView, IdentityView, SessionView};

/// Messages the client can send over WebSocket. Field/exercise messages act on the
/// connection's session.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Curriculum,
    Snapshot,
    Analyze {
        text: String,
    },
    SetIdentity {
        #[serde(rename = "fullName")]
        full_name: String,
        email: String,
    },
    SaveIdentity,
    UpdateAnswer {
        #[serde(rename = "fieldId")]
        field_id: FieldId,
        text: String,
    },
    Review {
        #[serde(rename = "fieldId")]
        field_id: FieldId,
    },
    ToggleSolution {
        #[serde(rename = "fieldId")]
        field_id: FieldId,
    },
    ToggleHint {
        #[serde(rename = "fieldId")]
        field_id: FieldId,
    },
    Clear {
        #[serde(rename = "fieldId")]
        field_id: FieldId,
    },
    SaveLocal {
        #[serde(rename = "fieldId")]
        field_id: FieldId,
    },
    LoadLocal {
        #[serde(rename = "fieldId")]
        field_id: FieldId,
    },
    SaveRemote {
        #[serde(rename = "fieldId")]
        field_id: FieldId,
    },
    ToggleComplete {
        #[serde(rename = "exerciseId")]
        exercise_id: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Curriculum {
        curriculum: CurriculumOut,
    },
    Session {
        session: SessionView,
    },
    Analysis {
        analysis: Analysis,
    },
    Identity {
        identity: IdentityView,
        #[serde(skip_serializing_if = "Option::is_none")]
        notice: Option<String>,
    },
    Field {
        field: FieldView,
        #[serde(skip_serializing_if = "Option::is_none")]
        notice: Option<String>,
    },
    Progress {
        progress: ProgressView,
    },
    Error {
        message: String,
    },
}

/// Catalogue as delivered to the renderer.
#[derive(Debug, Serialize)]
pub struct CurriculumOut {
    pub exercises: Vec<ExerciseOut>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseOut {
    pub id: String,
    pub title: String,
    pub difficulty: String,
    pub field_ids: Vec<FieldId>,
    #[serde(flatten)]
    pub items: ExerciseItems,
}

pub fn curriculum_out(c: &Curriculum) -> CurriculumOut {
    CurriculumOut {
        exercises: c
            .exercises
            .iter()
            .map(|e| ExerciseOut {
                id: e.id.clone(),
                title: e.title.clone(),
                difficulty: e.difficulty.clone(),
                field_ids: e.field_ids(),
                items: e.items.clone(),
            })
            .collect(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize, Default)]
pub struct OpenSessionIn {
    #[serde(default)]
    pub profile: Option<String>,
}

#[derive(Deserialize)]
pub struct AnalyzeIn {
    pub text: String,
}

#[derive(Deserialize)]
pub struct FeedbackIn {
    #[serde(rename = "fieldId")]
    pub field_id: String,
    pub text: String,
}
#[derive(Serialize)]
pub struct FeedbackOut {
    pub feedback: String,
}

#[derive(Deserialize)]
pub struct IdentityIn {
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct AnswerIn {
    pub text: String,
}

/// Field projection plus the notice produced by the action (if any).
#[derive(Serialize)]
pub struct FieldOut {
    pub field: FieldView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Serialize)]
pub struct IdentityOut {
    pub identity: IdentityView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    #[serde(rename = "remoteEnabled")]
    pub remote_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_parse() {
        let m: ClientWsMessage =
            serde_json::from_str(r#"{"type":"update_answer","fieldId":"act1_q0","text":"Hallo"}"#).unwrap();
        match m {
            ClientWsMessage::UpdateAnswer { field_id, text } => {
                assert_eq!(field_id.to_string(), "act1_q0");
                assert_eq!(text, "Hallo");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(serde_json::from_str::<ClientWsMessage>(r#"{"type":"review","fieldId":"act1_zz"}"#).is_err());
        assert!(matches!(
            serde_json::from_str::<ClientWsMessage>(r#"{"type":"toggle_complete","exerciseId":"act2"}"#),
            Ok(ClientWsMessage::ToggleComplete { .. })
        ));
    }

    #[test]
    fn curriculum_lists_field_ids() {
        let out = curriculum_out(&Curriculum::default());
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["exercises"][0]["fieldIds"][0], "act1_q0");
        assert_eq!(json["exercises"][0]["kind"], "questions");
        assert_eq!(json["exercises"][3]["kind"], "free_text");
        assert_eq!(json["exercises"][2]["items"][0]["prompt"], "kommen (regular)");
    }
}
