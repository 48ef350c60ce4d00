use crate::aggregate::{AggregateResult, DuplicatePolicy, QaFilter};
use crate::results::SlideResults;
use crate::store::ViewPreference;
use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ========== Requests ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub title: String,
    pub slides: Vec<Slide>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSlideStateRequest {
    pub state: SlideState,
}

/// What a participant sends; server-owned fields (upvotes, moderation flags,
/// timestamps) are filled in on intake
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Submission {
    Trivia {
        selected_option: OptionId,
    },
    WordCloud {
        words: Vec<String>,
    },
    Qa {
        question: String,
        #[serde(default)]
        author_name: Option<String>,
    },
}

impl Submission {
    pub fn submission_type(&self) -> SlideType {
        match self {
            Submission::Trivia { .. } => SlideType::Trivia,
            Submission::WordCloud { .. } => SlideType::WordCloud,
            Submission::Qa { .. } => SlideType::Qa,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponseRequest {
    pub participant_id: ParticipantId,
    #[serde(flatten)]
    pub submission: Submission,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpvoteRequest {
    pub participant_id: ParticipantId,
}

/// Moderation patch; absent fields are left alone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateRequest {
    #[serde(default)]
    pub is_approved: Option<bool>,
    #[serde(default)]
    pub is_answered: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultsQuery {
    #[serde(default)]
    pub filter: Option<QaFilter>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetViewRequest {
    pub view: ViewPreference,
}

/// Stateless aggregation of an externally supplied response set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRequest {
    pub slide: Slide,
    #[serde(default)]
    pub responses: Vec<ResponseEvent>,
    #[serde(default)]
    pub state: SlideState,
    #[serde(default)]
    pub policy: Option<DuplicatePolicy>,
    #[serde(default)]
    pub filter: Option<QaFilter>,
    #[serde(default)]
    pub limit: Option<usize>,
}

// ========== Responses ==========

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlideInfo {
    #[serde(flatten)]
    pub slide: Slide,
    pub state: SlideState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: SessionId,
    pub title: String,
    pub join_code: JoinCode,
    pub created_at: DateTime<Utc>,
    pub slides: Vec<SlideInfo>,
}

impl From<&Session> for SessionInfo {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            title: session.title.clone(),
            join_code: session.join_code.clone(),
            created_at: session.created_at,
            slides: session
                .slides
                .iter()
                .map(|slide| {
                    let state = session.slide_state(&slide.id);
                    SlideInfo {
                        slide: if state.shows_correct_answer() {
                            slide.clone()
                        } else {
                            slide.without_answer()
                        },
                        state,
                    }
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinInfo {
    pub session_id: SessionId,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlideStateChanged {
    pub slide_id: SlideId,
    pub previous: SlideState,
    pub state: SlideState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpvoteResult {
    pub response: ResponseEvent,
    /// Whether the participant now upvotes the question
    pub upvoted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantStatus {
    pub participant_id: ParticipantId,
    pub slide_id: SlideId,
    pub has_answered: bool,
    pub view: ViewPreference,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateResponse {
    pub aggregate: AggregateResult,
    pub results: SlideResults,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_wire_shape() {
        let req: SubmitResponseRequest = serde_json::from_str(
            r#"{"participantId": "p1", "type": "trivia", "selectedOption": "b"}"#,
        )
        .unwrap();
        assert_eq!(req.participant_id, "p1");
        assert_eq!(
            req.submission,
            Submission::Trivia {
                selected_option: "b".to_string()
            }
        );

        let req: SubmitResponseRequest = serde_json::from_str(
            r#"{"participantId": "p2", "type": "qa", "question": "Why?", "authorName": "Ana"}"#,
        )
        .unwrap();
        assert_eq!(req.submission.submission_type(), SlideType::Qa);
        match req.submission {
            Submission::Qa { author_name, .. } => assert_eq!(author_name.as_deref(), Some("Ana")),
            other => panic!("Expected qa submission, got {:?}", other),
        }
    }

    fn session(state: SlideState) -> Session {
        let slides: Vec<Slide> = serde_json::from_value(serde_json::json!([{
            "id": "capital",
            "type": "trivia",
            "question": "Capital of Spain?",
            "options": [{"id": "a", "text": "Madrid"}, {"id": "b", "text": "París"}],
            "correctAnswer": "a",
            "correctIndex": 0
        }]))
        .unwrap();
        Session {
            id: "s".to_string(),
            title: "Deck".to_string(),
            join_code: JoinCode::parse("123456").unwrap(),
            created_at: chrono::Utc::now(),
            slides,
            slide_states: [("capital".to_string(), state)].into_iter().collect(),
        }
    }

    #[test]
    fn test_session_info_hides_answer_until_reveal() {
        for state in [SlideState::Lobby, SlideState::Show, SlideState::Locked] {
            let json = serde_json::to_value(SessionInfo::from(&session(state))).unwrap();
            let slide = &json["slides"][0];
            assert!(slide.get("correctAnswer").is_none());
            assert!(slide.get("correctIndex").is_none());
            assert_eq!(slide["options"][1]["text"], "París");
        }

        let json = serde_json::to_value(SessionInfo::from(&session(SlideState::Reveal))).unwrap();
        assert_eq!(json["slides"][0]["correctAnswer"], "a");
        assert_eq!(json["slides"][0]["correctIndex"], 0);
    }

    #[test]
    fn test_moderate_request_partial() {
        let req: ModerateRequest = serde_json::from_str(r#"{"isAnswered": true}"#).unwrap();
        assert_eq!(req.is_answered, Some(true));
        assert_eq!(req.is_approved, None);
    }

    #[test]
    fn test_aggregate_request_defaults() {
        let req: AggregateRequest = serde_json::from_str(
            r#"{"slide": {"id": "q", "type": "qa", "prompt": "Ask"}}"#,
        )
        .unwrap();
        assert!(req.responses.is_empty());
        assert_eq!(req.state, SlideState::Lobby);
        assert!(req.filter.is_none());
        assert!(req.policy.is_none());
    }
}
