mod participant;
mod response;
mod session;
mod slide;
mod view;

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::store::MemoryStore;
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Responses are stored per slide of a session
pub type SlideKey = (SessionId, SlideId);

/// Participant-local state is kept per session
pub type ParticipantKey = (SessionId, ParticipantId);

/// Shared application state.
///
/// Lock order: sessions, join_codes, responses, participants.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
    pub join_codes: Arc<RwLock<HashMap<JoinCode, SessionId>>>,
    pub responses: Arc<RwLock<HashMap<SlideKey, Vec<ResponseEvent>>>>,
    pub participants: Arc<RwLock<HashMap<ParticipantKey, MemoryStore>>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            join_codes: Arc::new(RwLock::new(HashMap::new())),
            responses: Arc::new(RwLock::new(HashMap::new())),
            participants: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

fn slide_key(session_id: &str, slide_id: &str) -> SlideKey {
    (session_id.to_string(), slide_id.to_string())
}

/// Look up a slide and its current state inside a locked session map
fn find_slide<'a>(
    sessions: &'a HashMap<SessionId, Session>,
    session_id: &str,
    slide_id: &str,
) -> Result<(&'a Slide, SlideState), ApiError> {
    let session = sessions
        .get(session_id)
        .ok_or_else(|| ApiError::NotFound(format!("session {}", session_id)))?;
    let slide = session
        .slide(slide_id)
        .ok_or_else(|| ApiError::NotFound(format!("slide {}", slide_id)))?;
    Ok((slide, session.slide_state(slide_id)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::protocol::Submission;

    pub(crate) fn deck() -> Vec<Slide> {
        serde_json::from_value(serde_json::json!([
            {
                "id": "capital",
                "type": "trivia",
                "question": "Capital of Spain?",
                "options": [
                    {"id": "a", "text": "Madrid"},
                    {"id": "b", "text": "París"},
                    {"id": "c", "text": "Roma"}
                ],
                "correctAnswer": "a"
            },
            {"id": "cloud", "type": "wordcloud", "prompt": "Describe Rust", "maxWordsPerResponse": 2},
            {"id": "ask", "type": "qa", "prompt": "Questions?", "anonymousAllowed": false}
        ]))
        .unwrap()
    }

    pub(crate) async fn session_with_deck(state: &AppState) -> Session {
        state
            .create_session("Demo deck".to_string(), deck())
            .await
            .unwrap()
    }

    pub(crate) fn pick(option: &str) -> Submission {
        Submission::Trivia {
            selected_option: option.to_string(),
        }
    }

    pub(crate) fn ask(question: &str) -> Submission {
        Submission::Qa {
            question: question.to_string(),
            author_name: Some("Ana".to_string()),
        }
    }

    #[tokio::test]
    async fn test_find_slide() {
        let state = AppState::default();
        let session = session_with_deck(&state).await;
        let sessions = state.sessions.read().await;

        let (slide, slide_state) = find_slide(&sessions, &session.id, "cloud").unwrap();
        assert_eq!(slide.slide_type(), SlideType::WordCloud);
        assert_eq!(slide_state, SlideState::Lobby);

        assert!(matches!(
            find_slide(&sessions, &session.id, "missing"),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            find_slide(&sessions, "missing", "cloud"),
            Err(ApiError::NotFound(_))
        ));
    }
}
