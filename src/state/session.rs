use super::AppState;
use crate::error::ApiError;
use crate::store::ParticipantStore;
use crate::types::*;
use std::collections::{HashMap, HashSet};

/// Attempts at finding a free join code before giving up
const MAX_JOIN_CODE_ATTEMPTS: usize = 32;

impl AppState {
    /// Create a session for a deck and assign it a fresh join code
    pub async fn create_session(
        &self,
        title: String,
        slides: Vec<Slide>,
    ) -> Result<Session, ApiError> {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(ApiError::InvalidInput("title must not be empty".to_string()));
        }
        validate_deck(&slides)?;

        let mut sessions = self.sessions.write().await;
        let mut join_codes = self.join_codes.write().await;

        let join_code = free_join_code(&join_codes).ok_or(ApiError::JoinCodesExhausted)?;

        let session = Session {
            id: ulid::Ulid::new().to_string(),
            title,
            join_code: join_code.clone(),
            created_at: chrono::Utc::now(),
            slides,
            slide_states: HashMap::new(),
        };

        join_codes.insert(join_code, session.id.clone());
        sessions.insert(session.id.clone(), session.clone());

        tracing::info!(
            "Created session {} ({} slides, join code {})",
            session.id,
            session.slides.len(),
            session.join_code
        );
        Ok(session)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Session, ApiError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("session {}", session_id)))
    }

    /// Resolve an audience-typed join code to its session
    pub async fn join(&self, code: &str) -> Result<Session, ApiError> {
        let join_code =
            JoinCode::parse(code).ok_or_else(|| ApiError::InvalidJoinCode(code.to_string()))?;

        let sessions = self.sessions.read().await;
        let session_id = self
            .join_codes
            .read()
            .await
            .get(&join_code)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("join code {}", join_code)))?;

        sessions
            .get(&session_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("session {}", session_id)))
    }

    /// End a session and drop everything that belongs to it
    pub async fn end_session(&self, session_id: &str) -> Result<(), ApiError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .remove(session_id)
            .ok_or_else(|| ApiError::NotFound(format!("session {}", session_id)))?;

        self.join_codes.write().await.remove(&session.join_code);
        self.responses
            .write()
            .await
            .retain(|(sid, _), _| sid != session_id);
        self.participants
            .write()
            .await
            .retain(|(sid, _), _| sid != session_id);

        tracing::info!("Ended session {} (join code {})", session.id, session.join_code);
        Ok(())
    }

    /// Clear a slide's responses and every participant's answered marker for it
    pub(crate) async fn reset_slide(&self, session_id: &str, slide_id: &str) {
        let removed = self
            .responses
            .write()
            .await
            .remove(&super::slide_key(session_id, slide_id))
            .map_or(0, |r| r.len());

        let mut participants = self.participants.write().await;
        for ((sid, _), store) in participants.iter_mut() {
            if sid == session_id {
                store.reset_slide(slide_id);
            }
        }

        tracing::info!(
            "Reset slide {} in session {} ({} responses cleared)",
            slide_id,
            session_id,
            removed
        );
    }
}

fn free_join_code(taken: &HashMap<JoinCode, SessionId>) -> Option<JoinCode> {
    let mut rng = rand::rng();
    (0..MAX_JOIN_CODE_ATTEMPTS)
        .map(|_| JoinCode::random(&mut rng))
        .find(|code| !taken.contains_key(code))
}

fn validate_deck(slides: &[Slide]) -> Result<(), ApiError> {
    if slides.is_empty() {
        return Err(ApiError::InvalidInput(
            "a session needs at least one slide".to_string(),
        ));
    }

    let mut ids = HashSet::new();
    for slide in slides {
        if slide.id.trim().is_empty() {
            return Err(ApiError::InvalidInput("slide id must not be empty".to_string()));
        }
        if !ids.insert(slide.id.as_str()) {
            return Err(ApiError::InvalidInput(format!(
                "duplicate slide id {}",
                slide.id
            )));
        }
        validate_slide(slide)?;
    }
    Ok(())
}

fn validate_slide(slide: &Slide) -> Result<(), ApiError> {
    match &slide.content {
        SlideContent::Trivia(trivia) => {
            if trivia.options.len() < 2 {
                return Err(ApiError::InvalidInput(format!(
                    "trivia slide {} needs at least two options",
                    slide.id
                )));
            }
            let mut option_ids = HashSet::new();
            for option in &trivia.options {
                if option.id.trim().is_empty() || !option_ids.insert(option.id.as_str()) {
                    return Err(ApiError::InvalidInput(format!(
                        "trivia slide {} has an empty or duplicate option id",
                        slide.id
                    )));
                }
            }
            // An unresolvable correct answer only disables the highlight
        }
        SlideContent::WordCloud(cloud) => {
            if cloud.max_words_per_response == 0 {
                return Err(ApiError::InvalidInput(format!(
                    "word cloud slide {} must accept at least one word",
                    slide.id
                )));
            }
        }
        SlideContent::Qa(_) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::tests::{deck, pick, session_with_deck};
    use super::*;

    #[tokio::test]
    async fn test_create_session() {
        let state = AppState::default();
        let session = session_with_deck(&state).await;

        assert_eq!(session.title, "Demo deck");
        assert_eq!(session.slides.len(), 3);
        assert_eq!(session.join_code.as_str().len(), JOIN_CODE_LEN);
        assert_eq!(session.slide_state("capital"), SlideState::Lobby);
        assert!(state.get_session(&session.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_join_codes_are_unique() {
        let state = AppState::default();
        let mut codes = HashSet::new();
        for _ in 0..50 {
            let session = session_with_deck(&state).await;
            assert!(codes.insert(session.join_code));
        }
    }

    #[tokio::test]
    async fn test_join_by_code() {
        let state = AppState::default();
        let session = session_with_deck(&state).await;

        let joined = state
            .join(&format!(" {} ", session.join_code))
            .await
            .unwrap();
        assert_eq!(joined.id, session.id);
    }

    #[tokio::test]
    async fn test_join_rejects_malformed_code() {
        let state = AppState::default();
        let result = state.join("12ab56").await;
        assert!(matches!(result, Err(ApiError::InvalidJoinCode(_))));
    }

    #[tokio::test]
    async fn test_join_unknown_code() {
        let state = AppState::default();
        let session = session_with_deck(&state).await;
        // Any other six-digit code is unknown
        let other = if session.join_code.as_str() == "000000" {
            "000001"
        } else {
            "000000"
        };
        assert!(matches!(state.join(other).await, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_session_validates_deck() {
        let state = AppState::default();

        let result = state.create_session("  ".to_string(), deck()).await;
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));

        let result = state.create_session("Empty".to_string(), vec![]).await;
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));

        let mut duplicated = deck();
        duplicated[1].id = "capital".to_string();
        let result = state.create_session("Dup".to_string(), duplicated).await;
        assert!(matches!(result, Err(ApiError::InvalidInput(msg)) if msg.contains("duplicate")));

        let mut one_option = deck();
        if let SlideContent::Trivia(trivia) = &mut one_option[0].content {
            trivia.options.truncate(1);
        }
        let result = state.create_session("Short".to_string(), one_option).await;
        assert!(matches!(result, Err(ApiError::InvalidInput(msg)) if msg.contains("two options")));
    }

    #[tokio::test]
    async fn test_unresolvable_correct_answer_is_accepted() {
        let state = AppState::default();
        let mut slides = deck();
        if let SlideContent::Trivia(trivia) = &mut slides[0].content {
            trivia.correct_answer = Some("nope".to_string());
        }
        assert!(state.create_session("Deck".to_string(), slides).await.is_ok());
    }

    #[tokio::test]
    async fn test_end_session_frees_everything() {
        let state = AppState::default();
        let session = session_with_deck(&state).await;
        state
            .set_slide_state(&session.id, "capital", SlideState::Show)
            .await
            .unwrap();
        state
            .submit_response(&session.id, "capital", "p1", pick("a"))
            .await
            .unwrap();

        state.end_session(&session.id).await.unwrap();

        assert!(state.get_session(&session.id).await.is_err());
        assert!(state.join(session.join_code.as_str()).await.is_err());
        assert!(state.responses.read().await.is_empty());
        assert!(state.participants.read().await.is_empty());
        assert!(matches!(
            state.end_session(&session.id).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
