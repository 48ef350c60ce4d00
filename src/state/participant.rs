use super::AppState;
use crate::error::ApiError;
use crate::protocol::ParticipantStatus;
use crate::store::{ParticipantStore, ViewPreference};

impl AppState {
    /// Answered marker and view preference of one participant for a slide.
    ///
    /// Participants nobody has heard from yet get the defaults.
    pub async fn participant_status(
        &self,
        session_id: &str,
        participant_id: &str,
        slide_id: &str,
    ) -> Result<ParticipantStatus, ApiError> {
        {
            let sessions = self.sessions.read().await;
            super::find_slide(&sessions, session_id, slide_id)?;
        }

        let participants = self.participants.read().await;
        let store = participants.get(&(session_id.to_string(), participant_id.to_string()));

        Ok(ParticipantStatus {
            participant_id: participant_id.to_string(),
            slide_id: slide_id.to_string(),
            has_answered: store.is_some_and(|s| s.has_answered(slide_id)),
            view: store.map(|s| s.view_preference()).unwrap_or_default(),
        })
    }

    pub async fn set_view_preference(
        &self,
        session_id: &str,
        participant_id: &str,
        view: ViewPreference,
    ) -> Result<ViewPreference, ApiError> {
        let participant_id = participant_id.trim();
        if participant_id.is_empty() {
            return Err(ApiError::InvalidInput(
                "participant id must not be empty".to_string(),
            ));
        }
        if !self.sessions.read().await.contains_key(session_id) {
            return Err(ApiError::NotFound(format!("session {}", session_id)));
        }

        self.participants
            .write()
            .await
            .entry((session_id.to_string(), participant_id.to_string()))
            .or_default()
            .set_view_preference(view);

        tracing::debug!("Participant {} prefers {:?} view", participant_id, view);
        Ok(view)
    }
}
