use super::AppState;
use crate::error::ApiError;
use crate::protocol::SlideStateChanged;
use crate::types::*;

impl AppState {
    /// Check if a slide state transition is valid
    fn is_valid_slide_transition(from: SlideState, to: SlideState) -> bool {
        use SlideState::*;

        match (from, to) {
            // Forward flow, skipping ahead allowed
            (Lobby, Show | Locked | Reveal) => true,
            (Show, Locked | Reveal) => true,
            (Locked, Reveal) => true,

            // Back to the lobby resets the slide
            (_, Lobby) => true,

            _ => false,
        }
    }

    /// Move a slide through its lifecycle.
    ///
    /// Re-sending the current state is a no-op. Moving back to `lobby` clears
    /// the slide's responses and answered markers.
    pub async fn set_slide_state(
        &self,
        session_id: &str,
        slide_id: &str,
        to: SlideState,
    ) -> Result<SlideStateChanged, ApiError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| ApiError::NotFound(format!("session {}", session_id)))?;
        if session.slide(slide_id).is_none() {
            return Err(ApiError::NotFound(format!("slide {}", slide_id)));
        }

        let from = session.slide_state(slide_id);
        if from == to {
            return Ok(SlideStateChanged {
                slide_id: slide_id.to_string(),
                previous: from,
                state: to,
            });
        }

        if !Self::is_valid_slide_transition(from, to) {
            tracing::warn!(
                "Rejected slide transition {:?} -> {:?} for slide {}",
                from,
                to,
                slide_id
            );
            return Err(ApiError::InvalidTransition { from, to });
        }

        session.slide_states.insert(slide_id.to_string(), to);
        drop(sessions);

        if to == SlideState::Lobby {
            self.reset_slide(session_id, slide_id).await;
        }

        tracing::info!(
            "Slide {} in session {}: {:?} -> {:?}",
            slide_id,
            session_id,
            from,
            to
        );

        Ok(SlideStateChanged {
            slide_id: slide_id.to_string(),
            previous: from,
            state: to,
        })
    }
}
