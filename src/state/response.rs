use super::{find_slide, slide_key, AppState};
use crate::aggregate::{normalize_word, DuplicatePolicy};
use crate::error::ApiError;
use crate::protocol::{ModerateRequest, Submission, UpvoteResult};
use crate::store::ParticipantStore;
use crate::types::*;

impl AppState {
    /// Record one participant submission for a slide.
    ///
    /// Trivia and word cloud slides only accept answers while shown; Q&A keeps
    /// accepting questions until the slide goes back to the lobby. Repeated
    /// answers are stored as-is and resolved at aggregation time, except under
    /// [`DuplicatePolicy::Reject`] where they are refused here.
    pub async fn submit_response(
        &self,
        session_id: &str,
        slide_id: &str,
        participant_id: &str,
        submission: Submission,
    ) -> Result<ResponseEvent, ApiError> {
        let participant_id = participant_id.trim();
        if participant_id.is_empty() {
            return Err(ApiError::InvalidInput(
                "participant id must not be empty".to_string(),
            ));
        }

        let sessions = self.sessions.read().await;
        let (slide, slide_state) = find_slide(&sessions, session_id, slide_id)?;

        if !accepts_responses(slide, slide_state) {
            tracing::warn!(
                "Response from {} rejected: slide {} is {:?}",
                participant_id,
                slide_id,
                slide_state
            );
            return Err(ApiError::SlideClosed {
                slide_id: slide.id.clone(),
                state: slide_state,
            });
        }

        let payload = self.build_payload(slide, submission)?;
        let event = ResponseEvent::new(slide.id.clone(), participant_id.to_string(), payload);

        let mut responses = self.responses.write().await;
        let stored = responses.entry(slide_key(session_id, slide_id)).or_default();
        if self.config.duplicate_policy == DuplicatePolicy::Reject
            && slide.slide_type() != SlideType::Qa
            && stored.iter().any(|r| r.participant_id == participant_id)
        {
            tracing::warn!(
                "Duplicate answer from {} on slide {} refused",
                participant_id,
                slide_id
            );
            return Err(ApiError::AlreadyAnswered {
                slide_id: slide.id.clone(),
                participant_id: participant_id.to_string(),
            });
        }
        stored.push(event.clone());
        drop(responses);

        if slide.slide_type() != SlideType::Qa {
            self.participants
                .write()
                .await
                .entry((session_id.to_string(), participant_id.to_string()))
                .or_default()
                .mark_answered(slide_id);
        }

        tracing::info!(
            "Response recorded: session={}, slide={}, participant={}, type={}",
            session_id,
            slide_id,
            participant_id,
            event.response_type()
        );
        Ok(event)
    }

    /// Turn a submission into a stored payload, validating it against the slide
    fn build_payload(
        &self,
        slide: &Slide,
        submission: Submission,
    ) -> Result<ResponsePayload, ApiError> {
        match (&slide.content, submission) {
            (SlideContent::Trivia(trivia), Submission::Trivia { selected_option }) => {
                if !trivia.options.iter().any(|o| o.id == selected_option) {
                    return Err(ApiError::InvalidInput(format!(
                        "unknown option {:?}",
                        selected_option
                    )));
                }
                Ok(ResponsePayload::Trivia(TriviaAnswer { selected_option }))
            }
            (SlideContent::WordCloud(_), Submission::WordCloud { words }) => {
                if !words.iter().any(|w| normalize_word(w).is_some()) {
                    return Err(ApiError::InvalidInput(
                        "at least one word is required".to_string(),
                    ));
                }
                Ok(ResponsePayload::WordCloud(WordCloudEntry { words }))
            }
            (
                SlideContent::Qa(qa),
                Submission::Qa {
                    question,
                    author_name,
                },
            ) => {
                let text = question.trim();
                if text.is_empty() {
                    return Err(ApiError::InvalidInput(
                        "question must not be empty".to_string(),
                    ));
                }
                let max = self.config.max_question_chars;
                if text.chars().count() > max {
                    return Err(ApiError::InvalidInput(format!(
                        "question is longer than {} characters",
                        max
                    )));
                }

                let author_name = author_name
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty());
                if author_name.is_none() && !qa.anonymous_allowed {
                    return Err(ApiError::InvalidInput(
                        "anonymous questions are not allowed".to_string(),
                    ));
                }

                let mut payload = QaQuestion::new(text.to_string());
                payload.author_name = author_name;
                Ok(ResponsePayload::Qa(payload))
            }
            (_, submission) => Err(ApiError::InvalidInput(format!(
                "{} response sent to a {} slide",
                submission.submission_type(),
                slide.slide_type()
            ))),
        }
    }

    /// Toggle a participant's upvote on a Q&A question
    pub async fn toggle_upvote(
        &self,
        session_id: &str,
        slide_id: &str,
        response_id: &str,
        participant_id: &str,
    ) -> Result<UpvoteResult, ApiError> {
        let participant_id = participant_id.trim();
        if participant_id.is_empty() {
            return Err(ApiError::InvalidInput(
                "participant id must not be empty".to_string(),
            ));
        }

        let sessions = self.sessions.read().await;
        let (slide, _) = find_slide(&sessions, session_id, slide_id)?;
        match &slide.content {
            SlideContent::Qa(qa) if qa.allow_upvoting => {}
            SlideContent::Qa(_) => return Err(ApiError::UpvotingDisabled(slide.id.clone())),
            _ => {
                return Err(ApiError::InvalidInput(format!(
                    "slide {} is not a Q&A slide",
                    slide_id
                )))
            }
        }

        let mut responses = self.responses.write().await;
        let question = find_question(&mut responses, session_id, slide_id, response_id)?;

        let upvoted = if question.upvotes.remove(participant_id) {
            false
        } else {
            question.upvotes.insert(participant_id.to_string());
            true
        };

        let response = find_response(&responses, session_id, slide_id, response_id)?;
        tracing::info!(
            "Upvote {} on {} by {} (now {})",
            if upvoted { "added" } else { "withdrawn" },
            response_id,
            participant_id,
            response.upvote_count()
        );

        Ok(UpvoteResult {
            response: response.clone(),
            upvoted,
        })
    }

    /// Apply a moderation patch (approve / answer) to a Q&A question
    pub async fn moderate_question(
        &self,
        session_id: &str,
        slide_id: &str,
        response_id: &str,
        patch: ModerateRequest,
    ) -> Result<ResponseEvent, ApiError> {
        let sessions = self.sessions.read().await;
        let (slide, _) = find_slide(&sessions, session_id, slide_id)?;
        if slide.slide_type() != SlideType::Qa {
            return Err(ApiError::InvalidInput(format!(
                "slide {} is not a Q&A slide",
                slide_id
            )));
        }

        let mut responses = self.responses.write().await;
        let question = find_question(&mut responses, session_id, slide_id, response_id)?;
        if let Some(approved) = patch.is_approved {
            question.is_approved = approved;
        }
        if let Some(answered) = patch.is_answered {
            question.is_answered = answered;
        }

        tracing::info!(
            "Moderated question {}: approved={}, answered={}",
            response_id,
            question.is_approved,
            question.is_answered
        );

        find_response(&responses, session_id, slide_id, response_id).cloned()
    }
}

/// Whether a slide in `state` takes new submissions
fn accepts_responses(slide: &Slide, state: SlideState) -> bool {
    match slide.content {
        SlideContent::Qa(_) => state != SlideState::Lobby,
        _ => state == SlideState::Show,
    }
}

fn find_response<'a>(
    responses: &'a std::collections::HashMap<super::SlideKey, Vec<ResponseEvent>>,
    session_id: &str,
    slide_id: &str,
    response_id: &str,
) -> Result<&'a ResponseEvent, ApiError> {
    responses
        .get(&slide_key(session_id, slide_id))
        .and_then(|list| list.iter().find(|r| r.id == response_id))
        .ok_or_else(|| ApiError::NotFound(format!("response {}", response_id)))
}

fn find_question<'a>(
    responses: &'a mut std::collections::HashMap<super::SlideKey, Vec<ResponseEvent>>,
    session_id: &str,
    slide_id: &str,
    response_id: &str,
) -> Result<&'a mut QaQuestion, ApiError> {
    responses
        .get_mut(&slide_key(session_id, slide_id))
        .and_then(|list| list.iter_mut().find(|r| r.id == response_id))
        .and_then(ResponseEvent::as_question_mut)
        .ok_or_else(|| ApiError::NotFound(format!("question {}", response_id)))
}
