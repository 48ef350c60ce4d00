use super::{find_slide, slide_key, AppState};
use crate::aggregate::QaFilter;
use crate::error::ApiError;
use crate::results::{build_results, default_filter, SlideResults};

impl AppState {
    /// Results view for a slide in its current state.
    ///
    /// `limit` caps the Q&A list and defaults to the configured top-N. Without a
    /// `filter`, moderated Q&A slides list approved questions only.
    pub async fn slide_results(
        &self,
        session_id: &str,
        slide_id: &str,
        filter: Option<QaFilter>,
        limit: Option<usize>,
    ) -> Result<SlideResults, ApiError> {
        let sessions = self.sessions.read().await;
        let (slide, slide_state) = find_slide(&sessions, session_id, slide_id)?;

        let responses = self.responses.read().await;
        let batch = responses
            .get(&slide_key(session_id, slide_id))
            .map(Vec::as_slice)
            .unwrap_or_default();

        let results = build_results(
            slide,
            batch,
            slide_state,
            self.config.duplicate_policy,
            filter.unwrap_or_else(|| default_filter(slide)),
            limit.unwrap_or(self.config.qa_top_n),
        )
        .map_err(|e| {
            tracing::warn!("Aggregation failed for slide {}: {}", slide_id, e);
            ApiError::from(e)
        })?;

        Ok(results)
    }
}
