//! Result views
//!
//! Runs a slide's responses through aggregation, reveal gating and ranking and
//! produces the [`SlideResults`] a rendering surface consumes.

use serde::Serialize;

use crate::aggregate::{
    aggregate_qa, aggregate_trivia, aggregate_word_cloud, validate_batch, DuplicatePolicy,
    QaCounts, QaFilter, WordCount,
};
use crate::chart::ChartData;
use crate::error::AggregateError;
use crate::ranking::rank;
use crate::types::{ResponseEvent, Slide, SlideContent, SlideId, SlideState};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum SlideResults {
    Trivia {
        slide_id: SlideId,
        state: SlideState,
        revealed: bool,
        question: String,
        /// Option texts are always visible
        labels: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        chart: Option<ChartData>,
        #[serde(skip_serializing_if = "Option::is_none")]
        percentages: Option<Vec<u32>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        bar_widths: Option<Vec<u32>>,
    },
    WordCloud {
        slide_id: SlideId,
        state: SlideState,
        revealed: bool,
        prompt: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        words: Option<Vec<WordCount>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        participants: Option<u32>,
    },
    Qa {
        slide_id: SlideId,
        state: SlideState,
        prompt: String,
        counts: QaCounts,
        filter: QaFilter,
        /// Ranked questions of `filter`, at most `limit`
        questions: Vec<ResponseEvent>,
    },
}

impl SlideResults {
    pub fn slide_id(&self) -> &str {
        match self {
            SlideResults::Trivia { slide_id, .. }
            | SlideResults::WordCloud { slide_id, .. }
            | SlideResults::Qa { slide_id, .. } => slide_id,
        }
    }
}

/// Q&A subset listed when the caller names none. Moderated slides only list
/// approved questions.
pub fn default_filter(slide: &Slide) -> QaFilter {
    match &slide.content {
        SlideContent::Qa(qa) if qa.moderation_enabled => QaFilter::Approved,
        _ => QaFilter::All,
    }
}

/// Build the results view for one slide in its current state.
///
/// Trivia counts and word frequencies are withheld unless the state reveals
/// them. Q&A lists are never withheld.
pub fn build_results(
    slide: &Slide,
    responses: &[ResponseEvent],
    state: SlideState,
    policy: DuplicatePolicy,
    filter: QaFilter,
    limit: usize,
) -> Result<SlideResults, AggregateError> {
    validate_batch(slide, responses)?;
    let revealed = state.is_revealed();

    let results = match &slide.content {
        SlideContent::Trivia(trivia) => {
            let aggregate = aggregate_trivia(&slide.id, trivia, responses, policy)?;
            let chart = revealed.then(|| ChartData::for_trivia(trivia, &aggregate, state));
            SlideResults::Trivia {
                slide_id: slide.id.clone(),
                state,
                revealed,
                question: trivia.question.clone(),
                labels: trivia.options.iter().map(|o| o.text.clone()).collect(),
                percentages: chart.as_ref().map(ChartData::percentages),
                bar_widths: chart.as_ref().map(ChartData::bar_widths),
                chart,
            }
        }
        SlideContent::WordCloud(cloud) => {
            let aggregate = aggregate_word_cloud(&slide.id, cloud, responses, policy)?;
            SlideResults::WordCloud {
                slide_id: slide.id.clone(),
                state,
                revealed,
                prompt: cloud.prompt.clone(),
                participants: revealed.then_some(aggregate.participants),
                words: revealed.then_some(aggregate.words),
            }
        }
        SlideContent::Qa(qa) => {
            let aggregate = aggregate_qa(&slide.id, responses);
            let questions = rank(aggregate.subset(filter))
                .top(limit)
                .cloned()
                .collect();
            SlideResults::Qa {
                slide_id: slide.id.clone(),
                state,
                prompt: qa.prompt.clone(),
                counts: aggregate.counts(),
                filter,
                questions,
            }
        }
    };

    Ok(results)
}
