//! Response aggregation
//!
//! Turns the authoritative response set for one slide into the numbers the
//! result views need: per-option counts for trivia, word frequencies for word
//! clouds and the all/approved/answered subsets for Q&A. Everything here is
//! pure; callers recompute from the full current set on every change.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::error::AggregateError;
use crate::types::{
    QaQuestion, ResponseEvent, ResponsePayload, Slide, SlideContent, SlideId, TriviaSlide,
    WordCloudSlide,
};

/// What to do when one participant answered the same trivia or word cloud
/// slide more than once
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Latest timestamp counts
    #[default]
    LastWriteWins,
    /// Earliest timestamp counts
    FirstWriteWins,
    /// Any duplicate rejects the whole batch
    Reject,
}

impl DuplicatePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "last" | "last_write_wins" => Some(Self::LastWriteWins),
            "first" | "first_write_wins" => Some(Self::FirstWriteWins),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TriviaAggregate {
    pub slide_id: SlideId,
    /// Aligned with the slide's options
    pub counts: Vec<u32>,
    /// Distinct participant responses considered
    pub total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WordCount {
    pub word: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WordCloudAggregate {
    pub slide_id: SlideId,
    /// Most frequent first, ties alphabetical
    pub words: Vec<WordCount>,
    pub participants: u32,
}

/// Sizes of the three Q&A subsets
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QaCounts {
    pub all: usize,
    pub approved: usize,
    pub answered: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QaFilter {
    #[default]
    All,
    Approved,
    Answered,
}

/// Q&A questions split into non-exclusive subsets
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QaAggregate {
    pub slide_id: SlideId,
    pub all: Vec<ResponseEvent>,
    pub approved: Vec<ResponseEvent>,
    pub answered: Vec<ResponseEvent>,
}

impl QaAggregate {
    pub fn counts(&self) -> QaCounts {
        QaCounts {
            all: self.all.len(),
            approved: self.approved.len(),
            answered: self.answered.len(),
        }
    }

    pub fn subset(&self, filter: QaFilter) -> &[ResponseEvent] {
        match filter {
            QaFilter::All => &self.all,
            QaFilter::Approved => &self.approved,
            QaFilter::Answered => &self.answered,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AggregateResult {
    Trivia(TriviaAggregate),
    WordCloud(WordCloudAggregate),
    Qa(QaAggregate),
}

/// Aggregate one slide's responses.
///
/// Every response must belong to `slide` and carry the slide's type; a single
/// offender rejects the batch. An empty batch yields a zero-valued aggregate.
pub fn aggregate(
    slide: &Slide,
    responses: &[ResponseEvent],
    policy: DuplicatePolicy,
) -> Result<AggregateResult, AggregateError> {
    validate_batch(slide, responses)?;

    let result = match &slide.content {
        SlideContent::Trivia(trivia) => {
            AggregateResult::Trivia(aggregate_trivia(&slide.id, trivia, responses, policy)?)
        }
        SlideContent::WordCloud(cloud) => {
            AggregateResult::WordCloud(aggregate_word_cloud(&slide.id, cloud, responses, policy)?)
        }
        SlideContent::Qa(_) => AggregateResult::Qa(aggregate_qa(&slide.id, responses)),
    };

    Ok(result)
}

pub(crate) fn validate_batch(slide: &Slide, responses: &[ResponseEvent]) -> Result<(), AggregateError> {
    let expected = slide.slide_type();
    for response in responses {
        if response.slide_id != slide.id {
            return Err(AggregateError::SlideMismatch {
                response_id: response.id.clone(),
                expected: slide.id.clone(),
                found: response.slide_id.clone(),
            });
        }
        let found = response.response_type();
        if found != expected {
            return Err(AggregateError::TypeMismatch {
                response_id: response.id.clone(),
                expected,
                found,
            });
        }
    }
    Ok(())
}

/// Keep one response per participant, returned in batch order
fn resolve_duplicates(
    responses: &[ResponseEvent],
    policy: DuplicatePolicy,
) -> Result<Vec<&ResponseEvent>, AggregateError> {
    let mut chosen: HashMap<&str, usize> = HashMap::new();

    for (idx, response) in responses.iter().enumerate() {
        match chosen.entry(response.participant_id.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert(idx);
            }
            Entry::Occupied(mut slot) => {
                let current = &responses[*slot.get()];
                // Equal timestamps fall back to batch order
                let replace = match policy {
                    DuplicatePolicy::LastWriteWins => response.timestamp >= current.timestamp,
                    DuplicatePolicy::FirstWriteWins => response.timestamp < current.timestamp,
                    DuplicatePolicy::Reject => {
                        return Err(AggregateError::DuplicateResponse(
                            response.participant_id.clone(),
                        ))
                    }
                };
                if replace {
                    slot.insert(idx);
                }
            }
        }
    }

    let mut winners: Vec<usize> = chosen.into_values().collect();
    winners.sort_unstable();
    Ok(winners.into_iter().map(|idx| &responses[idx]).collect())
}

/// Trivia counts for an already validated batch
pub(crate) fn aggregate_trivia(
    slide_id: &SlideId,
    trivia: &TriviaSlide,
    responses: &[ResponseEvent],
    policy: DuplicatePolicy,
) -> Result<TriviaAggregate, AggregateError> {
    let survivors = resolve_duplicates(responses, policy)?;

    let mut counts = vec![0u32; trivia.options.len()];
    for response in &survivors {
        if let ResponsePayload::Trivia(answer) = &response.payload {
            // Unknown option ids still count toward the total
            if let Some(pos) = trivia
                .options
                .iter()
                .position(|o| o.id == answer.selected_option)
            {
                counts[pos] += 1;
            }
        }
    }

    Ok(TriviaAggregate {
        slide_id: slide_id.clone(),
        counts,
        total: survivors.len() as u32,
    })
}

/// Trimmed, lower-cased word or `None` when nothing is left
pub fn normalize_word(raw: &str) -> Option<String> {
    let word = raw.trim().to_lowercase();
    if word.is_empty() {
        None
    } else {
        Some(word)
    }
}

/// Word frequencies for an already validated batch
pub(crate) fn aggregate_word_cloud(
    slide_id: &SlideId,
    cloud: &WordCloudSlide,
    responses: &[ResponseEvent],
    policy: DuplicatePolicy,
) -> Result<WordCloudAggregate, AggregateError> {
    let survivors = resolve_duplicates(responses, policy)?;

    let mut tally: HashMap<String, u32> = HashMap::new();
    for response in &survivors {
        if let ResponsePayload::WordCloud(entry) = &response.payload {
            // Repeats do not use up the participant's word allowance
            let mut seen = HashSet::new();
            for word in entry
                .words
                .iter()
                .filter_map(|w| normalize_word(w))
                .filter(|w| seen.insert(w.clone()))
                .take(cloud.max_words_per_response)
            {
                *tally.entry(word).or_insert(0) += 1;
            }
        }
    }

    let mut words: Vec<WordCount> = tally
        .into_iter()
        .map(|(word, count)| WordCount { word, count })
        .collect();
    words.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));

    Ok(WordCloudAggregate {
        slide_id: slide_id.clone(),
        words,
        participants: survivors.len() as u32,
    })
}

pub(crate) fn aggregate_qa(slide_id: &SlideId, responses: &[ResponseEvent]) -> QaAggregate {
    let matching = |pred: fn(&QaQuestion) -> bool| -> Vec<ResponseEvent> {
        responses
            .iter()
            .filter(|r| r.as_question().is_some_and(pred))
            .cloned()
            .collect()
    };

    QaAggregate {
        slide_id: slide_id.clone(),
        all: responses.to_vec(),
        approved: matching(|q| q.is_approved),
        answered: matching(|q| q.is_answered),
    }
}
