//! Chart data handed to rendering surfaces

use serde::{Deserialize, Serialize};

use crate::aggregate::TriviaAggregate;
use crate::reveal::{bar_width, percentage, resolve_correct_index};
use crate::types::{SlideState, TriviaSlide};

/// Bar chart contract for a trivia slide.
///
/// `labels` and `counts` are meant to line up index for index, but consumers
/// must not rely on it: read counts through [`ChartData::count_at`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub labels: Vec<String>,
    pub counts: Vec<u32>,
    pub total: u32,
    pub reveal_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_index: Option<usize>,
}

impl ChartData {
    pub fn for_trivia(trivia: &TriviaSlide, aggregate: &TriviaAggregate, state: SlideState) -> Self {
        Self {
            labels: trivia.options.iter().map(|o| o.text.clone()).collect(),
            counts: aggregate.counts.clone(),
            total: aggregate.total,
            reveal_correct: state.shows_correct_answer(),
            // Only present once the slide is in reveal
            correct_index: state
                .shows_correct_answer()
                .then(|| resolve_correct_index(trivia))
                .flatten(),
        }
    }

    /// Count for label `index`; missing entries read as 0
    pub fn count_at(&self, index: usize) -> u32 {
        self.counts.get(index).copied().unwrap_or(0)
    }

    pub fn max_count(&self) -> u32 {
        (0..self.labels.len())
            .map(|i| self.count_at(i))
            .max()
            .unwrap_or(0)
    }

    /// One percentage per label
    pub fn percentages(&self) -> Vec<u32> {
        (0..self.labels.len())
            .map(|i| percentage(self.count_at(i), self.total))
            .collect()
    }

    /// One bar width per label, scaled to the leading option
    pub fn bar_widths(&self) -> Vec<u32> {
        let max = self.max_count();
        (0..self.labels.len())
            .map(|i| bar_width(self.count_at(i), max))
            .collect()
    }

    pub fn is_highlighted(&self, index: usize) -> bool {
        self.reveal_correct && self.correct_index == Some(index)
    }
}
