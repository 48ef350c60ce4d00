//! Reveal gating and result arithmetic
//!
//! Counts and bars are visible while a slide is shown or revealed; the
//! correct-answer highlight only on reveal. Percentages and bar widths never
//! divide by zero.

use crate::types::{SlideState, TriviaSlide};

/// Minimum bar width so empty options still render a sliver
pub const MIN_BAR_WIDTH: u32 = 3;

impl SlideState {
    /// Whether counts and percentages may be shown
    pub fn is_revealed(self) -> bool {
        matches!(self, SlideState::Show | SlideState::Reveal)
    }

    /// Whether the correct option may be highlighted
    pub fn shows_correct_answer(self) -> bool {
        self == SlideState::Reveal
    }
}

/// Position of the correct option.
///
/// An in-range `correct_index` wins; otherwise `correct_answer` is looked up
/// among the options. `None` means nothing to highlight.
pub fn resolve_correct_index(trivia: &TriviaSlide) -> Option<usize> {
    if let Some(index) = trivia.correct_index {
        if index < trivia.options.len() {
            return Some(index);
        }
        tracing::warn!(
            "correctIndex {} out of range for {} options",
            index,
            trivia.options.len()
        );
    }

    let answer = trivia.correct_answer.as_ref()?;
    trivia.options.iter().position(|o| &o.id == answer)
}

/// Integer ratio rounded half up, 0 for an empty denominator
fn rounded_percent(numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return 0;
    }
    let n = u64::from(numerator);
    let d = u64::from(denominator);
    ((200 * n + d) / (2 * d)) as u32
}

/// `round(count / total * 100)`, clamped to 0..=100
pub fn percentage(count: u32, total: u32) -> u32 {
    rounded_percent(count, total).min(100)
}

/// Bar width relative to the leading option, floored at [`MIN_BAR_WIDTH`]
pub fn bar_width(count: u32, max_count: u32) -> u32 {
    rounded_percent(count, max_count.max(1))
        .min(100)
        .max(MIN_BAR_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TriviaOption;

    fn slide(correct_answer: Option<&str>, correct_index: Option<usize>) -> TriviaSlide {
        TriviaSlide {
            question: "Q".to_string(),
            options: ["a", "b", "c"]
                .iter()
                .map(|id| TriviaOption {
                    id: id.to_string(),
                    text: id.to_uppercase(),
                })
                .collect(),
            correct_answer: correct_answer.map(str::to_string),
            correct_index,
            time_limit: None,
        }
    }

    #[test]
    fn test_reveal_gating() {
        assert!(!SlideState::Lobby.is_revealed());
        assert!(SlideState::Show.is_revealed());
        assert!(!SlideState::Locked.is_revealed());
        assert!(SlideState::Reveal.is_revealed());

        assert!(!SlideState::Lobby.shows_correct_answer());
        assert!(!SlideState::Show.shows_correct_answer());
        assert!(!SlideState::Locked.shows_correct_answer());
        assert!(SlideState::Reveal.shows_correct_answer());
    }

    #[test]
    fn test_correct_index_preferred_over_answer() {
        assert_eq!(resolve_correct_index(&slide(Some("a"), Some(2))), Some(2));
    }

    #[test]
    fn test_correct_answer_resolved_by_id() {
        assert_eq!(resolve_correct_index(&slide(Some("b"), None)), Some(1));
    }

    #[test]
    fn test_unknown_correct_answer_is_none() {
        assert_eq!(resolve_correct_index(&slide(Some("zzz"), None)), None);
        assert_eq!(resolve_correct_index(&slide(None, None)), None);
    }

    #[test]
    fn test_out_of_range_index_falls_back_to_answer() {
        assert_eq!(resolve_correct_index(&slide(Some("c"), Some(7))), Some(2));
        assert_eq!(resolve_correct_index(&slide(None, Some(7))), None);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(1, 1), 100);
        assert_eq!(percentage(0, 1), 0);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        // Half rounds up
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(1, 200), 1);
    }

    #[test]
    fn test_percentage_zero_total() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(5, 0), 0);
    }

    #[test]
    fn test_percentage_stays_in_range() {
        for total in 0..50u32 {
            for count in 0..=total {
                assert!(percentage(count, total) <= 100);
            }
        }
        // Inconsistent input never exceeds 100
        assert_eq!(percentage(9, 3), 100);
    }

    #[test]
    fn test_percentages_may_not_sum_to_100() {
        let counts = [1u32, 1, 1];
        let sum: u32 = counts.iter().map(|c| percentage(*c, 3)).sum();
        assert_eq!(sum, 99);
    }

    #[test]
    fn test_bar_width() {
        assert_eq!(bar_width(10, 10), 100);
        assert_eq!(bar_width(5, 10), 50);
        assert_eq!(bar_width(0, 10), MIN_BAR_WIDTH);
        assert_eq!(bar_width(0, 0), MIN_BAR_WIDTH);
        // A lone vote is a full bar
        assert_eq!(bar_width(1, 0), 100);
        assert_eq!(bar_width(1, 50), MIN_BAR_WIDTH);
    }
}
