//! Q&A ranking
//!
//! Most upvoted first; ties go to the earlier question, then to the smaller
//! response id so the order is total.

use crate::types::ResponseEvent;

/// Read-only ranked view over a borrowed response set.
///
/// Holds positions rather than copies; iterate as often as needed.
#[derive(Debug, Clone)]
pub struct RankedQuestions<'a> {
    responses: &'a [ResponseEvent],
    order: Vec<usize>,
}

/// Rank the Q&A questions in `responses`. Non-Q&A responses are skipped.
pub fn rank(responses: &[ResponseEvent]) -> RankedQuestions<'_> {
    let mut order: Vec<usize> = responses
        .iter()
        .enumerate()
        .filter(|(_, r)| r.as_question().is_some())
        .map(|(idx, _)| idx)
        .collect();

    order.sort_by(|&a, &b| {
        let (ra, rb) = (&responses[a], &responses[b]);
        rb.upvote_count()
            .cmp(&ra.upvote_count())
            .then_with(|| ra.timestamp.cmp(&rb.timestamp))
            .then_with(|| ra.id.cmp(&rb.id))
    });

    RankedQuestions { responses, order }
}

impl<'a> RankedQuestions<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &'a ResponseEvent> + '_ {
        let responses = self.responses;
        self.order.iter().map(move |&idx| &responses[idx])
    }

    pub fn top(&self, n: usize) -> impl Iterator<Item = &'a ResponseEvent> + '_ {
        self.iter().take(n)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
