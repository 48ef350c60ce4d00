//! Participant-local state
//!
//! The "has answered" marker per slide and the preferred results view live
//! behind [`ParticipantStore`] so aggregation never reaches for global state.
//! The service keeps one [`MemoryStore`] per participant.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::types::SlideId;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ViewPreference {
    #[default]
    Chart,
    List,
}

pub trait ParticipantStore: Send + Sync {
    fn has_answered(&self, slide_id: &str) -> bool;

    fn mark_answered(&mut self, slide_id: &str);

    /// Forget the answered marker for one slide
    fn reset_slide(&mut self, slide_id: &str);

    fn view_preference(&self) -> ViewPreference;

    fn set_view_preference(&mut self, preference: ViewPreference);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    answered: HashSet<SlideId>,
    view: ViewPreference,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ParticipantStore for MemoryStore {
    fn has_answered(&self, slide_id: &str) -> bool {
        self.answered.contains(slide_id)
    }

    fn mark_answered(&mut self, slide_id: &str) {
        self.answered.insert(slide_id.to_string());
    }

    fn reset_slide(&mut self, slide_id: &str) {
        self.answered.remove(slide_id);
    }

    fn view_preference(&self) -> ViewPreference {
        self.view
    }

    fn set_view_preference(&mut self, preference: ViewPreference) {
        self.view = preference;
    }
}
