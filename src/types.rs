use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Opaque ID types for type safety
pub type SessionId = String;
pub type SlideId = String;
pub type OptionId = String;
pub type ResponseId = String;
pub type ParticipantId = String;

/// Lifecycle of a presented slide. Ordered: lobby < show < locked < reveal.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum SlideState {
    #[default]
    Lobby,
    Show,
    Locked,
    Reveal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SlideType {
    Trivia,
    WordCloud,
    Qa,
}

impl fmt::Display for SlideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlideType::Trivia => "trivia",
            SlideType::WordCloud => "wordcloud",
            SlideType::Qa => "qa",
        };
        f.write_str(name)
    }
}

// ========== Slides ==========

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriviaOption {
    pub id: OptionId,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TriviaSlide {
    pub question: String,
    pub options: Vec<TriviaOption>,
    /// Option id of the correct answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<OptionId>,
    /// Explicit position of the correct answer; wins over `correct_answer`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_index: Option<usize>,
    /// Seconds the audience has to answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WordCloudSlide {
    pub prompt: String,
    #[serde(default = "default_max_words")]
    pub max_words_per_response: usize,
}

fn default_max_words() -> usize {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QaSlide {
    pub prompt: String,
    #[serde(default = "default_true")]
    pub allow_upvoting: bool,
    #[serde(default)]
    pub moderation_enabled: bool,
    #[serde(default = "default_true")]
    pub anonymous_allowed: bool,
}

fn default_true() -> bool {
    true
}

/// Type-specific slide payload, tagged by `type` on the wire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SlideContent {
    Trivia(TriviaSlide),
    WordCloud(WordCloudSlide),
    Qa(QaSlide),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slide {
    pub id: SlideId,
    #[serde(flatten)]
    pub content: SlideContent,
}

impl Slide {
    pub fn slide_type(&self) -> SlideType {
        match self.content {
            SlideContent::Trivia(_) => SlideType::Trivia,
            SlideContent::WordCloud(_) => SlideType::WordCloud,
            SlideContent::Qa(_) => SlideType::Qa,
        }
    }

    /// Copy of the slide without its correct answer, as the audience may see it
    pub fn without_answer(&self) -> Slide {
        let mut slide = self.clone();
        if let SlideContent::Trivia(trivia) = &mut slide.content {
            trivia.correct_answer = None;
            trivia.correct_index = None;
        }
        slide
    }
}

// ========== Responses ==========

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TriviaAnswer {
    pub selected_option: OptionId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WordCloudEntry {
    pub words: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QaQuestion {
    pub question: String,
    /// Participants who endorsed this question
    #[serde(default)]
    pub upvotes: BTreeSet<ParticipantId>,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default)]
    pub is_answered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}

impl QaQuestion {
    pub fn new(question: String) -> Self {
        Self {
            question,
            upvotes: BTreeSet::new(),
            is_approved: false,
            is_answered: false,
            author_name: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResponsePayload {
    Trivia(TriviaAnswer),
    WordCloud(WordCloudEntry),
    Qa(QaQuestion),
}

impl ResponsePayload {
    pub fn response_type(&self) -> SlideType {
        match self {
            ResponsePayload::Trivia(_) => SlideType::Trivia,
            ResponsePayload::WordCloud(_) => SlideType::WordCloud,
            ResponsePayload::Qa(_) => SlideType::Qa,
        }
    }
}

/// One audience submission for a slide
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEvent {
    pub id: ResponseId,
    pub slide_id: SlideId,
    pub participant_id: ParticipantId,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

impl ResponseEvent {
    pub fn new(slide_id: SlideId, participant_id: ParticipantId, payload: ResponsePayload) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            slide_id,
            participant_id,
            timestamp: Utc::now(),
            payload,
        }
    }

    pub fn response_type(&self) -> SlideType {
        self.payload.response_type()
    }

    pub fn as_question(&self) -> Option<&QaQuestion> {
        match &self.payload {
            ResponsePayload::Qa(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_question_mut(&mut self) -> Option<&mut QaQuestion> {
        match &mut self.payload {
            ResponsePayload::Qa(q) => Some(q),
            _ => None,
        }
    }

    /// Upvote count; zero for anything that is not a Q&A question
    pub fn upvote_count(&self) -> usize {
        self.as_question().map_or(0, |q| q.upvotes.len())
    }
}

// ========== Join Codes ==========

pub const JOIN_CODE_LEN: usize = 6;

/// Six-digit numeric code the audience types to find a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JoinCode(String);

impl JoinCode {
    /// Parse user input, tolerating surrounding whitespace
    pub fn parse(input: &str) -> Option<Self> {
        let code = input.trim();
        if code.len() == JOIN_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(code.to_string()))
        } else {
            None
        }
    }

    pub fn random<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        Self(format!("{:06}", rng.random_range(0..1_000_000u32)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for JoinCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid join code: {:?}", value))
    }
}

impl From<JoinCode> for String {
    fn from(code: JoinCode) -> Self {
        code.0
    }
}

impl fmt::Display for JoinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ========== Sessions ==========

/// A live presentation the audience can join
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    pub join_code: JoinCode,
    pub created_at: DateTime<Utc>,
    pub slides: Vec<Slide>,
    /// Slides absent from the map are in the lobby
    #[serde(default)]
    pub slide_states: HashMap<SlideId, SlideState>,
}

impl Session {
    pub fn slide(&self, slide_id: &str) -> Option<&Slide> {
        self.slides.iter().find(|s| s.id == slide_id)
    }

    pub fn slide_state(&self, slide_id: &str) -> SlideState {
        self.slide_states
            .get(slide_id)
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_state_order() {
        assert!(SlideState::Lobby < SlideState::Show);
        assert!(SlideState::Show < SlideState::Locked);
        assert!(SlideState::Locked < SlideState::Reveal);
    }

    #[test]
    fn test_slide_deserializes_from_tagged_json() {
        let json = r#"{
            "id": "s1",
            "type": "trivia",
            "question": "Capital of Spain?",
            "options": [{"id": "a", "text": "Madrid"}, {"id": "b", "text": "París"}],
            "correctAnswer": "a",
            "timeLimit": 20
        }"#;
        let slide: Slide = serde_json::from_str(json).unwrap();
        assert_eq!(slide.slide_type(), SlideType::Trivia);
        match slide.content {
            SlideContent::Trivia(t) => {
                assert_eq!(t.options.len(), 2);
                assert_eq!(t.correct_answer.as_deref(), Some("a"));
                assert_eq!(t.correct_index, None);
                assert_eq!(t.time_limit, Some(20));
            }
            other => panic!("Expected trivia slide, got {:?}", other),
        }
    }

    #[test]
    fn test_qa_slide_defaults() {
        let slide: Slide = serde_json::from_str(r#"{"id":"q","type":"qa","prompt":"Ask"}"#).unwrap();
        match slide.content {
            SlideContent::Qa(qa) => {
                assert!(qa.allow_upvoting);
                assert!(!qa.moderation_enabled);
                assert!(qa.anonymous_allowed);
            }
            other => panic!("Expected qa slide, got {:?}", other),
        }
    }

    #[test]
    fn test_response_event_wire_shape() {
        let json = r#"{
            "id": "r1",
            "slideId": "s1",
            "participantId": "p1",
            "timestamp": "2024-05-01T10:00:00Z",
            "type": "qa",
            "question": "Why?",
            "upvotes": ["p2", "p3"],
            "isApproved": true
        }"#;
        let response: ResponseEvent = serde_json::from_str(json).unwrap();
        assert_eq!(response.response_type(), SlideType::Qa);
        assert_eq!(response.upvote_count(), 2);
        let question = response.as_question().unwrap();
        assert!(question.is_approved);
        assert!(!question.is_answered);
    }

    #[test]
    fn test_join_code_parse() {
        assert_eq!(JoinCode::parse("012345").unwrap().as_str(), "012345");
        assert_eq!(JoinCode::parse(" 987654 ").unwrap().as_str(), "987654");
        assert!(JoinCode::parse("12345").is_none());
        assert!(JoinCode::parse("1234567").is_none());
        assert!(JoinCode::parse("12a456").is_none());
        assert!(JoinCode::parse("").is_none());
    }

    #[test]
    fn test_join_code_random_is_six_digits() {
        let mut rng = rand::rng();
        for _ in 0..100 {
            let code = JoinCode::random(&mut rng);
            assert_eq!(code.as_str().len(), JOIN_CODE_LEN);
            assert!(JoinCode::parse(code.as_str()).is_some());
        }
    }
}
