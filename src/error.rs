//! Error types
//!
//! [`AggregateError`] is raised by the pure aggregation core when a response
//! batch cannot be aggregated at all. [`ApiError`] is the service-level error
//! and maps onto an HTTP status plus a `{code, msg}` JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::types::{ParticipantId, SlideId, SlideState, SlideType};

/// Invalid input for aggregation. The whole batch is rejected; callers must
/// treat any of these as "do not render results yet".
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AggregateError {
    #[error("response {response_id} is a {found} response but the slide is {expected}")]
    TypeMismatch {
        response_id: String,
        expected: SlideType,
        found: SlideType,
    },

    #[error("response {response_id} belongs to slide {found}, not {expected}")]
    SlideMismatch {
        response_id: String,
        expected: SlideId,
        found: SlideId,
    },

    #[error("participant {0} responded more than once")]
    DuplicateResponse(ParticipantId),
}

/// JSON error body, same shape for every failure
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub msg: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid join code: {0:?}")]
    InvalidJoinCode(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("invalid slide state transition from {from:?} to {to:?}")]
    InvalidTransition { from: SlideState, to: SlideState },

    #[error("slide {slide_id} is not accepting responses in state {state:?}")]
    SlideClosed { slide_id: SlideId, state: SlideState },

    #[error("participant {participant_id} already answered slide {slide_id}")]
    AlreadyAnswered {
        slide_id: SlideId,
        participant_id: ParticipantId,
    },

    #[error("upvoting is disabled for slide {0}")]
    UpvotingDisabled(SlideId),

    #[error("no free join code available")]
    JoinCodesExhausted,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InvalidJoinCode(_) => "INVALID_JOIN_CODE",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::Aggregate(_) => "AGGREGATE_FAILED",
            ApiError::InvalidTransition { .. } => "INVALID_TRANSITION",
            ApiError::SlideClosed { .. } => "SLIDE_CLOSED",
            ApiError::AlreadyAnswered { .. } => "ALREADY_ANSWERED",
            ApiError::UpvotingDisabled(_) => "UPVOTING_DISABLED",
            ApiError::JoinCodesExhausted => "JOIN_CODES_EXHAUSTED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidJoinCode(_) | ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Aggregate(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidTransition { .. }
            | ApiError::SlideClosed { .. }
            | ApiError::AlreadyAnswered { .. } => StatusCode::CONFLICT,
            ApiError::UpvotingDisabled(_) => StatusCode::FORBIDDEN,
            ApiError::JoinCodesExhausted => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!("Request rejected ({}): {}", status, self);
        let body = ErrorBody {
            code: self.code(),
            msg: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
