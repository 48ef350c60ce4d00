//! HTTP API endpoints.
//!
//! Hosts create sessions and drive slides through their lifecycle,
//! participants submit responses, and any rendering surface polls the results
//! view. `POST /api/aggregate` aggregates a response set supplied by the
//! caller without touching server state.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::aggregate::aggregate;
use crate::error::ApiError;
use crate::protocol::*;
use crate::results::{build_results, default_filter};
use crate::state::AppState;
use crate::types::ResponseEvent;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Build the application router with all routes and layers applied
pub fn router(state: Arc<AppState>) -> Router {
    let slide_routes = Router::new()
        .route("/state", put(set_slide_state))
        .route("/responses", post(submit_response))
        .route("/responses/{response_id}", patch(moderate_question))
        .route("/responses/{response_id}/upvote", post(toggle_upvote))
        .route("/results", get(slide_results));

    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{session_id}", get(get_session).delete(end_session))
        .route("/api/join/{code}", get(join))
        .nest("/api/sessions/{session_id}/slides/{slide_id}", slide_routes)
        .route(
            "/api/sessions/{session_id}/participants/{participant_id}/slides/{slide_id}",
            get(participant_status),
        )
        .route(
            "/api/sessions/{session_id}/participants/{participant_id}/view",
            put(set_view),
        )
        .route("/api/aggregate", post(aggregate_batch))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
async fn health() -> &'static str {
    "ok"
}

/// POST /api/sessions
async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionInfo>), ApiError> {
    let session = state.create_session(req.title, req.slides).await?;
    Ok((StatusCode::CREATED, Json(SessionInfo::from(&session))))
}

/// GET /api/sessions/{session_id}
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionInfo> {
    let session = state.get_session(&session_id).await?;
    Ok(Json(SessionInfo::from(&session)))
}

/// DELETE /api/sessions/{session_id}
async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.end_session(&session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/join/{code}
async fn join(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> ApiResult<JoinInfo> {
    let session = state.join(&code).await?;
    Ok(Json(JoinInfo {
        session_id: session.id,
        title: session.title,
    }))
}

/// PUT /api/sessions/{session_id}/slides/{slide_id}/state
async fn set_slide_state(
    State(state): State<Arc<AppState>>,
    Path((session_id, slide_id)): Path<(String, String)>,
    Json(req): Json<SetSlideStateRequest>,
) -> ApiResult<SlideStateChanged> {
    let changed = state
        .set_slide_state(&session_id, &slide_id, req.state)
        .await?;
    Ok(Json(changed))
}

/// POST /api/sessions/{session_id}/slides/{slide_id}/responses
async fn submit_response(
    State(state): State<Arc<AppState>>,
    Path((session_id, slide_id)): Path<(String, String)>,
    Json(req): Json<SubmitResponseRequest>,
) -> Result<(StatusCode, Json<ResponseEvent>), ApiError> {
    let event = state
        .submit_response(&session_id, &slide_id, &req.participant_id, req.submission)
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// POST /api/sessions/{session_id}/slides/{slide_id}/responses/{response_id}/upvote
async fn toggle_upvote(
    State(state): State<Arc<AppState>>,
    Path((session_id, slide_id, response_id)): Path<(String, String, String)>,
    Json(req): Json<UpvoteRequest>,
) -> ApiResult<UpvoteResult> {
    let result = state
        .toggle_upvote(&session_id, &slide_id, &response_id, &req.participant_id)
        .await?;
    Ok(Json(result))
}

/// PATCH /api/sessions/{session_id}/slides/{slide_id}/responses/{response_id}
async fn moderate_question(
    State(state): State<Arc<AppState>>,
    Path((session_id, slide_id, response_id)): Path<(String, String, String)>,
    Json(req): Json<ModerateRequest>,
) -> ApiResult<ResponseEvent> {
    let event = state
        .moderate_question(&session_id, &slide_id, &response_id, req)
        .await?;
    Ok(Json(event))
}

/// GET /api/sessions/{session_id}/slides/{slide_id}/results?filter=&limit=
async fn slide_results(
    State(state): State<Arc<AppState>>,
    Path((session_id, slide_id)): Path<(String, String)>,
    Query(query): Query<ResultsQuery>,
) -> ApiResult<crate::results::SlideResults> {
    let results = state
        .slide_results(&session_id, &slide_id, query.filter, query.limit)
        .await?;
    Ok(Json(results))
}

/// GET /api/sessions/{session_id}/participants/{participant_id}/slides/{slide_id}
async fn participant_status(
    State(state): State<Arc<AppState>>,
    Path((session_id, participant_id, slide_id)): Path<(String, String, String)>,
) -> ApiResult<ParticipantStatus> {
    let status = state
        .participant_status(&session_id, &participant_id, &slide_id)
        .await?;
    Ok(Json(status))
}

/// PUT /api/sessions/{session_id}/participants/{participant_id}/view
async fn set_view(
    State(state): State<Arc<AppState>>,
    Path((session_id, participant_id)): Path<(String, String)>,
    Json(req): Json<SetViewRequest>,
) -> ApiResult<SetViewRequest> {
    let view = state
        .set_view_preference(&session_id, &participant_id, req.view)
        .await?;
    Ok(Json(SetViewRequest { view }))
}

/// POST /api/aggregate
///
/// Aggregates the caller's response set as-is. The request's `policy`
/// overrides the server default.
async fn aggregate_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AggregateRequest>,
) -> ApiResult<AggregateResponse> {
    let policy = req.policy.unwrap_or(state.config.duplicate_policy);
    let limit = req.limit.unwrap_or(state.config.qa_top_n);

    let aggregate = aggregate(&req.slide, &req.responses, policy)?;
    let results = build_results(
        &req.slide,
        &req.responses,
        req.state,
        policy,
        req.filter.unwrap_or_else(|| default_filter(&req.slide)),
        limit,
    )?;

    tracing::debug!(
        "Aggregated {} responses for external slide {}",
        req.responses.len(),
        req.slide.id
    );
    Ok(Json(AggregateResponse { aggregate, results }))
}
