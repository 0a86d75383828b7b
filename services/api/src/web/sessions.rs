//! services/api/src/web/sessions.rs
//!
//! Axum handlers for practice-session tracking: opening a session when a
//! practice run starts and completing it with the performance metrics.

use crate::web::rest::port_error;
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use narratype_core::domain::{NewSession, PracticeSession, SessionMetrics};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: i64,
    pub text_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub exercise_type: Option<String>,
    pub lesson_number: Option<i64>,
    pub exercise_number: Option<i64>,
    pub wpm: Option<f64>,
    pub accuracy: Option<f64>,
    pub characters_typed: Option<i64>,
    pub errors: Option<i64>,
    pub completed: bool,
}

impl From<PracticeSession> for SessionResponse {
    fn from(session: PracticeSession) -> Self {
        Self {
            id: session.id,
            text_id: session.text_id,
            started_at: session.started_at,
            ended_at: session.ended_at,
            exercise_type: session.exercise_type,
            lesson_number: session.lesson_number,
            exercise_number: session.exercise_number,
            wpm: session.wpm,
            accuracy: session.accuracy,
            characters_typed: session.characters_typed,
            errors: session.errors,
            completed: session.completed,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    pub text_id: i64,
    pub exercise_type: Option<String>,
    pub lesson_number: Option<i64>,
    pub exercise_number: Option<i64>,
}

/// The response payload sent after successfully creating a session.
#[derive(Serialize, ToSchema)]
pub struct CreateSessionResponse {
    pub id: i64,
    pub started_at: DateTime<Utc>,
}

#[derive(Deserialize, ToSchema)]
pub struct CompleteSessionRequest {
    pub wpm: Option<f64>,
    pub accuracy: Option<f64>,
    pub characters_typed: Option<i64>,
    pub errors: Option<i64>,
}

#[derive(Serialize, ToSchema)]
pub struct CompleteSessionResponse {
    pub success: bool,
    pub ended_at: DateTime<Utc>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List recent practice sessions, newest first (capped at 100).
#[utoipa::path(
    get,
    path = "/api/sessions",
    responses(
        (status = 200, description = "Recent sessions", body = [SessionResponse]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_sessions_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let sessions = app_state
        .store
        .list_sessions()
        .await
        .map_err(|e| port_error("list sessions", e))?;

    let sessions: Vec<SessionResponse> = sessions.into_iter().map(SessionResponse::from).collect();
    Ok(Json(sessions))
}

/// Open a practice session for a text.
///
/// The session starts in the open state with only the start time and the
/// caller's exercise classification.
#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session opened", body = CreateSessionResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_session_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session = app_state
        .store
        .create_session(NewSession {
            text_id: payload.text_id,
            exercise_type: payload.exercise_type,
            lesson_number: payload.lesson_number,
            exercise_number: payload.exercise_number,
        })
        .await
        .map_err(|e| port_error("create session", e))?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            id: session.id,
            started_at: session.started_at,
        }),
    ))
}

/// Complete a practice session with its performance metrics.
///
/// Overwrites the metrics unconditionally; completing an already-completed
/// session simply overwrites them again.
#[utoipa::path(
    post,
    path = "/api/sessions/{session_id}/complete",
    request_body = CompleteSessionRequest,
    params(("session_id" = i64, Path, description = "The practice session id")),
    responses(
        (status = 200, description = "Session completed", body = CompleteSessionResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn complete_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<i64>,
    Json(payload): Json<CompleteSessionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let ended_at = Utc::now();
    app_state
        .store
        .complete_session(
            session_id,
            ended_at,
            SessionMetrics {
                wpm: payload.wpm,
                accuracy: payload.accuracy,
                characters_typed: payload.characters_typed,
                errors: payload.errors,
            },
        )
        .await
        .map_err(|e| port_error("complete session", e))?;

    Ok(Json(CompleteSessionResponse {
        success: true,
        ended_at,
    }))
}
