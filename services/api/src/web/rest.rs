//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the text-catalog REST endpoints and the
//! master definition for the OpenAPI specification.

use crate::web::sessions;
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use narratype_core::domain::CatalogEntry;
use narratype_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        list_texts_handler,
        register_text_handler,
        toggle_favorite_handler,
        text_content_handler,
        sessions::list_sessions_handler,
        sessions::create_session_handler,
        sessions::complete_session_handler,
    ),
    components(
        schemas(
            HealthResponse,
            TextMetadata,
            RegisterTextRequest,
            RegisterTextResponse,
            ToggleFavoriteRequest,
            SuccessResponse,
            TextContentResponse,
            sessions::SessionResponse,
            sessions::CreateSessionRequest,
            sessions::CreateSessionResponse,
            sessions::CompleteSessionRequest,
            sessions::CompleteSessionResponse,
        )
    ),
    tags(
        (name = "Narratype API", description = "API endpoints for the typing practice application.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
}

/// One entry in the merged text catalog.
#[derive(Serialize, ToSchema)]
pub struct TextMetadata {
    /// Absent until the text has been registered.
    pub id: Option<i64>,
    pub filename: String,
    pub display_path: String,
    pub title: String,
    pub category: String,
    pub word_count: i64,
    pub is_favorite: bool,
    pub last_practiced: Option<DateTime<Utc>>,
    pub times_practiced: i64,
}

impl From<CatalogEntry> for TextMetadata {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            id: entry.id,
            filename: entry.filename,
            display_path: entry.display_path,
            title: entry.title,
            category: entry.category,
            word_count: entry.word_count,
            is_favorite: entry.is_favorite,
            last_practiced: entry.last_practiced,
            times_practiced: entry.times_practiced,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterTextRequest {
    /// Path to a text file under the configured texts root.
    pub filename: String,
}

#[derive(Serialize, ToSchema)]
pub struct RegisterTextResponse {
    pub id: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct ToggleFavoriteRequest {
    pub is_favorite: bool,
}

#[derive(Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Serialize, ToSchema)]
pub struct TextContentResponse {
    pub title: String,
    /// Practice body with the metadata header stripped off.
    pub content: String,
    /// Word count over the stripped body.
    pub word_count: i64,
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Maps a port failure onto an HTTP response, logging anything that is not
/// a plain miss.
pub(crate) fn port_error(context: &str, e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        other => {
            error!("{}: {:?}", context, other);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{} failed", context))
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Health check.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// List all available texts with their metadata.
///
/// Merges the filesystem scan with the registration records; files never
/// registered appear with a null id.
#[utoipa::path(
    get,
    path = "/api/texts",
    responses(
        (status = 200, description = "The merged text catalog", body = [TextMetadata]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_texts_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let entries = app_state
        .reconciler
        .list_catalog()
        .await
        .map_err(|e| port_error("list texts", e))?;

    let texts: Vec<TextMetadata> = entries.into_iter().map(TextMetadata::from).collect();
    Ok(Json(texts))
}

/// Register a text file, returning its record id.
///
/// Idempotent: registering an already-known filename returns the existing id.
#[utoipa::path(
    post,
    path = "/api/texts/register",
    request_body = RegisterTextRequest,
    responses(
        (status = 201, description = "Text registered", body = RegisterTextResponse),
        (status = 404, description = "File does not exist on disk"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_text_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<RegisterTextRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let id = app_state
        .reconciler
        .register(&payload.filename)
        .await
        .map_err(|e| port_error("register text", e))?;

    Ok((StatusCode::CREATED, Json(RegisterTextResponse { id })))
}

/// Toggle favorite status for a text.
///
/// Unconditional update; an unknown id still reports success.
#[utoipa::path(
    post,
    path = "/api/texts/{text_id}/favorite",
    request_body = ToggleFavoriteRequest,
    params(("text_id" = i64, Path, description = "The text record id")),
    responses(
        (status = 200, description = "Flag updated", body = SuccessResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn toggle_favorite_handler(
    State(app_state): State<Arc<AppState>>,
    Path(text_id): Path<i64>,
    Json(payload): Json<ToggleFavoriteRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state
        .reconciler
        .set_favorite(text_id, payload.is_favorite)
        .await
        .map_err(|e| port_error("toggle favorite", e))?;

    Ok(Json(SuccessResponse { success: true }))
}

/// Fetch a registered text's practice body.
///
/// Re-reads the file from disk, strips the header, and bumps the record's
/// practice stats on every call.
#[utoipa::path(
    get,
    path = "/api/texts/{text_id}/content",
    params(("text_id" = i64, Path, description = "The text record id")),
    responses(
        (status = 200, description = "The practice body", body = TextContentResponse),
        (status = 404, description = "No such text record"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn text_content_handler(
    State(app_state): State<Arc<AppState>>,
    Path(text_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let content = app_state
        .reconciler
        .fetch_content(text_id)
        .await
        .map_err(|e| port_error("fetch text content", e))?;

    Ok(Json(TextContentResponse {
        title: content.title,
        content: content.content,
        word_count: content.word_count,
    }))
}

/// Placeholder until the offline ingestion pipeline's exercise outputs are
/// wired in.
pub async fn list_exercises_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "exercises": [] }))
}
