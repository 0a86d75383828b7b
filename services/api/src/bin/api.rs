//! services/api/src/bin/api.rs

use api_lib::{
    adapters::db::SqliteStore,
    config::Config,
    error::ApiError,
    web::{
        complete_session_handler, create_session_handler, health_handler, list_exercises_handler,
        list_sessions_handler, list_texts_handler, register_text_handler, rest::ApiDoc,
        state::AppState, text_content_handler, toggle_favorite_handler,
    },
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use narratype_core::catalog::Reconciler;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Create the Schema ---
    info!("Connecting to database at {}...", config.database_url);
    // Session rows carry a logical text_id reference that is not required
    // to exist before insert; the schema's FOREIGN KEY clause stays inert.
    let connect_options = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(ApiError::Database)?
        .create_if_missing(true)
        .foreign_keys(false);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;
    let store = Arc::new(SqliteStore::new(db_pool));
    info!("Creating database schema if absent...");
    store.init_schema().await?;
    info!("Database ready.");

    // --- 3. Build the Catalog Reconciler & Shared AppState ---
    let reconciler = Arc::new(Reconciler::new(store.clone(), config.texts_dir.clone()));
    info!("Serving texts from {}", config.texts_dir.display());

    let app_state = Arc::new(AppState {
        store,
        reconciler,
        config: config.clone(),
    });

    // --- 4. Configure CORS for the development client ---
    let cors_origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    let api_router = Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/texts", get(list_texts_handler))
        .route("/api/texts/register", post(register_text_handler))
        .route("/api/texts/{text_id}/favorite", post(toggle_favorite_handler))
        .route("/api/texts/{text_id}/content", get(text_content_handler))
        .route("/api/sessions", get(list_sessions_handler).post(create_session_handler))
        .route("/api/sessions/{session_id}/complete", post(complete_session_handler))
        .route("/api/exercises", get(list_exercises_handler))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let mut app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // Serve the built client bundle in production.
    if let Some(static_dir) = &config.static_dir {
        info!("Serving static files from {}", static_dir.display());
        app = app.fallback_service(ServeDir::new(static_dir).append_index_html_on_directories(true));
    }

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
