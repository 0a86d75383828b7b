//! crates/narratype_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of the concrete storage engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{NewSession, NewText, PracticeSession, SessionMetrics, TextRecord};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., the
/// database or the filesystem).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Text Catalog ---

    /// Inserts a text record, or returns the existing record's id when the
    /// filename is already registered. A single atomic operation keyed on
    /// the unique filename, so concurrent registrations of the same file
    /// cannot produce a constraint failure.
    async fn upsert_text(&self, text: NewText) -> PortResult<i64>;

    async fn find_text_by_filename(&self, filename: &str) -> PortResult<Option<TextRecord>>;

    async fn get_text(&self, text_id: i64) -> PortResult<TextRecord>;

    async fn list_texts(&self) -> PortResult<Vec<TextRecord>>;

    /// Unconditional update: a nonexistent id affects zero rows and still
    /// succeeds.
    async fn set_favorite(&self, text_id: i64, is_favorite: bool) -> PortResult<()>;

    /// Bumps `times_practiced` by one and stamps `last_practiced`.
    async fn record_practice(&self, text_id: i64, at: DateTime<Utc>) -> PortResult<()>;

    // --- Practice Sessions ---

    async fn create_session(&self, session: NewSession) -> PortResult<PracticeSession>;

    /// Stamps the end time, stores the metrics and marks the session
    /// completed. Overwrites whatever was there before; completing an
    /// already-completed session is not an error.
    async fn complete_session(
        &self,
        session_id: i64,
        ended_at: DateTime<Utc>,
        metrics: SessionMetrics,
    ) -> PortResult<()>;

    /// Most recent sessions first, capped at 100.
    async fn list_sessions(&self) -> PortResult<Vec<PracticeSession>>;
}
