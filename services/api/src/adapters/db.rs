//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the SQLite database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use narratype_core::domain::{NewSession, NewText, PracticeSession, SessionMetrics, TextRecord};
use narratype_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, SqlitePool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Creates a new `SqliteStore`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the schema at startup. Both statements are idempotent, so
    /// running this on every boot is safe.
    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS texts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT UNIQUE NOT NULL,
                display_path TEXT NOT NULL,
                title TEXT NOT NULL,
                author TEXT,
                category TEXT,
                difficulty TEXT CHECK(difficulty IN ('easy', 'medium', 'hard')),
                word_count INTEGER,
                is_favorite INTEGER DEFAULT 0,
                last_practiced DATETIME,
                times_practiced INTEGER DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS practice_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text_id INTEGER NOT NULL,
                started_at DATETIME NOT NULL,
                ended_at DATETIME,
                exercise_type TEXT,
                lesson_number INTEGER,
                exercise_number INTEGER,
                wpm REAL,
                accuracy REAL,
                characters_typed INTEGER,
                errors INTEGER,
                completed BOOLEAN DEFAULT FALSE,
                FOREIGN KEY (text_id) REFERENCES texts(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct TextRow {
    id: i64,
    filename: String,
    display_path: String,
    title: String,
    author: Option<String>,
    category: Option<String>,
    difficulty: Option<String>,
    word_count: i64,
    is_favorite: bool,
    last_practiced: Option<DateTime<Utc>>,
    times_practiced: i64,
    created_at: DateTime<Utc>,
}

impl TextRow {
    fn to_domain(self) -> TextRecord {
        TextRecord {
            id: self.id,
            filename: self.filename,
            display_path: self.display_path,
            title: self.title,
            author: self.author,
            category: self.category,
            // The CHECK constraint keeps anything unparseable out of the table.
            difficulty: self.difficulty.and_then(|d| d.parse().ok()),
            word_count: self.word_count,
            is_favorite: self.is_favorite,
            last_practiced: self.last_practiced,
            times_practiced: self.times_practiced,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct SessionRow {
    id: i64,
    text_id: i64,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    exercise_type: Option<String>,
    lesson_number: Option<i64>,
    exercise_number: Option<i64>,
    wpm: Option<f64>,
    accuracy: Option<f64>,
    characters_typed: Option<i64>,
    errors: Option<i64>,
    completed: bool,
}

impl SessionRow {
    fn to_domain(self) -> PracticeSession {
        PracticeSession {
            id: self.id,
            text_id: self.text_id,
            started_at: self.started_at,
            ended_at: self.ended_at,
            exercise_type: self.exercise_type,
            lesson_number: self.lesson_number,
            exercise_number: self.exercise_number,
            wpm: self.wpm,
            accuracy: self.accuracy,
            characters_typed: self.characters_typed,
            errors: self.errors,
            completed: self.completed,
        }
    }
}

const TEXT_COLUMNS: &str = "id, filename, display_path, title, author, category, difficulty, \
                            word_count, is_favorite, last_practiced, times_practiced, created_at";

const SESSION_COLUMNS: &str = "id, text_id, started_at, ended_at, exercise_type, lesson_number, \
                               exercise_number, wpm, accuracy, characters_typed, errors, completed";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for SqliteStore {
    async fn upsert_text(&self, text: NewText) -> PortResult<i64> {
        // Insert-or-ignore followed by a lookup on the unique filename, so
        // two concurrent registrations of the same file both land on the
        // same row instead of one of them dying on the constraint.
        sqlx::query(
            "INSERT INTO texts (filename, display_path, title, author, category, difficulty, word_count, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(filename) DO NOTHING",
        )
        .bind(&text.filename)
        .bind(&text.display_path)
        .bind(&text.title)
        .bind(&text.author)
        .bind(&text.category)
        .bind(&text.difficulty)
        .bind(text.word_count)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let id: i64 = sqlx::query_scalar("SELECT id FROM texts WHERE filename = ?")
            .bind(&text.filename)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(id)
    }

    async fn find_text_by_filename(&self, filename: &str) -> PortResult<Option<TextRecord>> {
        let row = sqlx::query_as::<_, TextRow>(&format!(
            "SELECT {} FROM texts WHERE filename = ?",
            TEXT_COLUMNS
        ))
        .bind(filename)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(row.map(TextRow::to_domain))
    }

    async fn get_text(&self, text_id: i64) -> PortResult<TextRecord> {
        let row = sqlx::query_as::<_, TextRow>(&format!(
            "SELECT {} FROM texts WHERE id = ?",
            TEXT_COLUMNS
        ))
        .bind(text_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        row.map(TextRow::to_domain)
            .ok_or_else(|| PortError::NotFound(format!("Text {} not found", text_id)))
    }

    async fn list_texts(&self) -> PortResult<Vec<TextRecord>> {
        let rows = sqlx::query_as::<_, TextRow>(&format!("SELECT {} FROM texts", TEXT_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(rows.into_iter().map(TextRow::to_domain).collect())
    }

    async fn set_favorite(&self, text_id: i64, is_favorite: bool) -> PortResult<()> {
        sqlx::query("UPDATE texts SET is_favorite = ? WHERE id = ?")
            .bind(is_favorite)
            .bind(text_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn record_practice(&self, text_id: i64, at: DateTime<Utc>) -> PortResult<()> {
        sqlx::query(
            "UPDATE texts SET times_practiced = times_practiced + 1, last_practiced = ? \
             WHERE id = ?",
        )
        .bind(at)
        .bind(text_id)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn create_session(&self, session: NewSession) -> PortResult<PracticeSession> {
        let started_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO practice_sessions (text_id, started_at, exercise_type, lesson_number, exercise_number) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session.text_id)
        .bind(started_at)
        .bind(&session.exercise_type)
        .bind(session.lesson_number)
        .bind(session.exercise_number)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(PracticeSession {
            id: result.last_insert_rowid(),
            text_id: session.text_id,
            started_at,
            ended_at: None,
            exercise_type: session.exercise_type,
            lesson_number: session.lesson_number,
            exercise_number: session.exercise_number,
            wpm: None,
            accuracy: None,
            characters_typed: None,
            errors: None,
            completed: false,
        })
    }

    async fn complete_session(
        &self,
        session_id: i64,
        ended_at: DateTime<Utc>,
        metrics: SessionMetrics,
    ) -> PortResult<()> {
        sqlx::query(
            "UPDATE practice_sessions \
             SET ended_at = ?, wpm = ?, accuracy = ?, characters_typed = ?, errors = ?, completed = 1 \
             WHERE id = ?",
        )
        .bind(ended_at)
        .bind(metrics.wpm)
        .bind(metrics.accuracy)
        .bind(metrics.characters_typed)
        .bind(metrics.errors)
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn list_sessions(&self) -> PortResult<Vec<PracticeSession>> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {} FROM practice_sessions ORDER BY started_at DESC LIMIT 100",
            SESSION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(rows.into_iter().map(SessionRow::to_domain).collect())
    }
}
