//! crates/narratype_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// Difficulty rating carried in a text's header metadata.
///
/// The storage schema enforces this enumeration with a CHECK constraint;
/// registration passes the raw header value through unvalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("'{}' is not a valid difficulty", other)),
        }
    }
}

/// A registered practice text: the durable record behind a file on disk.
///
/// `word_count` is the raw count over the full file content, header lines
/// included; `fetch_content` reports the body-only count separately.
#[derive(Debug, Clone)]
pub struct TextRecord {
    pub id: i64,
    /// Absolute (or root-resolvable) path; unique key for the record.
    pub filename: String,
    /// Path relative to the configured texts root, for display.
    pub display_path: String,
    pub title: String,
    pub author: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub word_count: i64,
    pub is_favorite: bool,
    pub last_practiced: Option<DateTime<Utc>>,
    pub times_practiced: i64,
    pub created_at: DateTime<Utc>,
}

/// The fields needed to register a text for the first time.
///
/// `difficulty` stays a raw string here: the store's CHECK constraint is the
/// layer that rejects values outside the enumeration.
#[derive(Debug, Clone)]
pub struct NewText {
    pub filename: String,
    pub display_path: String,
    pub title: String,
    pub author: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub word_count: i64,
}

/// One entry in the merged catalog view: a file found on disk, overlaid
/// with its registration record when one exists.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// `None` until the file has been registered.
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

/// The payload returned when a text's body is fetched for practice.
#[derive(Debug, Clone)]
pub struct TextContent {
    pub title: String,
    /// Body with leading header lines stripped.
    pub content: String,
    /// Word count over the stripped body only.
    pub word_count: i64,
}

/// One timed attempt at typing a text.
#[derive(Debug, Clone)]
pub struct PracticeSession {
    pub id: i64,
    /// Logical reference to a `TextRecord`; not enforced before insert.
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

/// Caller-supplied classification for a new practice session.
#[derive(Debug, Clone, Default)]
pub struct NewSession {
    pub text_id: i64,
    pub exercise_type: Option<String>,
    pub lesson_number: Option<i64>,
    pub exercise_number: Option<i64>,
}

/// Performance metrics recorded when a session completes.
///
/// All fields are optional; completing a session overwrites whatever was
/// there before, including on a session that was already completed.
#[derive(Debug, Clone, Default)]
pub struct SessionMetrics {
    pub wpm: Option<f64>,
    pub accuracy: Option<f64>,
    pub characters_typed: Option<i64>,
    pub errors: Option<i64>,
}
