pub mod catalog;
pub mod domain;
pub mod header;
pub mod ports;

pub use catalog::{derive_title, scan_texts, Reconciler, ScannedText};
pub use domain::{
    CatalogEntry, Difficulty, NewSession, NewText, PracticeSession, SessionMetrics, TextContent,
    TextRecord,
};
pub use header::{parse_header, strip_header, word_count, HeaderMetadata};
pub use ports::{DatabaseService, PortError, PortResult};
