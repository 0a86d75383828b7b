//! crates/narratype_core/src/catalog.rs
//!
//! The catalog reconciler: merges the filesystem scan of available practice
//! texts with their persisted registration records, and handles first-time
//! registration of a previously unseen file.
//!
//! The texts root is explicit construction-time configuration; nothing in
//! here reaches for a global path.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use glob::{glob, Pattern};
use tracing::warn;

use crate::domain::{CatalogEntry, NewText, TextContent};
use crate::header::{parse_header, strip_header, word_count};
use crate::ports::{DatabaseService, PortError, PortResult};

/// Category label for texts sitting directly in the scan root.
const UNCATEGORIZED: &str = "uncategorized";

/// A practice text discovered on disk, before any database overlay.
#[derive(Debug, Clone)]
pub struct ScannedText {
    /// Full path as produced by the scan; the key used to match records.
    pub filename: String,
    /// Path relative to the scan root.
    pub display_path: String,
    /// Mechanical title derived from the file stem, not the header.
    pub title: String,
    /// First path segment under the root, or `"uncategorized"`.
    pub category: String,
    /// Raw count over the full content, header lines included.
    pub word_count: i64,
}

/// Recursively enumerates every `*.txt` file under `root`.
///
/// Unreadable files fall back to empty content rather than aborting the
/// scan; a missing root simply yields nothing.
pub fn scan_texts(root: &Path) -> Vec<ScannedText> {
    // The root is a literal path, not a pattern; escape it so directories
    // with `[`, `?` or `*` in their names still scan.
    let pattern = format!("{}/**/*.txt", Pattern::escape(&root.to_string_lossy()));
    let paths = match glob(&pattern) {
        Ok(paths) => paths,
        Err(e) => {
            warn!("Invalid scan pattern for {}: {}", root.display(), e);
            return Vec::new();
        }
    };

    let mut texts = Vec::new();
    for entry in paths {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable directory entry: {}", e);
                continue;
            }
        };

        let relative = match path.strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let category = match relative.components().count() {
            0 | 1 => UNCATEGORIZED.to_string(),
            // Deeper nesting flattens to the first segment; one level of
            // categorization is all the catalog exposes.
            _ => relative
                .components()
                .next()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
        };

        let content = fs::read_to_string(&path).unwrap_or_else(|e| {
            warn!("Could not read {}: {}", path.display(), e);
            String::new()
        });

        let title = path
            .file_stem()
            .map(|stem| derive_title(&stem.to_string_lossy()))
            .unwrap_or_default();

        texts.push(ScannedText {
            filename: path.to_string_lossy().into_owned(),
            display_path: relative.to_string_lossy().into_owned(),
            title,
            category,
            word_count: word_count(&content),
        });
    }

    texts
}

/// Human-readable title from a file stem: underscores become spaces, each
/// word is title-cased. Distinct from the header-supplied title.
pub fn derive_title(stem: &str) -> String {
    stem.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reconciles the filesystem view of practice texts with the persisted
/// registration records behind the [`DatabaseService`] port.
pub struct Reconciler {
    store: Arc<dyn DatabaseService>,
    texts_root: PathBuf,
}

impl Reconciler {
    pub fn new(store: Arc<dyn DatabaseService>, texts_root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            texts_root: texts_root.into(),
        }
    }

    pub fn texts_root(&self) -> &Path {
        &self.texts_root
    }

    /// The authoritative catalog: every scanned file exactly once, overlaid
    /// with its record where one exists.
    ///
    /// The overlay contributes id, favorite flag and practice stats only;
    /// the filesystem-derived title and category win for display.
    pub async fn list_catalog(&self) -> PortResult<Vec<CatalogEntry>> {
        let scanned = scan_texts(&self.texts_root);
        let records = self.store.list_texts().await?;
        let mut by_filename: HashMap<String, _> = records
            .into_iter()
            .map(|record| (record.filename.clone(), record))
            .collect();

        let entries = scanned
            .into_iter()
            .map(|text| match by_filename.remove(&text.filename) {
                Some(record) => CatalogEntry {
                    id: Some(record.id),
                    is_favorite: record.is_favorite,
                    last_practiced: record.last_practiced,
                    times_practiced: record.times_practiced,
                    filename: text.filename,
                    display_path: text.display_path,
                    title: text.title,
                    category: text.category,
                    word_count: text.word_count,
                },
                None => CatalogEntry {
                    id: None,
                    is_favorite: false,
                    last_practiced: None,
                    times_practiced: 0,
                    filename: text.filename,
                    display_path: text.display_path,
                    title: text.title,
                    category: text.category,
                    word_count: text.word_count,
                },
            })
            .collect();

        Ok(entries)
    }

    /// Registers a text file, returning its record id.
    ///
    /// Idempotent: an already-registered filename returns the stored id
    /// without re-parsing or mutation. A first registration parses the
    /// header and persists the record through an atomic insert-or-fetch
    /// keyed on the filename.
    pub async fn register(&self, filename: &str) -> PortResult<i64> {
        if let Some(existing) = self.store.find_text_by_filename(filename).await? {
            return Ok(existing.id);
        }

        let path = Path::new(filename);
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                PortError::NotFound(format!("Text file {} does not exist", filename))
            }
            _ => PortError::Io {
                path: filename.to_string(),
                source: e,
            },
        })?;

        let relative = path.strip_prefix(&self.texts_root).map_err(|_| {
            PortError::Unexpected(format!(
                "{} is not under the texts root {}",
                filename,
                self.texts_root.display()
            ))
        })?;

        let metadata = parse_header(&content);
        let title = metadata
            .title()
            .map(str::to_string)
            .or_else(|| {
                path.file_stem()
                    .map(|stem| derive_title(&stem.to_string_lossy()))
            })
            .unwrap_or_else(|| filename.to_string());

        let text = NewText {
            filename: filename.to_string(),
            display_path: relative.to_string_lossy().into_owned(),
            title,
            author: metadata.author().map(str::to_string),
            category: Some(
                metadata
                    .category()
                    .map(str::to_string)
                    .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            ),
            difficulty: metadata.difficulty().map(str::to_string),
            word_count: word_count(&content),
        };

        self.store.upsert_text(text).await
    }

    /// Reads a registered text back from disk for practice, stripping the
    /// header off the body. Every successful fetch bumps the record's
    /// practice stats.
    pub async fn fetch_content(&self, text_id: i64) -> PortResult<TextContent> {
        let record = self.store.get_text(text_id).await?;

        let content = fs::read_to_string(&record.filename).map_err(|e| PortError::Io {
            path: record.filename.clone(),
            source: e,
        })?;

        let body = strip_header(&content);
        let body_words = word_count(&body);

        self.store.record_practice(text_id, Utc::now()).await?;

        Ok(TextContent {
            title: record.title,
            content: body,
            word_count: body_words,
        })
    }

    /// Unconditional flag update; unknown ids succeed with no effect.
    pub async fn set_favorite(&self, text_id: i64, is_favorite: bool) -> PortResult<()> {
        self.store.set_favorite(text_id, is_favorite).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewSession, PracticeSession, SessionMetrics, TextRecord};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// In-memory stand-in for the storage adapter.
    #[derive(Default)]
    struct MemoryStore {
        inner: Mutex<MemoryInner>,
    }

    #[derive(Default)]
    struct MemoryInner {
        texts: Vec<TextRecord>,
        next_id: i64,
    }

    #[async_trait]
    impl DatabaseService for MemoryStore {
        async fn upsert_text(&self, text: NewText) -> PortResult<i64> {
            let mut inner = self.inner.lock().unwrap();
            if let Some(existing) = inner.texts.iter().find(|t| t.filename == text.filename) {
                return Ok(existing.id);
            }
            inner.next_id += 1;
            let id = inner.next_id;
            inner.texts.push(TextRecord {
                id,
                filename: text.filename,
                display_path: text.display_path,
                title: text.title,
                author: text.author,
                category: text.category,
                difficulty: text.difficulty.and_then(|d| d.parse().ok()),
                word_count: text.word_count,
                is_favorite: false,
                last_practiced: None,
                times_practiced: 0,
                created_at: Utc::now(),
            });
            Ok(id)
        }

        async fn find_text_by_filename(
            &self,
            filename: &str,
        ) -> PortResult<Option<TextRecord>> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.texts.iter().find(|t| t.filename == filename).cloned())
        }

        async fn get_text(&self, text_id: i64) -> PortResult<TextRecord> {
            let inner = self.inner.lock().unwrap();
            inner
                .texts
                .iter()
                .find(|t| t.id == text_id)
                .cloned()
                .ok_or_else(|| PortError::NotFound(format!("Text {} not found", text_id)))
        }

        async fn list_texts(&self) -> PortResult<Vec<TextRecord>> {
            Ok(self.inner.lock().unwrap().texts.clone())
        }

        async fn set_favorite(&self, text_id: i64, is_favorite: bool) -> PortResult<()> {
            let mut inner = self.inner.lock().unwrap();
            if let Some(text) = inner.texts.iter_mut().find(|t| t.id == text_id) {
                text.is_favorite = is_favorite;
            }
            Ok(())
        }

        async fn record_practice(&self, text_id: i64, at: DateTime<Utc>) -> PortResult<()> {
            let mut inner = self.inner.lock().unwrap();
            if let Some(text) = inner.texts.iter_mut().find(|t| t.id == text_id) {
                text.times_practiced += 1;
                text.last_practiced = Some(at);
            }
            Ok(())
        }

        async fn create_session(&self, _session: NewSession) -> PortResult<PracticeSession> {
            unimplemented!("not exercised by reconciler tests")
        }

        async fn complete_session(
            &self,
            _session_id: i64,
            _ended_at: DateTime<Utc>,
            _metrics: SessionMetrics,
        ) -> PortResult<()> {
            unimplemented!("not exercised by reconciler tests")
        }

        async fn list_sessions(&self) -> PortResult<Vec<PracticeSession>> {
            Ok(Vec::new())
        }
    }

    fn write_text(dir: &Path, relative: &str, content: &str) -> String {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn reconciler_for(root: &TempDir) -> (Arc<MemoryStore>, Reconciler) {
        let store = Arc::new(MemoryStore::default());
        let reconciler = Reconciler::new(store.clone(), root.path());
        (store, reconciler)
    }

    #[test]
    fn derives_titles_from_file_stems() {
        assert_eq!(derive_title("the_art_of_typing"), "The Art Of Typing");
        assert_eq!(derive_title("sample"), "Sample");
        assert_eq!(derive_title("MIXED_case"), "Mixed Case");
    }

    #[test]
    fn scan_categorizes_by_first_path_segment() {
        let root = TempDir::new().unwrap();
        write_text(root.path(), "technical/sample.txt", "# title: S\n\nwords here\n");
        write_text(root.path(), "root_level.txt", "plain body\n");
        write_text(root.path(), "classics/deep/nested.txt", "nested body\n");

        let mut scanned = scan_texts(root.path());
        scanned.sort_by(|a, b| a.display_path.cmp(&b.display_path));

        assert_eq!(scanned.len(), 3);

        let nested = &scanned[0];
        assert_eq!(nested.display_path, "classics/deep/nested.txt");
        assert_eq!(nested.category, "classics");

        let root_level = &scanned[1];
        assert_eq!(root_level.category, "uncategorized");
        assert_eq!(root_level.title, "Root Level");

        let sample = &scanned[2];
        assert_eq!(sample.category, "technical");
        // Raw count includes the header lines.
        assert_eq!(sample.word_count, 5);
    }

    #[test]
    fn scan_treats_root_with_glob_metacharacters_literally() {
        let outer = TempDir::new().unwrap();
        let root = outer.path().join("texts [v1]");
        write_text(&root, "technical/sample.txt", "some body text\n");

        let scanned = scan_texts(&root);
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0].display_path, "technical/sample.txt");
        assert_eq!(scanned[0].category, "technical");
    }

    #[test]
    fn scan_of_missing_root_is_empty() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("nowhere");
        assert!(scan_texts(&missing).is_empty());
    }

    #[tokio::test]
    async fn register_uses_header_metadata_with_filename_fallbacks() {
        let root = TempDir::new().unwrap();
        let (store, reconciler) = reconciler_for(&root);

        let with_header = write_text(
            root.path(),
            "technical/sample.txt",
            "# title: Sample\n# author: A\n# category: technical\n# difficulty: easy\n\nbody words\n",
        );
        let bare = write_text(root.path(), "plain_file.txt", "just a body\n");

        let id = reconciler.register(&with_header).await.unwrap();
        let record = store.get_text(id).await.unwrap();
        assert_eq!(record.title, "Sample");
        assert_eq!(record.author.as_deref(), Some("A"));
        assert_eq!(record.category.as_deref(), Some("technical"));
        assert_eq!(record.difficulty, Some(crate::domain::Difficulty::Easy));
        assert_eq!(record.display_path, "technical/sample.txt");
        // Registration stores the raw count, header included.
        assert_eq!(record.word_count, 14);

        let bare_id = reconciler.register(&bare).await.unwrap();
        let bare_record = store.get_text(bare_id).await.unwrap();
        assert_eq!(bare_record.title, "Plain File");
        assert_eq!(bare_record.author, None);
        assert_eq!(bare_record.category.as_deref(), Some("uncategorized"));
    }

    #[tokio::test]
    async fn register_is_idempotent() {
        let root = TempDir::new().unwrap();
        let (store, reconciler) = reconciler_for(&root);
        let filename = write_text(root.path(), "sample.txt", "# title: One\n\nbody\n");

        let first = reconciler.register(&filename).await.unwrap();
        let second = reconciler.register(&filename).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.list_texts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn register_missing_file_is_not_found() {
        let root = TempDir::new().unwrap();
        let (_store, reconciler) = reconciler_for(&root);
        let missing = root.path().join("ghost.txt");

        let err = reconciler
            .register(&missing.to_string_lossy())
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn register_rejects_files_outside_the_root() {
        let root = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let (_store, reconciler) = reconciler_for(&root);
        let outsider = write_text(elsewhere.path(), "outsider.txt", "some words\n");

        let err = reconciler.register(&outsider).await.unwrap_err();
        assert!(matches!(err, PortError::Unexpected(_)));
    }

    #[tokio::test]
    async fn catalog_lists_every_scanned_file_once() {
        let root = TempDir::new().unwrap();
        let (_store, reconciler) = reconciler_for(&root);
        let registered = write_text(root.path(), "known.txt", "# title: K\n\nbody text\n");
        write_text(root.path(), "unknown.txt", "never registered\n");

        let id = reconciler.register(&registered).await.unwrap();
        let entries = reconciler.list_catalog().await.unwrap();

        assert_eq!(entries.len(), 2);
        let known = entries.iter().find(|e| e.filename == registered).unwrap();
        assert_eq!(known.id, Some(id));
        // Display metadata stays filesystem-derived, header title does not
        // leak into the catalog view.
        assert_eq!(known.title, "Known");

        let unknown = entries.iter().find(|e| e.filename != registered).unwrap();
        assert_eq!(unknown.id, None);
        assert!(!unknown.is_favorite);
        assert_eq!(unknown.times_practiced, 0);
    }

    #[tokio::test]
    async fn fetch_content_strips_header_and_bumps_stats() {
        let root = TempDir::new().unwrap();
        let (store, reconciler) = reconciler_for(&root);
        let filename = write_text(
            root.path(),
            "sample.txt",
            "# title: Sample\n# author: A\n\nHello world\n",
        );
        let id = reconciler.register(&filename).await.unwrap();

        let before = Utc::now();
        let content = reconciler.fetch_content(id).await.unwrap();
        assert_eq!(content.title, "Sample");
        assert_eq!(content.content, "Hello world");
        assert_eq!(content.word_count, 2);

        let record = store.get_text(id).await.unwrap();
        assert_eq!(record.times_practiced, 1);
        assert!(record.last_practiced.unwrap() >= before);

        reconciler.fetch_content(id).await.unwrap();
        let record = store.get_text(id).await.unwrap();
        assert_eq!(record.times_practiced, 2);
    }

    #[tokio::test]
    async fn fetch_content_for_unknown_id_is_not_found() {
        let root = TempDir::new().unwrap();
        let (_store, reconciler) = reconciler_for(&root);

        let err = reconciler.fetch_content(42).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn set_favorite_on_unknown_id_succeeds_silently() {
        let root = TempDir::new().unwrap();
        let (store, reconciler) = reconciler_for(&root);

        reconciler.set_favorite(999, true).await.unwrap();
        assert!(store.list_texts().await.unwrap().is_empty());
    }
}
