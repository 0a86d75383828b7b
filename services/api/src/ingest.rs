//! services/api/src/ingest.rs
//!
//! The offline ingestion pipeline behind the `ingest` binary: scan a
//! directory for text files, extract header metadata with the shared
//! grammar, and drop anything too short to be useful practice material.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use glob::{glob, Pattern};
use narratype_core::header::{parse_header, word_count};
use serde::Serialize;
use tracing::warn;

/// Files at or below this many words are discarded from the output set.
const MIN_WORD_COUNT: i64 = 50;

/// One scanned file, ready for validation.
#[derive(Debug, Clone, Serialize)]
pub struct RawText {
    pub path: String,
    pub content: String,
    pub metadata: HashMap<String, String>,
    pub word_count: i64,
}

/// Scans `input_dir` recursively for `*.txt` files, parsing each header.
///
/// Unlike the catalog scan, an unreadable file here is an error: the batch
/// pipeline should fail loudly rather than ship incomplete data.
pub fn scan_text_files(input_dir: &Path) -> std::io::Result<Vec<RawText>> {
    // Escape the root so a directory name with glob metacharacters scans
    // as a literal path.
    let pattern = format!("{}/**/*.txt", Pattern::escape(&input_dir.to_string_lossy()));
    let paths = match glob(&pattern) {
        Ok(paths) => paths,
        Err(e) => {
            warn!("Invalid scan pattern for {}: {}", input_dir.display(), e);
            return Ok(Vec::new());
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

        let content = fs::read_to_string(&path)?;
        let metadata = parse_header(&content).into_fields();
        let words = word_count(&content);

        texts.push(RawText {
            path: path.to_string_lossy().into_owned(),
            content,
            metadata,
            word_count: words,
        });
    }

    Ok(texts)
}

/// Keeps only texts long enough to practice on; the threshold is fixed.
pub fn validate_texts(texts: Vec<RawText>) -> Vec<RawText> {
    texts
        .into_iter()
        .filter(|text| text.word_count > MIN_WORD_COUNT)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_text(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = fs::File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn scan_collects_metadata_and_counts() {
        let dir = TempDir::new().unwrap();
        write_text(
            dir.path(),
            "technical/sample.txt",
            &format!("# title: Sample\n# difficulty: easy\n\n{}\n", words(60)),
        );

        let texts = scan_text_files(dir.path()).unwrap();
        assert_eq!(texts.len(), 1);
        let text = &texts[0];
        assert_eq!(text.metadata.get("title").map(String::as_str), Some("Sample"));
        assert_eq!(text.metadata.get("difficulty").map(String::as_str), Some("easy"));
        // Header tokens count toward the total.
        assert_eq!(text.word_count, 66);
    }

    #[test]
    fn validation_drops_short_texts() {
        let dir = TempDir::new().unwrap();
        write_text(dir.path(), "long.txt", &words(51));
        write_text(dir.path(), "exactly_fifty.txt", &words(50));
        write_text(dir.path(), "short.txt", &words(10));

        let texts = scan_text_files(dir.path()).unwrap();
        assert_eq!(texts.len(), 3);

        let valid = validate_texts(texts);
        assert_eq!(valid.len(), 1);
        assert!(valid[0].path.ends_with("long.txt"));
    }

    #[test]
    fn scan_handles_metacharacters_in_the_input_dir() {
        let outer = TempDir::new().unwrap();
        let input = outer.path().join("batch [2024]");
        write_text(&input, "sample.txt", &words(60));

        let texts = scan_text_files(&input).unwrap();
        assert_eq!(texts.len(), 1);
    }

    #[test]
    fn scan_of_empty_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(scan_text_files(dir.path()).unwrap().is_empty());
    }
}
