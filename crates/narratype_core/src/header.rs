//! crates/narratype_core/src/header.rs
//!
//! The header-metadata grammar shared by the catalog, content fetching and
//! the offline ingestion pipeline. Practice texts may open with comment
//! lines of the form `# key: value`; this module extracts that mapping and
//! strips those lines off the practice body.
//!
//! A single line classifier backs both the parser's stop rule and body
//! stripping so the two can never drift apart.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

/// Only the leading lines of a file are consulted for metadata.
const HEADER_WINDOW: usize = 10;

/// The comment marker that opens a header line.
const COMMENT_MARKER: char = '#';

static HEADER_LINE: OnceLock<Regex> = OnceLock::new();

fn header_line_pattern() -> &'static Regex {
    // marker, optional whitespace, word-chars key, colon, whitespace, value
    HEADER_LINE.get_or_init(|| Regex::new(r"^#\s*(\w+):\s*(.+)").unwrap())
}

/// How a single line participates in the header grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineRole {
    /// Empty or whitespace-only; skipped without ending the header.
    Blank,
    /// Starts with the comment marker; may or may not carry metadata.
    Comment,
    /// Anything else; the first such line ends the header.
    Body,
}

fn classify(line: &str) -> LineRole {
    if line.starts_with(COMMENT_MARKER) {
        LineRole::Comment
    } else if line.trim().is_empty() {
        LineRole::Blank
    } else {
        LineRole::Body
    }
}

/// Key/value metadata parsed from the leading comment lines of a text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMetadata {
    fields: HashMap<String, String>,
}

impl HeaderMetadata {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// The fields the application gives meaning to. Anything else in the
    /// header is preserved in the map but otherwise ignored.
    pub fn title(&self) -> Option<&str> {
        self.get("title")
    }

    pub fn author(&self) -> Option<&str> {
        self.get("author")
    }

    pub fn category(&self) -> Option<&str> {
        self.get("category")
    }

    pub fn difficulty(&self) -> Option<&str> {
        self.get("difficulty")
    }

    pub fn into_fields(self) -> HashMap<String, String> {
        self.fields
    }
}

/// Extracts header metadata from file content.
///
/// At most the first [`HEADER_WINDOW`] lines are examined. Comment lines
/// matching `# key: value` contribute a field (later duplicates overwrite
/// earlier ones); comment lines that do not match are skipped. Scanning
/// stops at the first body line. Parsing is total: malformed input yields
/// fewer fields, never an error.
pub fn parse_header(content: &str) -> HeaderMetadata {
    let mut metadata = HeaderMetadata::default();

    for line in content.lines().take(HEADER_WINDOW) {
        match classify(line) {
            LineRole::Comment => {
                if let Some(caps) = header_line_pattern().captures(line) {
                    let key = caps[1].to_string();
                    let value = caps[2].trim().to_string();
                    metadata.fields.insert(key, value);
                }
            }
            LineRole::Blank => continue,
            LineRole::Body => break,
        }
    }

    metadata
}

/// Strips the leading header off file content, returning the trimmed body.
///
/// Every leading blank or comment line is dropped, using the same
/// classifier as [`parse_header`]; the body starts at the first line that
/// is neither. Parsing the returned body yields empty metadata.
pub fn strip_header(content: &str) -> String {
    let mut lines = content.lines();
    let mut body: Vec<&str> = Vec::new();

    for line in lines.by_ref() {
        if classify(line) == LineRole::Body {
            body.push(line);
            break;
        }
    }
    body.extend(lines);

    body.join("\n").trim().to_string()
}

/// Whitespace-delimited token count.
pub fn word_count(text: &str) -> i64 {
    text.split_whitespace().count() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_title_and_author() {
        let content = "# title: Sample\n# author: A\n\nHello world\n";
        let metadata = parse_header(content);
        assert_eq!(metadata.title(), Some("Sample"));
        assert_eq!(metadata.author(), Some("A"));
        assert_eq!(metadata.len(), 2);
    }

    #[test]
    fn strips_header_down_to_body() {
        let content = "# title: Sample\n# author: A\n\nHello world\n";
        assert_eq!(strip_header(content), "Hello world");
    }

    #[test]
    fn content_without_header_yields_empty_metadata() {
        let content = "Just words here\n";
        let metadata = parse_header(content);
        assert!(metadata.is_empty());
        assert_eq!(strip_header(content), "Just words here");
    }

    #[test]
    fn stops_at_first_body_line() {
        // The `# category:` line sits below body text and must be ignored.
        let content = "# title: Top\nBody starts here\n# category: nope\n";
        let metadata = parse_header(content);
        assert_eq!(metadata.title(), Some("Top"));
        assert_eq!(metadata.category(), None);
    }

    #[test]
    fn blank_lines_do_not_stop_scanning() {
        let content = "# title: Spaced\n\n\n# author: B\nBody\n";
        let metadata = parse_header(content);
        assert_eq!(metadata.title(), Some("Spaced"));
        assert_eq!(metadata.author(), Some("B"));
    }

    #[test]
    fn malformed_comment_lines_are_skipped() {
        let content = "# just a comment\n# title: Real\n#no-colon-here\nBody\n";
        let metadata = parse_header(content);
        assert_eq!(metadata.title(), Some("Real"));
        assert_eq!(metadata.len(), 1);
    }

    #[test]
    fn later_duplicate_keys_overwrite() {
        let content = "# title: First\n# title: Second\nBody\n";
        let metadata = parse_header(content);
        assert_eq!(metadata.title(), Some("Second"));
    }

    #[test]
    fn only_first_ten_lines_are_examined() {
        let mut lines: Vec<String> = (0..10).map(|i| format!("# k{}: v{}", i, i)).collect();
        lines.push("# title: Eleventh".to_string());
        lines.push("Body".to_string());
        let content = lines.join("\n");

        let metadata = parse_header(&content);
        assert_eq!(metadata.len(), 10);
        assert_eq!(metadata.title(), None);
    }

    #[test]
    fn header_lines_beyond_window_still_stripped_from_body() {
        // Stripping is not windowed: every leading comment line goes, even
        // the ones parse_header never looked at.
        let mut lines: Vec<String> = (0..11).map(|i| format!("# k{}: v{}", i, i)).collect();
        lines.push("Body".to_string());
        let content = lines.join("\n");

        assert_eq!(strip_header(&content), "Body");
    }

    #[test]
    fn parsing_stripped_output_is_empty() {
        let content = "# title: Sample\n# difficulty: hard\n\nThe quick brown fox.\n";
        let stripped = strip_header(content);
        assert!(parse_header(&stripped).is_empty());
    }

    #[test]
    fn all_comment_file_stops_after_window_without_error() {
        let content = (0..20)
            .map(|i| format!("# k{}: v{}", i, i))
            .collect::<Vec<_>>()
            .join("\n");
        let metadata = parse_header(&content);
        assert_eq!(metadata.len(), 10);
    }

    #[test]
    fn counts_whitespace_delimited_tokens() {
        assert_eq!(word_count("one two\tthree\nfour"), 4);
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn value_whitespace_is_trimmed() {
        let content = "#   title:   Padded Title   \nBody\n";
        let metadata = parse_header(content);
        assert_eq!(metadata.title(), Some("Padded Title"));
    }
}
