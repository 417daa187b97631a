//! The output document and its text format.
//!
//! ```text
//! [<total-line-count> lines]
//! // === src/lib.rs ===
//! <verbatim content of src/lib.rs>
//! # === tools/run.py ===
//! <verbatim content of tools/run.py>
//! ```
//!
//! The header counts the lines of every emitted block. Content is written
//! verbatim, so a block minus its delimiter line is the file itself; only a
//! missing final newline is supplied so the next delimiter starts a line.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::language::CommentStyle;
use crate::render::RenderedBlock;
use crate::tokens::{count_tokens_with_encoding, Encoding};

/// Errors that can occur while emitting or reading a document.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document has no line-count header")]
    MissingHeader,

    #[error("invalid line-count header: {line}")]
    InvalidHeader { line: String },
}

/// An emitted file and its line count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub path: String,
    pub lines: usize,
}

/// A file that was accepted but could not be emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// The assembled document.
///
/// Blocks are appended to the body as they are rendered and then dropped;
/// only their summaries are kept.
#[derive(Debug, Clone, Default)]
pub struct Document {
    body: String,
    total_lines: usize,
    files: Vec<FileSummary>,
    skipped: Vec<SkippedFile>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rendered block.
    pub fn push_block(&mut self, block: &RenderedBlock) {
        block.write_to(&mut self.body);
        self.total_lines += block.lines;
        self.files.push(FileSummary {
            path: block.relative_path.clone(),
            lines: block.lines,
        });
    }

    /// Record a file that could not be emitted.
    pub fn push_skipped(&mut self, skipped: SkippedFile) {
        self.skipped.push(skipped);
    }

    /// Sum of the line counts of all emitted blocks.
    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    pub fn files(&self) -> &[FileSummary] {
        &self.files
    }

    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    pub fn header(&self) -> String {
        format_header(self.total_lines)
    }

    /// The full document text.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Estimated token count of the full text.
    pub fn token_count(&self, encoding: Encoding) -> usize {
        count_tokens_with_encoding(&self.to_text(), encoding)
    }

    pub fn report(&self) -> DocumentReport<'_> {
        DocumentReport {
            total_lines: self.total_lines,
            files: &self.files,
            skipped: &self.skipped,
            document: self.to_text(),
        }
    }

    /// Report serialized as pretty JSON.
    pub fn to_json(&self) -> Result<String, OutputError> {
        Ok(serde_json::to_string_pretty(&self.report())?)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header())?;
        f.write_str(&self.body)
    }
}

/// Machine-readable view of a document.
#[derive(Debug, Serialize)]
pub struct DocumentReport<'a> {
    pub total_lines: usize,
    pub files: &'a [FileSummary],
    pub skipped: &'a [SkippedFile],
    pub document: String,
}

/// Header line for a document of `total_lines` lines.
pub fn format_header(total_lines: usize) -> String {
    format!("[{total_lines} lines]")
}

// ============================================================================
// Reading documents back
// ============================================================================

/// One block read back from a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBlock {
    pub path: String,
    pub content: String,
}

/// A document read back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub total_lines: usize,
    pub blocks: Vec<ParsedBlock>,
}

/// Parse document text into its header count and blocks.
///
/// Block content comes back byte for byte, except that a file without a
/// final newline comes back with one. Any line that looks like a delimiter
/// starts a new block, including one that is really part of a file's
/// content.
///
/// # Examples
///
/// ```
/// use codeview::output::parse_document;
///
/// let doc = parse_document("[2 lines]\n=== a.txt ===\nfoo\nbar\n").unwrap();
/// assert_eq!(doc.total_lines, 2);
/// assert_eq!(doc.blocks[0].path, "a.txt");
/// assert_eq!(doc.blocks[0].content, "foo\nbar\n");
/// ```
pub fn parse_document(text: &str) -> Result<ParsedDocument, OutputError> {
    let (header, rest) = text.split_once('\n').unwrap_or((text, ""));
    let total_lines = parse_header(header)?;

    let mut blocks = Vec::new();
    let mut current: Option<ParsedBlock> = None;

    for line in rest.split_inclusive('\n') {
        let bare = line.strip_suffix('\n').unwrap_or(line);
        if let Some(path) = parse_delimiter(bare) {
            blocks.extend(current.take());
            current = Some(ParsedBlock {
                path,
                content: String::new(),
            });
        } else if let Some(block) = current.as_mut() {
            block.content.push_str(line);
        }
    }
    blocks.extend(current);

    Ok(ParsedDocument {
        total_lines,
        blocks,
    })
}

fn parse_header(line: &str) -> Result<usize, OutputError> {
    if line.is_empty() {
        return Err(OutputError::MissingHeader);
    }
    line.strip_prefix('[')
        .and_then(|s| s.strip_suffix(" lines]"))
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| OutputError::InvalidHeader {
            line: line.to_string(),
        })
}

/// Extract the path from a delimiter line in any known comment syntax.
fn parse_delimiter(line: &str) -> Option<String> {
    CommentStyle::ALL.iter().find_map(|style| {
        let (open, close) = style.delimiters();
        let inner = match open {
            "" => line,
            open => line.strip_prefix(open)?.strip_prefix(' ')?,
        };
        let inner = match close {
            "" => inner,
            close => inner.strip_suffix(close)?.strip_suffix(' ')?,
        };
        let path = inner.strip_prefix("=== ")?.strip_suffix(" ===")?;
        (!path.is_empty()).then(|| path.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(path: &str, delimiter: &str, content: &str) -> RenderedBlock {
        RenderedBlock {
            relative_path: path.to_string(),
            delimiter: delimiter.to_string(),
            content: content.to_string(),
            lines: crate::render::count_lines(content.as_bytes()),
        }
    }

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.push_block(&block("a.txt", "=== a.txt ===", "foo\nbar"));
        doc.push_block(&block("src/lib.rs", "// === src/lib.rs ===", "pub fn f() {}\n"));
        doc.push_block(&block("empty.txt", "=== empty.txt ===", ""));
        doc
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::new();
        assert_eq!(doc.to_text(), "[0 lines]\n");
        assert_eq!(doc.total_lines(), 0);
        assert!(doc.files().is_empty());
    }

    #[test]
    fn test_document_text() {
        let doc = sample();
        assert_eq!(
            doc.to_text(),
            "[3 lines]\n\
             === a.txt ===\nfoo\nbar\n\
             // === src/lib.rs ===\npub fn f() {}\n\
             === empty.txt ===\n"
        );
    }

    #[test]
    fn test_header_matches_block_lines() {
        let doc = sample();
        let sum: usize = doc.files().iter().map(|f| f.lines).sum();
        assert_eq!(doc.total_lines(), sum);
        assert_eq!(doc.header(), "[3 lines]");
    }

    #[test]
    fn test_parse_recovers_content() {
        let doc = sample();
        let parsed = parse_document(&doc.to_text()).unwrap();

        assert_eq!(parsed.total_lines, 3);
        assert_eq!(
            parsed.blocks,
            vec![
                ParsedBlock {
                    path: "a.txt".into(),
                    content: "foo\nbar\n".into()
                },
                ParsedBlock {
                    path: "src/lib.rs".into(),
                    content: "pub fn f() {}\n".into()
                },
                ParsedBlock {
                    path: "empty.txt".into(),
                    content: String::new()
                },
            ]
        );
    }

    #[test]
    fn test_parse_block_comment_delimiters() {
        let text = "[1 lines]\n/* === site.css === */\nbody {}\n<!-- === README.md === -->\n";
        let parsed = parse_document(text).unwrap();
        assert_eq!(parsed.blocks.len(), 2);
        assert_eq!(parsed.blocks[0].path, "site.css");
        assert_eq!(parsed.blocks[0].content, "body {}\n");
        assert_eq!(parsed.blocks[1].path, "README.md");
        assert_eq!(parsed.blocks[1].content, "");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_document(""), Err(OutputError::MissingHeader)));
        assert!(matches!(
            parse_document("[many lines]\n"),
            Err(OutputError::InvalidHeader { .. })
        ));
        assert!(matches!(
            parse_document("=== a.txt ===\n"),
            Err(OutputError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_skipped_files_are_not_emitted() {
        let mut doc = sample();
        doc.push_skipped(SkippedFile {
            path: "blob.bin".into(),
            reason: "binary content".into(),
        });
        assert_eq!(doc.skipped().len(), 1);
        assert!(!doc.to_text().contains("blob.bin"));
    }

    #[test]
    fn test_json_report() {
        let mut doc = sample();
        doc.push_skipped(SkippedFile {
            path: "blob.bin".into(),
            reason: "binary content".into(),
        });

        let v: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(v["total_lines"], 3);
        assert_eq!(v["files"][0]["path"], "a.txt");
        assert_eq!(v["files"][0]["lines"], 2);
        assert_eq!(v["skipped"][0]["path"], "blob.bin");
        assert_eq!(v["document"], doc.to_text());
    }

    #[test]
    fn test_token_count() {
        let doc = sample();
        assert!(doc.token_count(Encoding::default()) > 0);
    }
}
