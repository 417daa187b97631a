//! Rendering accepted files into delimited blocks.
//!
//! A block is a delimiter line naming the file, followed by the file's
//! verbatim content. The delimiter is the banner `=== <path> ===`, wrapped
//! in the comment syntax of the file's language unless plain delimiters
//! are requested.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::language::detect_comment_style;
use crate::walker::FileEntry;

/// How many leading bytes are sniffed for NUL when detecting binaries.
const BINARY_SNIFF_LEN: usize = 8192;

/// Per-file failures. These never abort a run; the file is skipped.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("binary content in {path}")]
    Binary { path: PathBuf },

    #[error("{path} is {size} bytes, over the {limit} byte limit")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
}

impl ReadError {
    /// Path of the file that failed.
    pub fn path(&self) -> &Path {
        match self {
            ReadError::Io { path, .. }
            | ReadError::Binary { path }
            | ReadError::TooLarge { path, .. } => path,
        }
    }
}

/// What to do with files whose content is not text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinaryPolicy {
    /// Omit the file and report it as skipped.
    #[default]
    Skip,
    /// Emit a one-line marker in place of the content.
    Placeholder,
    /// Decode anyway, replacing invalid UTF-8 with U+FFFD.
    Lossy,
}

/// How delimiter lines are decorated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelimiterStyle {
    /// Wrap the banner in the file's comment syntax.
    #[default]
    Language,
    /// Emit the bare banner for every file.
    Plain,
}

/// One file's delimiter and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBlock {
    pub relative_path: String,
    pub delimiter: String,
    pub content: String,
    pub lines: usize,
}

impl RenderedBlock {
    /// Append this block to `out`: delimiter line, then the content verbatim.
    ///
    /// Content missing a final newline gets one so the next delimiter starts
    /// on its own line.
    pub fn write_to(&self, out: &mut String) {
        out.push_str(&self.delimiter);
        out.push('\n');
        out.push_str(&self.content);
        if !self.content.is_empty() && !self.content.ends_with('\n') {
            out.push('\n');
        }
    }
}

/// The bare banner for a relative path.
pub fn banner(relative_path: &str) -> String {
    format!("=== {relative_path} ===")
}

/// Build the delimiter line for a file.
///
/// # Examples
///
/// ```
/// use codeview::render::{delimiter_line, DelimiterStyle};
///
/// assert_eq!(delimiter_line("src/lib.rs", DelimiterStyle::Language), "// === src/lib.rs ===");
/// assert_eq!(delimiter_line("index.html", DelimiterStyle::Language), "<!-- === index.html === -->");
/// assert_eq!(delimiter_line("src/lib.rs", DelimiterStyle::Plain), "=== src/lib.rs ===");
/// ```
pub fn delimiter_line(relative_path: &str, style: DelimiterStyle) -> String {
    let banner = banner(relative_path);
    match style {
        DelimiterStyle::Plain => banner,
        DelimiterStyle::Language => detect_comment_style(Path::new(relative_path)).wrap(&banner),
    }
}

/// Count lines: one per `\n`, plus one for trailing unterminated content.
pub fn count_lines(content: &[u8]) -> usize {
    let newlines = bytecount::count(content, b'\n');
    match content.last() {
        None | Some(b'\n') => newlines,
        Some(_) => newlines + 1,
    }
}

/// Content is binary if a NUL byte appears in its first 8 KiB.
pub fn looks_binary(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(BINARY_SNIFF_LEN)].contains(&0)
}

/// Reads files and renders them into blocks.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    pub binary_policy: BinaryPolicy,
    pub delimiter_style: DelimiterStyle,
    /// Files above this many bytes are skipped.
    pub max_file_size: Option<u64>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binary_policy(mut self, policy: BinaryPolicy) -> Self {
        self.binary_policy = policy;
        self
    }

    pub fn delimiter_style(mut self, style: DelimiterStyle) -> Self {
        self.delimiter_style = style;
        self
    }

    pub fn max_file_size(mut self, limit: u64) -> Self {
        self.max_file_size = Some(limit);
        self
    }

    /// Read `entry` and render it.
    ///
    /// Files whose walk-time size is over the limit are skipped unopened.
    pub fn render(&self, entry: &FileEntry) -> Result<RenderedBlock, ReadError> {
        if let Some(limit) = self.max_file_size {
            if entry.size > limit {
                return Err(ReadError::TooLarge {
                    path: entry.path.clone(),
                    size: entry.size,
                    limit,
                });
            }
        }

        let bytes = self.read(&entry.path)?;
        let content = self.decode(&entry.path, bytes)?;

        Ok(RenderedBlock {
            delimiter: delimiter_line(&entry.relative_path, self.delimiter_style),
            relative_path: entry.relative_path.clone(),
            lines: count_lines(content.as_bytes()),
            content,
        })
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, ReadError> {
        let io_error = |source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(io_error)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(io_error)?;
        Ok(bytes)
    }

    fn decode(&self, path: &Path, bytes: Vec<u8>) -> Result<String, ReadError> {
        let bytes = if looks_binary(&bytes) {
            bytes
        } else {
            match String::from_utf8(bytes) {
                Ok(text) => return Ok(text),
                Err(err) => err.into_bytes(),
            }
        };

        match self.binary_policy {
            BinaryPolicy::Skip => Err(ReadError::Binary {
                path: path.to_path_buf(),
            }),
            BinaryPolicy::Placeholder => {
                Ok(format!("<binary file omitted: {} bytes>", bytes.len()))
            }
            BinaryPolicy::Lossy => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }
}
