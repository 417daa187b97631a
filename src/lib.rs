//! Codeview - serialize a codebase into a single text document for LLMs.
//!
//! Codeview walks a directory tree in a fixed order, selects files with
//! include/exclude rules, and concatenates them into one document: a
//! `[<N> lines]` header followed by one `=== <path> ===` delimited block per
//! file.
//!
//! # Quick Start
//!
//! ```no_run
//! use codeview::Codeview;
//!
//! let document = Codeview::new("./my-project")
//!     .exclude("*.lock")
//!     .assemble()
//!     .unwrap();
//!
//! print!("{}", document);
//! eprintln!("{} files skipped", document.skipped().len());
//! ```
//!
//! # Modules
//!
//! - [`filter`] - Include/exclude rules and path filtering
//! - [`walker`] - Deterministic directory traversal with gitignore support
//! - [`language`] - Comment syntax for delimiter lines
//! - [`render`] - Reading files into delimited blocks
//! - [`output`] - The document, its text format, and parsing it back
//! - [`builder`] - Assembly of the document, functional and fluent
//! - [`config`] - Run configuration and cancellation
//! - [`tokens`] - Token estimates for LLM context budgets

pub mod builder;
pub mod config;
pub mod errors;
pub mod filter;
pub mod language;
pub mod output;
pub mod render;
pub mod tokens;
pub mod walker;

// Re-export key types at crate root for convenience
pub use builder::{assemble, Codeview};
pub use config::{CancelToken, Config};
pub use errors::CodeviewError;
pub use filter::{FilterError, FilterRule, PathFilter, Polarity, Precedence, Scope};
pub use output::{parse_document, Document, OutputError, SkippedFile};
pub use render::{BinaryPolicy, DelimiterStyle, ReadError, RenderedBlock, Renderer};
pub use tokens::Encoding;
pub use walker::{FileEntry, WalkError, WalkOptions, Walker};
