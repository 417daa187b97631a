//! Run configuration.
//!
//! Everything that shapes a run travels in one [`Config`] value passed to
//! [`assemble`](crate::builder::assemble); there is no global state, so
//! several roots can be serialized in one process with different settings.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::filter::{default_rules, FilterError, FilterRule, PathFilter, Precedence};
use crate::render::{BinaryPolicy, DelimiterStyle, Renderer};
use crate::walker::WalkOptions;

/// Shared flag for aborting a run between files.
///
/// Clones observe the same flag, so one clone can be handed to a signal
/// handler while another rides along in the [`Config`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the run stop before the next file.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Configuration for a single serialization run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Ordered filter rules.
    pub rules: Vec<FilterRule>,
    /// How overlapping include/exclude matches resolve.
    pub precedence: Precedence,
    /// Traversal options.
    pub walk: WalkOptions,
    /// Handling of non-text files.
    pub binary_policy: BinaryPolicy,
    /// Decoration of delimiter lines.
    pub delimiter_style: DelimiterStyle,
    /// Skip files larger than this many bytes.
    pub max_file_size: Option<u64>,
    /// Checked between files.
    pub cancel: Option<CancelToken>,
}

impl Default for Config {
    /// The default rule set: hidden entries, build and dependency
    /// directories, and binary-looking files are excluded.
    fn default() -> Self {
        Self {
            rules: default_rules(),
            precedence: Precedence::default(),
            walk: WalkOptions::default(),
            binary_policy: BinaryPolicy::default(),
            delimiter_style: DelimiterStyle::default(),
            max_file_size: None,
            cancel: None,
        }
    }
}

impl Config {
    /// A configuration without any filter rules.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            ..Default::default()
        }
    }

    /// Compile the rule list.
    pub fn path_filter(&self) -> Result<PathFilter, FilterError> {
        PathFilter::new(&self.rules, self.precedence)
    }

    pub fn renderer(&self) -> Renderer {
        Renderer {
            binary_policy: self.binary_policy,
            delimiter_style: self.delimiter_style,
            max_file_size: self.max_file_size,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}
