//! Include/exclude rules deciding which paths reach the output.
//!
//! Patterns follow rsync-style filter semantics:
//!
//! - a trailing `/` restricts a rule to directories,
//! - a leading `/` anchors a rule at the root,
//! - a pattern containing `/` is matched against the whole relative path,
//!   otherwise against the final path component at any depth.
//!
//! Matching is pure string comparison on root-relative paths; nothing here
//! touches the filesystem.

use std::path::{Component, Path};

use glob::{MatchOptions, Pattern};
use thiserror::Error;

/// Errors raised while compiling filter rules.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("empty filter pattern")]
    EmptyPattern,

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Whether a matching rule admits or rejects a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Include,
    Exclude,
}

/// Which kind of entry a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    File,
    Directory,
    #[default]
    Any,
}

impl Scope {
    fn applies_to(self, is_dir: bool) -> bool {
        match self {
            Scope::Any => true,
            Scope::File => !is_dir,
            Scope::Directory => is_dir,
        }
    }
}

/// How overlapping include and exclude matches are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precedence {
    /// Any matching exclude rule rejects the path. Include rules act as an
    /// allowlist for files: once one exists, unmatched files are rejected,
    /// so `include("*.rs")` alone keeps only `.rs` files.
    #[default]
    ExcludeWins,
    /// The last matching rule decides; unmatched paths are included.
    LastMatch,
}

/// A single inclusion or exclusion pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRule {
    pub pattern: String,
    pub polarity: Polarity,
    pub scope: Scope,
}

impl FilterRule {
    /// Create an include rule. A trailing `/` makes it directory-scoped.
    pub fn include(pattern: impl Into<String>) -> Self {
        Self::with_polarity(pattern.into(), Polarity::Include)
    }

    /// Create an exclude rule. A trailing `/` makes it directory-scoped.
    pub fn exclude(pattern: impl Into<String>) -> Self {
        Self::with_polarity(pattern.into(), Polarity::Exclude)
    }

    /// Restrict the rule to files or directories.
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    fn with_polarity(pattern: String, polarity: Polarity) -> Self {
        let scope = if pattern.ends_with('/') {
            Scope::Directory
        } else {
            Scope::Any
        };
        Self {
            pattern,
            polarity,
            scope,
        }
    }
}

/// Directories skipped by default: dependency caches and build output.
const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "node_modules/",
    "target/",
    "build/",
    "dist/",
    "__pycache__/",
    "venv/",
];

/// Extensions of files that are almost never text.
const DEFAULT_BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tiff", "pdf", "zip", "gz", "tgz", "bz2",
    "xz", "7z", "rar", "tar", "jar", "war", "class", "exe", "dll", "so", "dylib", "o", "a", "lib",
    "obj", "pyc", "pyo", "wasm", "woff", "woff2", "ttf", "otf", "eot", "mp3", "mp4", "wav", "ogg",
    "flac", "avi", "mov", "mkv", "sqlite", "db", "bin",
];

/// The default rule set: hidden entries, dependency/build directories, and
/// binary-looking files are excluded.
pub fn default_rules() -> Vec<FilterRule> {
    let mut rules = vec![FilterRule::exclude(".*")];
    rules.extend(DEFAULT_EXCLUDED_DIRS.iter().map(|d| FilterRule::exclude(*d)));
    rules.extend(
        DEFAULT_BINARY_EXTENSIONS
            .iter()
            .map(|ext| FilterRule::exclude(format!("*.{ext}")).scope(Scope::File)),
    );
    rules
}

/// Render a relative path with `/` separators regardless of platform.
pub fn to_slash(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        if let Component::Normal(part) = component {
            if !out.is_empty() {
                out.push('/');
            }
            out.push_str(&part.to_string_lossy());
        }
    }
    out
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct CompiledRule {
    pattern: Pattern,
    polarity: Polarity,
    scope: Scope,
    anchored: bool,
}

impl CompiledRule {
    fn compile(rule: &FilterRule) -> Result<Self, FilterError> {
        let mut body = rule.pattern.trim();
        let mut scope = rule.scope;

        if let Some(stripped) = body.strip_suffix('/') {
            body = stripped;
            scope = Scope::Directory;
        }

        let rooted = body.starts_with('/');
        let body = body.trim_start_matches('/');
        if body.is_empty() {
            return Err(FilterError::EmptyPattern);
        }

        let pattern = Pattern::new(body).map_err(|source| FilterError::InvalidPattern {
            pattern: rule.pattern.clone(),
            source,
        })?;

        Ok(Self {
            pattern,
            polarity: rule.polarity,
            scope,
            anchored: rooted || body.contains('/'),
        })
    }

    fn matches(&self, relative: &str) -> bool {
        if self.anchored {
            self.pattern.matches_with(relative, MATCH_OPTIONS)
        } else {
            let name = relative.rsplit('/').next().unwrap_or(relative);
            self.pattern.matches_with(name, MATCH_OPTIONS)
        }
    }
}

/// Compiled rule set answering whether a path participates in the output.
#[derive(Debug, Clone)]
pub struct PathFilter {
    rules: Vec<CompiledRule>,
    precedence: Precedence,
    has_includes: bool,
}

impl PathFilter {
    /// Compile rules, failing on the first malformed pattern.
    pub fn new(rules: &[FilterRule], precedence: Precedence) -> Result<Self, FilterError> {
        let rules = rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let has_includes = rules.iter().any(|r| r.polarity == Polarity::Include);

        Ok(Self {
            rules,
            precedence,
            has_includes,
        })
    }

    /// A filter with no rules; accepts everything.
    pub fn accept_all() -> Self {
        Self {
            rules: Vec::new(),
            precedence: Precedence::default(),
            has_includes: false,
        }
    }

    /// Decide whether `path` (relative to the root) participates.
    ///
    /// A rejected directory prunes everything beneath it, so a file is
    /// rejected whenever one of its ancestors is.
    pub fn accepts(&self, path: &Path, is_dir: bool) -> bool {
        let relative = to_slash(path);
        if relative.is_empty() {
            return true;
        }

        let ancestors: Vec<&str> = relative
            .match_indices('/')
            .map(|(i, _)| &relative[..i])
            .collect();

        if ancestors.iter().any(|dir| !self.accepts_directory(dir)) {
            return false;
        }

        if is_dir {
            self.accepts_directory(&relative)
        } else {
            self.accepts_file(&relative, &ancestors)
        }
    }

    fn accepts_directory(&self, relative: &str) -> bool {
        let verdicts = self
            .rules
            .iter()
            .filter(|r| r.scope.applies_to(true) && r.matches(relative))
            .map(|r| r.polarity);
        self.decide(verdicts, true)
    }

    fn accepts_file(&self, relative: &str, ancestors: &[&str]) -> bool {
        // Directory includes admit every file below a matching directory.
        let verdicts = self.rules.iter().filter_map(|r| {
            if r.scope.applies_to(false) && r.matches(relative) {
                Some(r.polarity)
            } else if r.polarity == Polarity::Include
                && r.scope != Scope::File
                && ancestors.iter().any(|dir| r.matches(dir))
            {
                Some(Polarity::Include)
            } else {
                None
            }
        });

        let default = match self.precedence {
            Precedence::ExcludeWins => !self.has_includes,
            Precedence::LastMatch => true,
        };
        self.decide(verdicts, default)
    }

    fn decide(&self, verdicts: impl Iterator<Item = Polarity>, default: bool) -> bool {
        match self.precedence {
            Precedence::ExcludeWins => {
                let mut matched = false;
                for polarity in verdicts {
                    if polarity == Polarity::Exclude {
                        return false;
                    }
                    matched = true;
                }
                matched || default
            }
            Precedence::LastMatch => verdicts
                .last()
                .map_or(default, |p| p == Polarity::Include),
        }
    }
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::accept_all()
    }
}
