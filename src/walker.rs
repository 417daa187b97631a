//! Deterministic directory traversal.
//!
//! Uses the `ignore` crate to walk directories in file-name order while
//! respecting .gitignore, .git/info/exclude, global gitignore, and
//! .codeviewignore. Every entry is checked against a [`PathFilter`] before
//! it is descended into or yielded, so excluded directories are pruned
//! rather than filtered after the fact.

use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use thiserror::Error;
use tracing::{debug, warn};

use crate::filter::{to_slash, PathFilter};

/// Per-directory ignore file honoured with gitignore syntax.
pub const IGNORE_FILENAME: &str = ".codeviewignore";

/// Errors that can occur during directory walking.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("path not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("symlink loop detected: {path}")]
    SymlinkLoop { path: PathBuf },
}

impl WalkError {
    /// Root-level errors abort the run; the rest only skip an entry.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WalkError::RootNotFound { .. }
                | WalkError::NotADirectory { .. }
                | WalkError::RootUnreadable { .. }
        )
    }

    /// Path the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            WalkError::RootNotFound { path }
            | WalkError::NotADirectory { path }
            | WalkError::RootUnreadable { path, .. }
            | WalkError::Io { path, .. }
            | WalkError::SymlinkLoop { path } => path,
        }
    }
}

/// Options for directory walking.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Maximum depth to recurse (None = unlimited).
    pub max_depth: Option<usize>,
    /// Respect .gitignore patterns inside git repositories.
    pub respect_gitignore: bool,
    /// Additional ignore files applied from the root.
    pub custom_ignores: Vec<PathBuf>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            respect_gitignore: true,
            custom_ignores: Vec::new(),
        }
    }
}

impl WalkOptions {
    /// Set maximum depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

/// An accepted regular file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path on disk (root joined with the relative path).
    pub path: PathBuf,
    /// Path relative to the root, `/`-separated.
    pub relative_path: String,
    /// Size in bytes at walk time.
    pub size: u64,
}

/// Lazy, single-pass iterator over accepted files.
///
/// Directories are visited depth first with entries sorted by file name,
/// so an unchanged tree always yields the same sequence. Symbolic links are
/// never followed.
///
/// # Examples
///
/// ```no_run
/// use codeview::filter::PathFilter;
/// use codeview::walker::{WalkOptions, Walker};
/// use std::path::Path;
///
/// let walker = Walker::new(Path::new("."), PathFilter::accept_all(), &WalkOptions::default())?;
/// for entry in walker.flatten() {
///     println!("{}", entry.relative_path);
/// }
/// # Ok::<(), codeview::walker::WalkError>(())
/// ```
pub struct Walker {
    root: PathBuf,
    inner: ignore::Walk,
}

impl Walker {
    /// Start a walk at `root`.
    ///
    /// Fails up front when the root is missing, not a directory, or
    /// unreadable; later failures surface as `Err` items.
    pub fn new(root: &Path, filter: PathFilter, options: &WalkOptions) -> Result<Self, WalkError> {
        check_root(root)?;

        let mut builder = WalkBuilder::new(root);

        builder
            .hidden(false)
            .git_ignore(options.respect_gitignore)
            .git_global(options.respect_gitignore)
            .git_exclude(options.respect_gitignore)
            .follow_links(false)
            .max_depth(options.max_depth)
            .sort_by_file_name(|a, b| a.cmp(b));

        builder.add_custom_ignore_filename(IGNORE_FILENAME);

        for ignore_path in &options.custom_ignores {
            if let Some(err) = builder.add_ignore(ignore_path) {
                warn!(path = %ignore_path.display(), error = %err, "could not load ignore file");
            }
        }

        let prefix = root.to_path_buf();
        builder.filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let relative = entry.path().strip_prefix(&prefix).unwrap_or(entry.path());
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            let accepted = filter.accepts(relative, is_dir);
            if !accepted && is_dir {
                debug!(path = %relative.display(), "pruned directory");
            }
            accepted
        });

        Ok(Self {
            root: root.to_path_buf(),
            inner: builder.build(),
        })
    }
}

impl Iterator for Walker {
    type Item = Result<FileEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if file_type.is_dir() {
                        continue;
                    }
                    if !file_type.is_file() {
                        debug!(path = %entry.path().display(), "skipping non-regular file");
                        continue;
                    }

                    let relative = entry
                        .path()
                        .strip_prefix(&self.root)
                        .unwrap_or(entry.path());
                    let size = entry.metadata().map(|m| m.len()).unwrap_or(0);

                    return Some(Ok(FileEntry {
                        path: entry.path().to_path_buf(),
                        relative_path: to_slash(relative),
                        size,
                    }));
                }
                Err(err) => {
                    if let Some(err) = convert_error(err, None) {
                        return Some(Err(err));
                    }
                }
            }
        }
    }
}

fn check_root(root: &Path) -> Result<(), WalkError> {
    let metadata = match fs::metadata(root) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(WalkError::RootNotFound {
                path: root.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(WalkError::RootUnreadable {
                path: root.to_path_buf(),
                source,
            })
        }
    };

    if !metadata.is_dir() {
        return Err(WalkError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    fs::read_dir(root).map_err(|source| WalkError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;

    Ok(())
}

/// Convert an `ignore` error, keeping the innermost path it carries.
/// Ignore-file syntax problems are logged and dropped.
fn convert_error(err: ignore::Error, path: Option<PathBuf>) -> Option<WalkError> {
    match err {
        ignore::Error::WithPath { path, err } => convert_error(*err, Some(path)),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            convert_error(*err, path)
        }
        ignore::Error::Loop { child, .. } => Some(WalkError::SymlinkLoop { path: child }),
        ignore::Error::Io(source) => Some(WalkError::Io {
            path: path.unwrap_or_default(),
            source,
        }),
        other => {
            warn!(error = %other, "ignoring invalid ignore rule");
            None
        }
    }
}
