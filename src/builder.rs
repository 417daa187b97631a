//! Document assembly.
//!
//! [`assemble`] is the single pass from a root and a [`Config`] to a
//! [`Document`]: walk, filter, render, accumulate. [`Codeview`] is a fluent
//! builder over the same call.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{CancelToken, Config};
use crate::errors::CodeviewError;
use crate::filter::{to_slash, FilterRule, Precedence};
use crate::output::{Document, SkippedFile};
use crate::render::{BinaryPolicy, DelimiterStyle, Renderer};
use crate::walker::{FileEntry, WalkError, Walker};

/// Serialize the tree under `root` into a document.
///
/// Fails only when the configuration is invalid, the root cannot be
/// walked, or the run is cancelled. Files that cannot be read are skipped,
/// logged, and listed in [`Document::skipped`].
///
/// # Examples
///
/// ```no_run
/// use codeview::{assemble, Config};
///
/// let document = assemble("./project", &Config::default())?;
/// print!("{document}");
/// eprintln!("{} files skipped", document.skipped().len());
/// # Ok::<(), codeview::CodeviewError>(())
/// ```
pub fn assemble(root: impl AsRef<Path>, config: &Config) -> Result<Document, CodeviewError> {
    let root = root.as_ref();
    let filter = config.path_filter()?;
    let renderer = config.renderer();

    if config.is_cancelled() {
        return Err(CodeviewError::Aborted);
    }

    let walker = Walker::new(root, filter, &config.walk)?;
    let document = collect(root, walker, &renderer, config)?;

    info!(
        files = document.files().len(),
        lines = document.total_lines(),
        skipped = document.skipped().len(),
        "assembled document"
    );

    Ok(document)
}

/// Render walked entries in order, turning per-entry failures into skips.
fn collect(
    root: &Path,
    entries: impl IntoIterator<Item = Result<FileEntry, WalkError>>,
    renderer: &Renderer,
    config: &Config,
) -> Result<Document, CodeviewError> {
    let mut document = Document::new();

    for item in entries {
        if config.is_cancelled() {
            info!(files = document.files().len(), "run cancelled");
            return Err(CodeviewError::Aborted);
        }

        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                let path = err.path().strip_prefix(root).unwrap_or(err.path());
                document.push_skipped(SkippedFile {
                    path: to_slash(path),
                    reason: err.to_string(),
                });
                continue;
            }
        };

        match renderer.render(&entry) {
            Ok(block) => {
                debug!(path = %block.relative_path, lines = block.lines, "rendered");
                document.push_block(&block);
            }
            Err(err) => {
                warn!(path = %entry.relative_path, error = %err, "skipping file");
                document.push_skipped(SkippedFile {
                    path: entry.relative_path,
                    reason: err.to_string(),
                });
            }
        }
    }

    Ok(document)
}

/// Builder for serializing a codebase.
///
/// # Examples
///
/// ```no_run
/// use codeview::Codeview;
///
/// let document = Codeview::new("./project")
///     .include("src/")
///     .exclude("*.snap")
///     .assemble()?;
/// println!("{}", document.header());
/// # Ok::<(), codeview::CodeviewError>(())
/// ```
pub struct Codeview {
    root: PathBuf,
    config: Config,
}

impl Codeview {
    /// Start from the default configuration.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, Config::default())
    }

    pub fn with_config(root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Drop all rules collected so far, including the defaults.
    pub fn clear_rules(mut self) -> Self {
        self.config.rules.clear();
        self
    }

    pub fn rule(mut self, rule: FilterRule) -> Self {
        self.config.rules.push(rule);
        self
    }

    pub fn include(self, pattern: impl Into<String>) -> Self {
        self.rule(FilterRule::include(pattern))
    }

    pub fn exclude(self, pattern: impl Into<String>) -> Self {
        self.rule(FilterRule::exclude(pattern))
    }

    pub fn precedence(mut self, precedence: Precedence) -> Self {
        self.config.precedence = precedence;
        self
    }

    pub fn binary_policy(mut self, policy: BinaryPolicy) -> Self {
        self.config.binary_policy = policy;
        self
    }

    pub fn delimiter_style(mut self, style: DelimiterStyle) -> Self {
        self.config.delimiter_style = style;
        self
    }

    pub fn max_file_size(mut self, limit: u64) -> Self {
        self.config.max_file_size = Some(limit);
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.walk.max_depth = Some(depth);
        self
    }

    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.config.walk.respect_gitignore = respect;
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.config.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accepted files in output order, without reading them.
    pub fn files(&self) -> Result<Walker, CodeviewError> {
        let filter = self.config.path_filter()?;
        Ok(Walker::new(&self.root, filter, &self.config.walk)?)
    }

    /// Build the document.
    pub fn assemble(&self) -> Result<Document, CodeviewError> {
        assemble(&self.root, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::parse_document;
    use std::fs;
    use std::io;
    use tempfile::TempDir;

    fn write_file(root: &Path, name: &str, content: impl AsRef<[u8]>) {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn create_test_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "src/main.rs", "fn main() {\n    println!(\"hi\");\n}\n");
        write_file(dir.path(), "src/util.py", "def f():\n    pass\n");
        write_file(dir.path(), "README.md", "# Project\n");
        write_file(dir.path(), "notes.txt", "one\ntwo\nthree");
        write_file(dir.path(), ".git/config", "[core]\n");
        write_file(dir.path(), "target/debug/out.txt", "build output\n");
        dir
    }

    #[test]
    fn test_scenario_single_file_with_git_dir() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.txt", "foo\nbar");
        write_file(dir.path(), ".git/config", "[core]\n");

        let doc = assemble(dir.path(), &Config::default()).unwrap();
        assert_eq!(doc.to_text(), "[2 lines]\n=== a.txt ===\nfoo\nbar\n");
        assert!(doc.skipped().is_empty());
    }

    #[test]
    fn test_scenario_empty_root() {
        let dir = TempDir::new().unwrap();

        let doc = assemble(dir.path(), &Config::default()).unwrap();
        assert_eq!(doc.to_text(), "[0 lines]\n");
        assert!(doc.files().is_empty());
    }

    #[test]
    fn test_blocks_in_traversal_order() {
        let dir = create_test_project();

        let doc = assemble(dir.path(), &Config::default()).unwrap();
        let paths: Vec<&str> = doc.files().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "notes.txt", "src/main.rs", "src/util.py"]);

        let text = doc.to_text();
        assert!(text.contains("<!-- === README.md === -->\n# Project\n"));
        assert!(text.contains("// === src/main.rs ===\n"));
        assert!(text.contains("# === src/util.py ===\n"));
    }

    #[test]
    fn test_header_equals_sum_of_block_lines() {
        let dir = create_test_project();

        let doc = assemble(dir.path(), &Config::default()).unwrap();
        let sum: usize = doc.files().iter().map(|f| f.lines).sum();
        assert_eq!(doc.total_lines(), sum);
        assert_eq!(doc.total_lines(), 1 + 3 + 3 + 2);
        assert!(doc.to_text().starts_with("[9 lines]\n"));
    }

    #[test]
    fn test_deterministic_output() {
        let dir = create_test_project();

        let first = assemble(dir.path(), &Config::default()).unwrap().to_text();
        let second = assemble(dir.path(), &Config::default()).unwrap().to_text();
        assert_eq!(first, second);
    }

    #[test]
    fn test_round_trip_content_identity() {
        let dir = create_test_project();

        let doc = assemble(dir.path(), &Config::default()).unwrap();
        let parsed = parse_document(&doc.to_text()).unwrap();

        assert_eq!(parsed.total_lines, doc.total_lines());
        assert_eq!(parsed.blocks.len(), doc.files().len());
        for block in &parsed.blocks {
            let mut on_disk = fs::read_to_string(dir.path().join(&block.path)).unwrap();
            if !on_disk.ends_with('\n') {
                on_disk.push('\n');
            }
            assert_eq!(block.content, on_disk, "content of {}", block.path);
        }
    }

    #[test]
    fn test_block_body_is_file_content() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.txt", "x\n");
        write_file(dir.path(), "b.txt", "y\n");

        let text = assemble(dir.path(), &Config::default()).unwrap().to_text();
        assert_eq!(text, "[2 lines]\n=== a.txt ===\nx\n=== b.txt ===\ny\n");

        let (_, a_body) = text.split_once("=== a.txt ===\n").unwrap();
        let (a_body, _) = a_body.split_once("=== b.txt ===").unwrap();
        assert_eq!(a_body, "x\n");
    }

    #[test]
    fn test_pruned_directory_never_emitted() {
        let dir = create_test_project();

        let doc = Codeview::new(dir.path())
            .include("*.txt")
            .assemble()
            .unwrap();

        let paths: Vec<&str> = doc.files().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["notes.txt"]);
    }

    #[test]
    fn test_exclude_beats_include() {
        let dir = create_test_project();

        let doc = Codeview::new(dir.path())
            .include("src/")
            .exclude("*.py")
            .assemble()
            .unwrap();

        let paths: Vec<&str> = doc.files().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/main.rs"]);
    }

    #[test]
    fn test_last_match_precedence() {
        let dir = create_test_project();

        let doc = Codeview::new(dir.path())
            .precedence(Precedence::LastMatch)
            .exclude("*.txt")
            .include("notes.txt")
            .assemble()
            .unwrap();

        assert!(doc.files().iter().any(|f| f.path == "notes.txt"));
    }

    #[test]
    fn test_binary_file_skipped_and_reported() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.txt", "a\n");
        write_file(dir.path(), "blob.dat", [0u8, 159, 146, 150]);
        write_file(dir.path(), "c.txt", "c\n");

        let doc = assemble(dir.path(), &Config::default()).unwrap();
        assert_eq!(doc.files().len(), 2);
        assert_eq!(doc.skipped().len(), 1);
        assert_eq!(doc.skipped()[0].path, "blob.dat");
        assert_eq!(doc.total_lines(), 2);
    }

    #[test]
    fn test_binary_placeholder() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "blob.dat", [0u8, 1, 2, 3]);

        let doc = Codeview::new(dir.path())
            .binary_policy(BinaryPolicy::Placeholder)
            .assemble()
            .unwrap();
        assert_eq!(
            doc.to_text(),
            "[1 lines]\n=== blob.dat ===\n<binary file omitted: 4 bytes>\n"
        );
        assert!(doc.skipped().is_empty());
    }

    fn file_entry(root: &Path, name: &str) -> FileEntry {
        let path = root.join(name);
        let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        FileEntry {
            path,
            relative_path: name.to_string(),
            size,
        }
    }

    #[test]
    fn test_failed_entries_are_skipped_and_run_continues() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.txt", "a\n");
        write_file(dir.path(), "gone.txt", "gone\n");
        write_file(dir.path(), "z.txt", "z\nz\n");

        let gone = file_entry(dir.path(), "gone.txt");
        fs::remove_file(&gone.path).unwrap();

        let entries = vec![
            Ok(file_entry(dir.path(), "a.txt")),
            Ok(gone),
            Ok(file_entry(dir.path(), "z.txt")),
        ];
        let doc = collect(dir.path(), entries, &Renderer::new(), &Config::default()).unwrap();

        let paths: Vec<&str> = doc.files().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "z.txt"]);
        assert_eq!(doc.skipped().len(), 1);
        assert_eq!(doc.skipped()[0].path, "gone.txt");
        assert_eq!(doc.total_lines(), 3);
        assert_eq!(
            doc.to_text(),
            "[3 lines]\n=== a.txt ===\na\n=== z.txt ===\nz\nz\n"
        );
    }

    #[test]
    fn test_walk_errors_are_skipped_relative_to_root() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.txt", "a\n");

        let entries = vec![
            Err(WalkError::Io {
                path: dir.path().join("private/dir"),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            }),
            Ok(file_entry(dir.path(), "a.txt")),
        ];
        let doc = collect(dir.path(), entries, &Renderer::new(), &Config::default()).unwrap();

        assert_eq!(doc.files().len(), 1);
        assert_eq!(doc.skipped().len(), 1);
        assert_eq!(doc.skipped()[0].path, "private/dir");
        assert_eq!(doc.header(), "[1 lines]");
    }

    #[test]
    fn test_oversized_file_skipped() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "big.txt", "x".repeat(100));
        write_file(dir.path(), "small.txt", "x\n");

        let doc = Codeview::new(dir.path()).max_file_size(10).assemble().unwrap();
        assert_eq!(doc.files().len(), 1);
        assert_eq!(doc.skipped()[0].path, "big.txt");
    }

    #[test]
    fn test_plain_delimiters() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "main.rs", "fn main() {}\n");

        let doc = Codeview::new(dir.path())
            .delimiter_style(DelimiterStyle::Plain)
            .assemble()
            .unwrap();
        assert_eq!(doc.to_text(), "[1 lines]\n=== main.rs ===\nfn main() {}\n");
    }

    #[test]
    fn test_cancelled_run_aborts() {
        let dir = create_test_project();
        let token = CancelToken::new();
        token.cancel();

        let result = Codeview::new(dir.path()).cancel_token(token).assemble();
        assert!(matches!(result, Err(CodeviewError::Aborted)));
    }

    #[test]
    fn test_cancel_between_files_aborts() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.txt", "a\n");
        write_file(dir.path(), "b.txt", "b\n");

        let token = CancelToken::new();
        let config = Config {
            cancel: Some(token.clone()),
            ..Config::default()
        };

        let mut pulled = 0;
        let entries = ["a.txt", "b.txt"].into_iter().map(|name| {
            pulled += 1;
            if pulled == 2 {
                token.cancel();
            }
            Ok(file_entry(dir.path(), name))
        });

        let result = collect(dir.path(), entries, &Renderer::new(), &config);
        assert!(matches!(result, Err(CodeviewError::Aborted)));
        assert_eq!(pulled, 2);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();

        let result = assemble(dir.path().join("missing"), &Config::default());
        assert!(matches!(
            result,
            Err(CodeviewError::Walk(WalkError::RootNotFound { .. }))
        ));
    }

    #[test]
    fn test_invalid_pattern_fails_before_walking() {
        let result = Codeview::new("/nonexistent/root").exclude("a/***").assemble();
        assert!(matches!(result, Err(CodeviewError::Filter(_))));
    }

    #[test]
    fn test_files_lists_without_reading() {
        let dir = create_test_project();

        let paths: Vec<String> = Codeview::new(dir.path())
            .files()
            .unwrap()
            .filter_map(|r| r.ok())
            .map(|e| e.relative_path)
            .collect();
        assert_eq!(paths, vec!["README.md", "notes.txt", "src/main.rs", "src/util.py"]);
    }

    #[test]
    fn test_clear_rules_includes_hidden() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), ".env", "KEY=1\n");

        let doc = Codeview::new(dir.path()).clear_rules().assemble().unwrap();
        assert_eq!(doc.files().len(), 1);
        assert_eq!(doc.files()[0].path, ".env");
    }
}
