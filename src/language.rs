//! Comment syntax per language family.
//!
//! Delimiter lines are wrapped in the comment syntax of the file they
//! introduce so that a document pasted into an editor keeps highlighting
//! sane.

use std::path::Path;

/// Line or block comment syntax of a language family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `// ...` (C family, Rust, Go, JavaScript, ...)
    DoubleSlash,
    /// `# ...` (shell, Python, Ruby, YAML, TOML, ...)
    Hash,
    /// `-- ...` (SQL, Lua, Haskell)
    DoubleDash,
    /// `; ...` (Lisps, assembly, INI)
    Semicolon,
    /// `% ...` (TeX, Erlang)
    Percent,
    /// `/* ... */` (CSS)
    Block,
    /// `<!-- ... -->` (HTML, XML, Markdown)
    Markup,
    /// No comment syntax; the banner is emitted bare.
    None,
}

impl CommentStyle {
    /// Every style, bare last.
    pub const ALL: [CommentStyle; 8] = [
        CommentStyle::DoubleSlash,
        CommentStyle::Hash,
        CommentStyle::DoubleDash,
        CommentStyle::Semicolon,
        CommentStyle::Percent,
        CommentStyle::Block,
        CommentStyle::Markup,
        CommentStyle::None,
    ];

    /// Opening and closing comment markers. Line comments close with `""`.
    pub fn delimiters(self) -> (&'static str, &'static str) {
        match self {
            CommentStyle::DoubleSlash => ("//", ""),
            CommentStyle::Hash => ("#", ""),
            CommentStyle::DoubleDash => ("--", ""),
            CommentStyle::Semicolon => (";", ""),
            CommentStyle::Percent => ("%", ""),
            CommentStyle::Block => ("/*", "*/"),
            CommentStyle::Markup => ("<!--", "-->"),
            CommentStyle::None => ("", ""),
        }
    }

    /// Wrap `text` in this comment syntax.
    pub fn wrap(self, text: &str) -> String {
        match self.delimiters() {
            ("", _) => text.to_string(),
            (open, "") => format!("{open} {text}"),
            (open, close) => format!("{open} {text} {close}"),
        }
    }
}

/// Detect the comment style of a file from its name and extension.
///
/// # Examples
///
/// ```
/// use codeview::language::{detect_comment_style, CommentStyle};
/// use std::path::Path;
///
/// assert_eq!(detect_comment_style(Path::new("src/main.rs")), CommentStyle::DoubleSlash);
/// assert_eq!(detect_comment_style(Path::new("Makefile")), CommentStyle::Hash);
/// assert_eq!(detect_comment_style(Path::new("data.json")), CommentStyle::None);
/// ```
pub fn detect_comment_style(path: &Path) -> CommentStyle {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match name.as_str() {
        "makefile" | "gnumakefile" | "dockerfile" | "containerfile" | "gemfile" | "rakefile"
        | "vagrantfile" | "procfile" | "cmakelists.txt" | "requirements.txt" => {
            return CommentStyle::Hash
        }
        _ => {}
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase());

    match extension.as_deref() {
        Some(
            "rs" | "c" | "h" | "cc" | "cpp" | "cxx" | "hpp" | "hh" | "hxx" | "cs" | "java" | "kt"
            | "kts" | "scala" | "swift" | "go" | "js" | "jsx" | "mjs" | "cjs" | "ts" | "tsx"
            | "mts" | "cts" | "dart" | "zig" | "proto" | "php" | "groovy" | "gradle" | "sol"
            | "scss" | "less" | "jsonc" | "v" | "d",
        ) => CommentStyle::DoubleSlash,
        Some(
            "py" | "pyi" | "rb" | "sh" | "bash" | "zsh" | "fish" | "pl" | "pm" | "r" | "toml"
            | "yaml" | "yml" | "cfg" | "conf" | "cmake" | "nim" | "ex" | "exs" | "jl" | "ps1"
            | "tf" | "mk" | "dockerfile" | "gitignore" | "env" | "properties" | "nix" | "cr",
        ) => CommentStyle::Hash,
        Some("sql" | "lua" | "hs" | "lhs" | "elm" | "ada" | "adb" | "ads" | "vhd" | "vhdl") => {
            CommentStyle::DoubleDash
        }
        Some("lisp" | "lsp" | "clj" | "cljs" | "cljc" | "edn" | "el" | "scm" | "ss" | "rkt" | "asm"
        | "s" | "ini") => CommentStyle::Semicolon,
        Some("tex" | "sty" | "cls" | "bib" | "erl" | "hrl") => CommentStyle::Percent,
        Some("css") => CommentStyle::Block,
        Some("html" | "htm" | "xhtml" | "xml" | "xsd" | "xsl" | "svg" | "vue" | "svelte" | "md"
        | "markdown") => CommentStyle::Markup,
        _ => CommentStyle::None,
    }
}
