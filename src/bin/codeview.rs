//! Codeview CLI - serialize a codebase into a single text document.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::{generate, Shell};
use codeview::errors::{exit_code, CodeviewError};
use codeview::filter::{default_rules, to_slash, FilterRule, Precedence};
use codeview::render::{BinaryPolicy, DelimiterStyle};
use codeview::tokens::Encoding;
use codeview::walker::WalkOptions;
use codeview::{assemble, Codeview, Config};
use serde::Serialize;
use tracing::warn;

#[derive(Parser)]
#[command(name = "codeview")]
#[command(about = "Serialize a codebase into a single text document for LLMs")]
#[command(version)]
struct Cli {
    /// Root directory to serialize
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Write the document to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only include files matching this pattern (repeatable); once given,
    /// files matching no include pattern are left out
    #[arg(short, long, value_name = "PATTERN")]
    include: Vec<String>,

    /// Exclude paths matching this pattern (repeatable)
    #[arg(short, long, value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Do not exclude hidden files, build directories, and binaries by default
    #[arg(long)]
    no_default_excludes: bool,

    /// Resolve overlapping patterns by the last match instead of letting excludes win
    #[arg(long)]
    last_match_wins: bool,

    /// What to do with binary files
    #[arg(long, value_enum, default_value = "skip")]
    binary: BinaryArg,

    /// Use bare `=== path ===` delimiters instead of language comments
    #[arg(long)]
    plain_delimiters: bool,

    /// Skip files larger than this many bytes
    #[arg(long, value_name = "BYTES")]
    max_file_size: Option<u64>,

    /// Maximum directory depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Do not respect .gitignore files
    #[arg(long)]
    no_gitignore: bool,

    /// Extra ignore file in gitignore syntax (repeatable)
    #[arg(long, value_name = "PATH")]
    ignore_file: Vec<PathBuf>,

    /// List accepted files instead of rendering them
    #[arg(long)]
    list: bool,

    /// Output a JSON report instead of the document
    #[arg(long)]
    json: bool,

    /// Print file, line, and token totals to stderr
    #[arg(long)]
    stats: bool,

    /// Token encoding for --stats (cl100k or o200k)
    #[arg(long, default_value = "cl100k")]
    encoding: Encoding,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Generate shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

#[derive(Clone, ValueEnum)]
enum BinaryArg {
    Skip,
    Placeholder,
    Lossy,
}

impl From<BinaryArg> for BinaryPolicy {
    fn from(arg: BinaryArg) -> Self {
        match arg {
            BinaryArg::Skip => BinaryPolicy::Skip,
            BinaryArg::Placeholder => BinaryPolicy::Placeholder,
            BinaryArg::Lossy => BinaryPolicy::Lossy,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        generate(shell, &mut Cli::command(), "codeview", &mut std::io::stdout());
        return;
    }

    init_tracing(cli.verbose, cli.quiet);
    let json_output = cli.json;

    if let Err(e) = run(cli) {
        if json_output {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
            }

            let payload = ErrorOutput {
                error: e.to_string(),
            };

            let json = serde_json::to_string(&payload)
                .unwrap_or_else(|_| "{\"error\":\"serialization failed\"}".to_string());
            eprintln!("{json}");
        } else {
            eprintln!("error: {}", e);
        }
        std::process::exit(exit_code(&e));
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose >= 2),
        )
        .init();
}

fn build_config(cli: &Cli) -> Config {
    let mut rules = if cli.no_default_excludes {
        Vec::new()
    } else {
        default_rules()
    };
    rules.extend(cli.include.iter().map(FilterRule::include));
    rules.extend(cli.exclude.iter().map(FilterRule::exclude));

    // Keep the output file out of its own document.
    if let Some(rule) = cli
        .output
        .as_deref()
        .and_then(|output| output_exclusion(&cli.path, output))
    {
        rules.push(rule);
    }

    Config {
        rules,
        precedence: if cli.last_match_wins {
            Precedence::LastMatch
        } else {
            Precedence::ExcludeWins
        },
        walk: WalkOptions {
            max_depth: cli.max_depth,
            respect_gitignore: !cli.no_gitignore,
            custom_ignores: cli.ignore_file.clone(),
        },
        binary_policy: cli.binary.clone().into(),
        delimiter_style: if cli.plain_delimiters {
            DelimiterStyle::Plain
        } else {
            DelimiterStyle::Language
        },
        max_file_size: cli.max_file_size,
        cancel: None,
    }
}

/// Anchored exclude rule for `output` when it lies under `root`.
fn output_exclusion(root: &Path, output: &Path) -> Option<FilterRule> {
    let root = root.canonicalize().ok()?;
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let output = parent.canonicalize().ok()?.join(output.file_name()?);
    let relative = output.strip_prefix(&root).ok()?;
    Some(FilterRule::exclude(format!(
        "/{}",
        glob::Pattern::escape(&to_slash(relative))
    )))
}

fn run(cli: Cli) -> Result<(), CodeviewError> {
    let config = build_config(&cli);

    if cli.list {
        return run_list(&cli.path, config);
    }

    let document = assemble(&cli.path, &config)?;

    let rendered = if cli.json {
        document.to_json()?
    } else {
        document.to_text()
    };

    match &cli.output {
        Some(path) => fs::write(path, &rendered)?,
        None => {
            let mut out = std::io::stdout().lock();
            out.write_all(rendered.as_bytes())?;
            if cli.json {
                writeln!(out)?;
            }
            out.flush()?;
        }
    }

    let skipped = document.skipped().len();
    if skipped > 0 && !cli.quiet {
        eprintln!(
            "{} {} skipped",
            skipped,
            if skipped == 1 { "file" } else { "files" }
        );
    }

    if cli.stats {
        let encoding = cli.encoding;
        eprintln!(
            "{} files, {} lines, {} tokens ({})",
            document.files().len(),
            document.total_lines(),
            document.token_count(encoding),
            encoding
        );
    }

    Ok(())
}

fn run_list(root: &Path, config: Config) -> Result<(), CodeviewError> {
    let mut out = std::io::stdout().lock();
    for entry in Codeview::with_config(root, config).files()? {
        match entry {
            Ok(entry) => writeln!(out, "{}", entry.relative_path)?,
            Err(e) => warn!(error = %e, "skipping unreadable entry"),
        }
    }
    out.flush()?;
    Ok(())
}
