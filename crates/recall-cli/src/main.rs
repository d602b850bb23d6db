#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use recall_core::config::{ProcessEnv, load_project_config};
use recall_core::error::ErrorCode;
use std::env;
use std::io;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "recall: spaced-repetition review emails for a blog",
    long_about = None
)]
struct Cli {
    /// Enable debug logging for recall crates.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output (alias for `--format json`).
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Config file (defaults to `.recall/config.toml`, then the user config dir).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Review",
        about = "Send today's review email",
        long_about = "Pick one post by Leitner schedule, email it, then record the review.",
        after_help = "EXAMPLES:\n    # Daily run from cron\n    recall run\n\n    # Preview without sending or writing history\n    recall run --dry-run --html\n\n    # Replay a specific day deterministically\n    recall run --dry-run --now 2024-06-01T09:00:00Z --seed 7"
    )]
    Run(cmd::run::RunArgs),

    #[command(
        next_help_heading = "Review",
        about = "Show each post's box and due date",
        after_help = "EXAMPLES:\n    # Full schedule\n    recall status\n\n    # Only posts that could be picked today\n    recall status --due --json"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "Content",
        about = "Browse hierarchical tags",
        after_help = "EXAMPLES:\n    # Tag tree with counts\n    recall tags tree\n\n    # Posts under a tag and its children\n    recall tags posts 개발/React\n\n    # URL path for a tag\n    recall tags slug 개발/React"
    )]
    Tags(cmd::tags::TagsArgs),

    #[command(
        next_help_heading = "Content",
        about = "Build the search index from markdown",
        after_help = "EXAMPLES:\n    # Print the index\n    recall index --json\n\n    # Write it for the catalog to read\n    recall index --output dist/search.json"
    )]
    Index(cmd::index::IndexArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("RECALL_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "recall=debug,info"
        } else {
            "recall=info,warn"
        })
    });

    let format = env::var("RECALL_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_root = env::current_dir()?;
    let output = cli.output_mode();
    debug!(root = %project_root.display(), ?output, "starting");

    let config = match load_project_config(&project_root, cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            render_error(
                output,
                &CliError::with_code(format!("{err:#}"), ErrorCode::ConfigParseError),
            )?;
            return Err(err);
        }
    };

    match &cli.command {
        Commands::Run(args) => {
            cmd::run::run_review(args, output, &config, &project_root, &ProcessEnv)
        }
        Commands::Status(args) => {
            cmd::status::run_status(args, output, &config, &project_root, &ProcessEnv)
        }
        Commands::Tags(args) => cmd::tags::run_tags(args, output, &config, &project_root),
        Commands::Index(args) => cmd::index::run_index(args, output, &config, &project_root),
    }
}
