//! Main CLI application structure

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::date;
use crate::storage::Config;
use crate::view::ViewKind;

use super::output::{Output, OutputFormat};
use super::{check_cmd, done_cmd, view_cmd};

#[derive(Parser)]
#[command(name = "trellis")]
#[command(author, version, about = "Plain-text trusted-system outline engine")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Outline file (falls back to the configured default)
    #[arg(long, global = true, env = "TRELLIS_FILE")]
    pub file: Option<PathBuf>,

    /// Evaluate views as if the current time were this instant
    #[arg(long, global = true, value_name = "YYYY-MM-DD[ HH:MM]")]
    pub at: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a filtered view of the outline
    View {
        /// Which view to render
        #[arg(value_enum)]
        kind: ViewArg,

        /// Contexts to include (repeatable; empty means everything)
        #[arg(long, short = 'c')]
        context: Vec<String>,

        /// Contexts to exclude (repeatable; wins over --context)
        #[arg(long, short = 'x')]
        exclude: Vec<String>,
    },

    /// Mark the item on a source line as done
    Done {
        /// 1-based line number in the outline file
        #[arg(long)]
        line: usize,
    },

    /// Parse the outline and report warnings
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewArg {
    Next,
    Inbox,
    Recurring,
    Waiting,
    All,
}

impl From<ViewArg> for ViewKind {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::Next => ViewKind::NextActions,
            ViewArg::Inbox => ViewKind::Inboxes,
            ViewArg::Recurring => ViewKind::Recurring,
            ViewArg::Waiting => ViewKind::Waiting,
            ViewArg::All => ViewKind::All,
        }
    }
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);
    let config = Config::load()?;
    let now = resolve_now(cli.at.as_deref())?;

    let path = cli
        .file
        .clone()
        .or_else(|| config.outline.clone())
        .context("no outline file given (use --file or set `outline` in the config)")?;
    output.verbose(&format!("outline file: {}", path.display()));

    match cli.command {
        Commands::View {
            kind,
            context,
            exclude,
        } => view_cmd::run(&output, &config, &path, kind.into(), context, exclude, now),
        Commands::Done { line } => done_cmd::run(&output, &path, line, now),
        Commands::Check => check_cmd::run(&output, &path),
    }
}

/// `--at` accepts a stamp or a bare date (read as that day's start).
fn resolve_now(at: Option<&str>) -> Result<NaiveDateTime> {
    match at {
        None => Ok(Local::now().naive_local()),
        Some(s) => date::parse_datetime(s)
            .or_else(|| date::parse_date(s).map(|d| d.and_time(chrono::NaiveTime::MIN)))
            .with_context(|| format!("invalid --at value '{}'", s)),
    }
}
