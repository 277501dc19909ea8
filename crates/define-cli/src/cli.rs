//! CLI argument definitions for the Define-XML editor.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "define-editor",
    version,
    about = "Edit Define-XML metadata documents with scripted actions",
    long_about = "Edit Define-XML metadata documents stored as JSON.\n\n\
                  Applies scripts of edit actions and intents, checks cross-reference\n\
                  integrity and summarizes datasets."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Settings file (default: the platform config folder).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply a JSON script of actions and intents to a document.
    Apply(ApplyArgs),

    /// Report integrity issues. Exits with 1 when any are found.
    Check(DocumentArgs),

    /// List datasets with variable and key counts.
    Summary(DocumentArgs),
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Document to edit (JSON).
    #[arg(value_name = "DOCUMENT")]
    pub document: PathBuf,

    /// Script: a JSON array of actions and intents.
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Where to write the edited document. Without it nothing is written.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Reject any step that leaves integrity issues behind.
    #[arg(long = "verify")]
    pub verify: bool,
}

#[derive(Parser)]
pub struct DocumentArgs {
    /// Document to inspect (JSON).
    #[arg(value_name = "DOCUMENT")]
    pub document: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
