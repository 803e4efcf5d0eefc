//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "subs",
    version,
    about = "Subscription engine - resolve, validate and refresh rule subscriptions",
    long_about = "Manage rule subscriptions and inspect the rules they resolve to.\n\n\
                  State is read from the data directory configured in config.toml\n\
                  (or given with --data-dir)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (default: platform config directory).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Data directory (overrides the configuration).
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

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
}

#[derive(Subcommand)]
pub enum Command {
    /// Show installed subscriptions and the rules they resolve to.
    Resolve(ResolveArgs),

    /// Check every installed subscription for a newer remote version.
    CheckUpdates,

    /// Check subscription files for structural problems.
    Validate(ValidateArgs),

    /// Install a local subscription file.
    Import(ImportArgs),

    /// Install a remote subscription from its URL.
    Add(AddArgs),

    /// Uninstall a subscription and its overrides.
    Remove(RemoveArgs),
}

#[derive(Parser)]
pub struct ResolveArgs {
    /// List the active rules of one app.
    #[arg(long = "app", value_name = "APP_ID")]
    pub app: Option<String>,
}

#[derive(Parser)]
pub struct ValidateArgs {
    /// Subscription JSON files to check.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Parser)]
pub struct ImportArgs {
    /// Subscription JSON file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Parser)]
pub struct AddArgs {
    /// Update URL of the subscription.
    #[arg(value_name = "URL")]
    pub url: String,
}

#[derive(Parser)]
pub struct RemoveArgs {
    /// Subscription id.
    #[arg(value_name = "ID", allow_negative_numbers = true)]
    pub id: i64,
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
