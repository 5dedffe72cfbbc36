// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Args, Parser, ValueEnum};

/// Command-line arguments for `taskchain`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskchain",
    version,
    about = "Run chains of automation tasks against a bound capture target.",
    long_about = None
)]
pub struct CliArgs {
    /// Directory holding `resource.toml` (options, targets, item names).
    #[arg(long, value_name = "DIR", default_value = "resource")]
    pub resource_dir: String,

    /// Playbook describing the task chains to run (TOML).
    #[arg(long, value_name = "PATH", default_value = "playbook.toml")]
    pub playbook: String,

    #[command(flatten)]
    pub binding: TargetBinding,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKCHAIN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the chains, but don't bind or run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Which capture target to bind before running.
///
/// With none of these flags the resource's `connect_type` decides.
#[derive(Debug, Clone, Default, Args)]
#[group(multiple = false)]
pub struct TargetBinding {
    /// Bind this named target from `[target.<name>]`.
    #[arg(long, value_name = "NAME")]
    pub target: Option<String>,

    /// Bind the `Custom` target in custom mode.
    #[arg(long)]
    pub custom: bool,

    /// Skip device binding entirely.
    #[arg(long)]
    pub fake: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
