//! Clap derive structures for the `dlpsync` CLI.
//!
//! Running without a subcommand performs a sync; `tenants` and
//! `completions` never touch the network.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// dlpsync -- push DLP data patterns and data profiles from a source
/// tenant to destination tenants
#[derive(Debug, Parser)]
#[command(
    name = "dlpsync",
    version,
    about = "Sync DLP data patterns and data profiles across tenants",
    long_about = "Replicates custom DLP data patterns and data profiles from one source\n\
        tenant to any number of destination tenants. Entities are matched by name\n\
        and every pattern or profile reference is translated to destination IDs.\n\n\
        Runs are analysis-only unless --execute is given.",
    propagate_version = true,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(flatten)]
    pub sync: SyncArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration file (YAML or TOML)
    #[arg(long, short = 'c', env = "DLPSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DLPSYNC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Sync Options ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Apply changes (default is analysis only)
    #[arg(long, short = 'x', alias = "no-dry-run")]
    pub execute: bool,

    /// With --execute: apply to every destination without prompting
    #[arg(long, short = 'a', conflicts_with = "tenant")]
    pub all: bool,

    /// Only process this destination (repeatable)
    #[arg(long, short = 't', value_name = "NAME")]
    pub tenant: Vec<String>,

    /// Confirm every destination without prompting
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// How a sync invocation behaves, derived from [`SyncArgs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncMode {
    /// Analysis of every destination.
    DryRun,
    /// Analysis or execution (per `execute`) on named destinations.
    Targeted { names: Vec<String>, execute: bool },
    /// Execute on every destination without prompting.
    ExecuteAll,
    /// Analyse everything, then execute per confirmed destination.
    Interactive,
}

impl SyncArgs {
    pub fn mode(&self) -> SyncMode {
        if !self.tenant.is_empty() {
            return SyncMode::Targeted {
                names: self.tenant.clone(),
                execute: self.execute,
            };
        }
        match (self.execute, self.all) {
            (true, true) => SyncMode::ExecuteAll,
            (true, false) => SyncMode::Interactive,
            (false, _) => SyncMode::DryRun,
        }
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Summary tables (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Subcommands ──────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List configured tenants (no network access)
    Tenants,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
