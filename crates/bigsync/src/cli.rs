//! Clap derive structures for the `bigsync` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// bigsync -- declarative desired-state configuration for BIG-IP
#[derive(Debug, Parser)]
#[command(
    name = "bigsync",
    version,
    about = "Reconcile declared configuration against BIG-IP appliances",
    long_about = "Declares appliance configuration in TOML and reconciles it against\n\
        the iControl REST API: reads current state, computes a field-by-field\n\
        difference, and issues only the create/update/delete calls needed.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Appliance profile to use
    #[arg(long, short = 'p', env = "BIGSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Appliance management URL (overrides profile)
    #[arg(long, short = 'a', env = "BIGSYNC_APPLIANCE", global = true)]
    pub appliance: Option<String>,

    /// Default partition for resources that don't name one
    #[arg(long, env = "BIGSYNC_PARTITION", global = true)]
    pub partition: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "BIGSYNC_OUTPUT",
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

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "BIGSYNC_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "BIGSYNC_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Resource kinds ───────────────────────────────────────────────────

/// The resource types bigsync can reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceKind {
    HttpProfile,
    TcpProfile,
    ServerSslProfile,
    Vlan,
    SysDb,
    GtmMonitor,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile a declaration file against the appliance
    #[command(alias = "a")]
    Apply(ApplyArgs),

    /// Show what apply would change, without writing (check mode)
    Plan(PlanArgs),

    /// Fetch and render one object's current state
    Show(ShowArgs),

    /// Remove one object from the appliance
    Rm(RmArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Per-command args ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Declaration file (TOML)
    #[arg(long, short = 'f', value_name = "FILE")]
    pub file: PathBuf,

    /// Compute and report changes without writing
    #[arg(long)]
    pub check: bool,
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Declaration file (TOML)
    #[arg(long, short = 'f', value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Resource kind
    pub kind: ResourceKind,

    /// Object name (or db variable key)
    pub name: String,
}

#[derive(Debug, Args)]
pub struct RmArgs {
    /// Resource kind
    pub kind: ResourceKind,

    /// Object name
    pub name: String,

    /// Report without deleting
    #[arg(long)]
    pub check: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Create a starter config file
    Init,
    /// List configured profiles
    List,
    /// Print the active configuration
    Show,
    /// Store a password in the system keyring
    SetPassword {
        /// Profile to store the password for
        #[arg(long, default_value = "default")]
        profile: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
