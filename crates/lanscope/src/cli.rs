//! Clap derive structures for the `lanscope` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lanscope -- inspect and tag devices found by a network scan backend
#[derive(Debug, Parser)]
#[command(
    name = "lanscope",
    version,
    about = "Browse, tag and scan devices on your network",
    long_about = "A command-line front end for a network scan backend.\n\n\
        Lists discovered devices (optionally scoped to an address range),\n\
        follows them live, tags them, and manages saved ranges and scan history.",
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
    /// Scan backend URL (overrides config file)
    #[arg(long, short = 'e', env = "LANSCOPE_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "LANSCOPE_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

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
    #[arg(long, short = 'k', env = "LANSCOPE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "LANSCOPE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    pub fn format(&self) -> OutputFormat {
        self.output.unwrap_or_default()
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color.unwrap_or_default()
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    #[default]
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

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    #[default]
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse, search and tag discovered devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Start or repeat network scans
    Scan(ScanArgs),

    /// Manage saved address ranges
    #[command(alias = "r")]
    Ranges(RangesArgs),

    /// Inspect and prune scan history
    #[command(alias = "h")]
    History(HistoryArgs),

    /// Delete every discovered device on the backend
    Clear,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices, optionally limited to an address range
    #[command(alias = "ls")]
    List(DeviceFilterArgs),

    /// Follow the device list as the backend reports changes
    Watch {
        #[command(flatten)]
        filter: DeviceFilterArgs,

        /// Poll interval in milliseconds (overrides config)
        #[arg(long, short = 'i')]
        interval: Option<u64>,
    },

    /// Search devices by free text (address, hostname, tags)
    Search {
        /// Search text
        query: String,
    },

    /// Attach a tag to a device
    Tag {
        /// Device ID, MAC or address
        device: String,

        /// Tag to add
        tag: String,
    },

    /// Remove a tag from a device
    Untag {
        /// Device ID, MAC or address
        device: String,

        /// Tag to remove
        tag: String,
    },
}

#[derive(Debug, Args)]
pub struct DeviceFilterArgs {
    /// Only devices inside this CIDR range, e.g. 192.168.1.0/24
    #[arg(long, short = 'r')]
    pub range: Option<String>,

    /// Only devices currently online
    #[arg(long)]
    pub online: bool,

    /// Only devices carrying this tag
    #[arg(long, short = 't')]
    pub tag: Option<String>,
}

// ── Scan ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ScanArgs {
    #[command(subcommand)]
    pub command: ScanCommand,
}

#[derive(Debug, Subcommand)]
pub enum ScanCommand {
    /// Scan an address range
    Start {
        /// Range to scan, e.g. 192.168.1.0/24
        range: String,
    },

    /// Re-run a scan from history
    Repeat {
        /// Scan history ID
        id: u64,
    },
}

// ── Ranges ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RangesArgs {
    #[command(subcommand)]
    pub command: RangesCommand,
}

#[derive(Debug, Subcommand)]
pub enum RangesCommand {
    /// List saved ranges
    #[command(alias = "ls")]
    List,

    /// Save a new range
    Add {
        /// Human-readable label
        name: String,

        /// CIDR expression, e.g. 10.0.0.0/24
        range: String,
    },

    /// Delete a saved range
    #[command(alias = "rm")]
    Delete {
        /// Range ID
        id: String,
    },

    /// Scan a saved range
    Scan {
        /// Range ID
        id: String,
    },
}

// ── History ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: HistoryCommand,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List past scans
    #[command(alias = "ls")]
    List,

    /// Delete one scan record
    #[command(alias = "rm")]
    Delete {
        /// Scan history ID
        id: u64,
    },

    /// Delete every scan record
    Clear,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the config file with guided setup
    Init,

    /// Display the resolved configuration
    Show,

    /// Print the config file location
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
