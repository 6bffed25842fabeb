//! CLI parse: clap types for pushwise. No behavior; definitions only.

use crate::types::ActionId;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Pushwise CLI - server-push decisions from repeated page loads
#[derive(Parser)]
#[command(name = "pushwise")]
#[command(about = "Extract stable push groups and assemble server-push policies")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract the stable resource set from capture files and print its push groups
    StableSet {
        /// Capture documents, replayed in the given order
        #[arg(required = true)]
        captures: Vec<PathBuf>,
        /// Capture attempts (default: one per capture file)
        #[arg(long)]
        runs: Option<usize>,
        /// Hosts whose resources may be pushed (default: all)
        #[arg(long = "trainable-host")]
        trainable_hosts: Vec<String>,
        /// Write the groups to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List every action of a group list
    Actions {
        /// Push group document
        #[arg(long)]
        groups: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Decode one action id against a group list
    Decode {
        /// Push group document
        #[arg(long)]
        groups: PathBuf,
        /// Action id to decode
        id: ActionId,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Run one episode and print the resulting push policy
    Policy {
        /// Push group document
        #[arg(long)]
        groups: PathBuf,
        /// Agent driving the episode
        #[arg(long, value_enum, default_value_t = AgentKind::Sample)]
        agent: AgentKind,
        /// Sampling seed (overrides configuration)
        #[arg(long)]
        seed: Option<u64>,
        /// Page url the policy is served for (default: first anchor)
        #[arg(long)]
        url: Option<String>,
        /// Pretty-print the policy document
        #[arg(long)]
        pretty: bool,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },
    /// Validate the effective configuration
    Validate,
}

/// Agent used by `policy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AgentKind {
    /// Order-decaying random sampler
    Sample,
    /// Lowest-order available push first
    Greedy,
}
