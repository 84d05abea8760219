//! CLI argument definitions for signalfeed.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `signals` | Fetch calls matching a filter |
//! | `watch` | Stream recomputed results as NDJSON |
//! | `register` | Register a student |
//! | `traders` | Print the trader roster |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--store-file` | unset | Seed an in-memory store from a JSON file |
//!
//! Store, roster and logging settings come from `SIGNALFEED_*` environment
//! variables.
//!
//! # Examples
//!
//! ```bash
//! signalfeed --store-file calls.json signals --active-only
//! signalfeed signals --network solana --strategy flip --pretty
//! signalfeed watch --trader trader-1 --updates 3
//! signalfeed register --login ada --email ada@example.com
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Signal feed query engine CLI
#[derive(Debug, Parser)]
#[command(
    name = "signalfeed",
    author,
    version,
    about = "Query and watch trading calls from a document store"
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Seed an in-memory store from a JSON file of the form
    /// `{"calls": [...], "students": [...]}` instead of a remote store.
    #[arg(long, global = true)]
    pub store_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch calls matching a filter, newest first.
    ///
    /// # Examples
    ///
    ///   signalfeed signals
    ///   signalfeed signals --active-only
    ///   signalfeed signals --network solana --strategy flip
    Signals(FilterArgs),

    /// Subscribe to calls and print every recomputed result as one line.
    ///
    /// # Examples
    ///
    ///   signalfeed watch --active-only
    ///   signalfeed watch --network ton --updates 1
    Watch(WatchArgs),

    /// Register a student account.
    Register(RegisterArgs),

    /// Print the trader roster.
    Traders,
}

/// Filter options shared by `signals` and `watch`.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Only calls published by this trader id.
    #[arg(long)]
    pub trader: Option<String>,

    /// Network (solana, bsc, ethereum, base, ton, tron, sui, cex).
    #[arg(long)]
    pub network: Option<String>,

    /// Strategy (flip, medium, long).
    #[arg(long)]
    pub strategy: Option<String>,

    /// Status (active, completed, cancelled, reviewed).
    #[arg(long)]
    pub status: Option<String>,

    /// Only active calls created within the last 24 hours.
    #[arg(long, default_value_t = false)]
    pub active_only: bool,
}

/// Arguments for the `watch` command.
#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Stop after this many snapshots; runs until interrupted when unset.
    #[arg(long)]
    pub updates: Option<usize>,
}

/// Arguments for the `register` command.
#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Login name.
    #[arg(long)]
    pub login: String,

    /// Email address.
    #[arg(long)]
    pub email: String,

    /// Display name; defaults to the login.
    #[arg(long)]
    pub name: Option<String>,
}
