//! Command-line parsing for the school-disruption dashboards.
//!
//! Argument parsing and command dispatch are kept separate from the loading
//! and analysis code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::analysis::Period;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "sdb",
    version,
    about = "Climate-disaster school disruption dashboards (public data / user-supplied data)"
)]
pub struct Cli {
    /// HTTP timeout per source, in seconds (overrides SDB_TIMEOUT_SECS).
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Skip the network entirely; every public source uses its fallback table.
    #[arg(long, global = true)]
    pub offline: bool,

    /// Debug-level logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Public-data view: fetch official sources, falling back to sample tables.
    Public(PublicArgs),
    /// User-data view: news-derived statistics only, no network access.
    User(UserArgs),
}

#[derive(Debug, Args, Clone)]
pub struct PublicArgs {
    /// Aggregation unit for school actions.
    #[arg(long, value_enum, default_value_t = Period::Month)]
    pub period: Period,

    /// Moving-average window for the precipitation series (1 = raw values).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=12))]
    pub window: u16,

    /// First day of the precipitation range (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day of the precipitation range (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Rows shown per table.
    #[arg(long, default_value_t = 10)]
    pub preview: usize,

    /// Write the aggregated school actions to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Write the damage sites to CSV.
    #[arg(long = "export-sites")]
    pub export_sites: Option<PathBuf>,

    /// Write CSV files without a UTF-8 byte-order mark.
    #[arg(long)]
    pub no_bom: bool,
}

#[derive(Debug, Args, Clone)]
pub struct UserArgs {
    /// Keep only these groups (repeatable; default: all).
    #[arg(long = "group", value_name = "GROUP")]
    pub groups: Vec<String>,

    /// First day to include (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Rows shown per table.
    #[arg(long, default_value_t = 20)]
    pub preview: usize,

    /// Write the filtered rows to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Write the region damage points to CSV.
    #[arg(long = "export-regions")]
    pub export_regions: Option<PathBuf>,

    /// Write CSV files without a UTF-8 byte-order mark.
    #[arg(long)]
    pub no_bom: bool,
}
