//! CLI definitions for ocitools
//!
//! This module contains the clap CLI structure definitions, separated from
//! main.rs so tests can inspect the command tree.

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;
use std::path::PathBuf;

use crate::extract::StreamerPreset;

/// Build clap styles.
pub fn build_cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::White.on_default())
        .valid(AnsiColor::White.on_default())
        .invalid(AnsiColor::Red.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}

#[derive(Parser)]
#[command(name = "ocitools")]
#[command(about = "OCI audit event extraction and compartment tooling")]
#[command(long_about = "ocitools - Pull audit events and walk compartments in an OCI tenancy.

Audit events are fetched in windows no longer than the service allows, every
page of every window is drained, and matching records are streamed into one
JSON array. A tally of all event names is written next to it.

QUICK START:
    ocitools audit --start-date 01.12.25 --end-date 31.12.25 -o dec.json
    ocitools compartments                  Show the compartment tree
    ocitools to-csv dec.json dec.csv       Flatten extracted events to CSV
    ocitools config path                   Show which config file is used

Configuration lives in ~/.config/ocitools/config.toml unless --config-file
or OCITOOLS_CONFIG points elsewhere.")]
#[command(version)]
#[command(styles = build_cli_styles())]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Alternate configuration file
    #[arg(long, env = "OCITOOLS_CONFIG", global = true, aliases = ["configfile", "ociconfig"])]
    pub config_file: Option<PathBuf>,

    /// Profile section to use from the configuration file
    #[arg(long, default_value = "DEFAULT", global = true, alias = "profilename")]
    pub profile: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract audit events for a date range into a JSON file
    #[command(long_about = "Extract audit events for a date range into a JSON file.

The range covers both dates completely (start at 00:00:00, end at 23:59:59
UTC) and is split into windows no longer than the preset allows. Windows that
fail are skipped and reported; the run still writes a valid JSON array.

Every record fetched is counted by event name into the tally file, whether or
not it passed the filter.

PRESETS:
    weekly        7-day windows, dates as DD.MM.YY, filter optional
    fortnightly   14-day windows, dates as YYYY-MM-DD, filter required

EXAMPLES:
    ocitools audit --start-date 01.12.25 --end-date 07.12.25 -o week.json
    ocitools audit --start-date 01.12.25 --end-date 31.12.25 -o out.json \\
        --event-filter 'com.oraclecloud.identity.*;.*Delete.*'
    ocitools audit --preset fortnightly --start-date 2025-01-01 \\
        --end-date 2025-03-31 -o q1.json --event-filter '.*Instance.*'")]
    Audit(AuditArgs),

    /// Show the compartment tree under a root
    #[command(long_about = "Walk the compartment tree depth-first and print each ACTIVE compartment.

The walk starts at the tenancy of the selected profile unless --root names
another compartment. It stops at --max-depth levels below the root and after
--max-nodes compartments; 0 means unlimited for either.

EXAMPLES:
    ocitools compartments
    ocitools compartments --max-nodes 0 --json
    ocitools compartments --root ocid1.compartment.oc1..xxx --max-depth 2")]
    Compartments(CompartmentsArgs),

    /// Flatten an extracted JSON file into CSV
    #[command(
        name = "to-csv",
        long_about = "Flatten an extracted JSON array into a CSV file.

Nested fields become dotted columns such as data.eventName. Arrays are kept as
JSON text. Columns are the union of all records in first-seen order.

EXAMPLE:
    ocitools to-csv events.json events.csv"
    )]
    ToCsv {
        /// Input JSON file (an array, or an object with a \"data\" array)
        input: PathBuf,
        /// Output CSV file
        output: PathBuf,
    },

    /// Configuration management
    #[command(
        subcommand,
        long_about = "View the ocitools configuration.

Configuration is stored in ~/.config/ocitools/config.toml and holds account
profiles, audit extraction defaults and compartment walk limits."
    )]
    Config(ConfigCommands),

    /// Generate shell completions
    #[command(long_about = "Generate shell completion scripts.

EXAMPLES:
    ocitools completions --shell bash > ~/.local/share/bash-completion/completions/ocitools
    ocitools completions --shell zsh > ~/.zfunc/_ocitools")]
    Completions {
        /// Shell to generate completions for
        #[arg(long, value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct AuditArgs {
    /// First day of the range, in the preset's date format
    #[arg(long, alias = "startdate")]
    pub start_date: String,

    /// Last day of the range, inclusive
    #[arg(long, alias = "enddate")]
    pub end_date: String,

    /// JSON file to write matching events to
    #[arg(short, long, alias = "outputfile")]
    pub output_file: PathBuf,

    /// Regex patterns for the event type, separated by ';'
    #[arg(long, alias = "eventfilter")]
    pub event_filter: Option<String>,

    /// Compartment to list (defaults to the profile's tenancy)
    #[arg(long)]
    pub compartment_id: Option<String>,

    /// Window size, date format and filter requirement
    #[arg(long, value_enum)]
    pub preset: Option<StreamerPreset>,

    /// Override the preset's maximum window length in days
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub window_days: Option<u32>,

    /// Where to write the event-name tally
    #[arg(long)]
    pub tally_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CompartmentsArgs {
    /// Compartment to start from (defaults to the profile's tenancy)
    #[arg(long)]
    pub root: Option<String>,

    /// Levels below the root to descend, 0 for unlimited
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Compartments to visit in total, 0 for unlimited
    #[arg(long)]
    pub max_nodes: Option<usize>,

    /// Print the result as a JSON array
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration as TOML
    Show,
    /// Print the configuration file path in use
    Path,
    /// Write a starter configuration file
    #[command(long_about = "Write a starter configuration file with one profile.

Refuses to overwrite an existing file unless --force is given.

EXAMPLE:
    ocitools config init --tenancy ocid1.tenancy.oc1..xxx --region eu-frankfurt-1")]
    Init {
        /// Tenancy OCID for the profile
        #[arg(long)]
        tenancy: String,
        /// Region identifier, e.g. eu-frankfurt-1
        #[arg(long)]
        region: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
