//! # Orrery CLI Module
//!
//! This module implements the CLI interface for Orrery.
//!
//! ## Available Commands
//!
//! - `stats` - Show graph counters and options
//! - `neighbors` - List the neighbours of a node
//! - `edges` - List edges of the graph, a node or a node pair
//! - `check` - Verify degree counters against the adjacency index
//! - `convert` - Re-encode a graph file as JSON or binary
//! - `merge` - Merge several graph files into one

mod commands;
pub mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;
pub use config::{OrreryConfig, OutputFormat};

use crate::error::CliError;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Orrery - attributed graph documents from the command line
///
/// Reads graphs exported as JSON documents or in the Orrery binary format.
#[derive(Parser, Debug)]
#[command(name = "orrery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// TOML configuration file (defaults to ./orrery.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show graph counters and options
    Stats {
        /// Graph file (JSON or binary)
        file: PathBuf,
    },

    /// List the neighbours of a node
    Neighbors {
        /// Graph file (JSON or binary)
        file: PathBuf,

        /// Node key
        node: String,

        /// Relation (all, in, out, inbound, outbound, directed, undirected)
        #[arg(short, long, default_value = "all")]
        relation: String,
    },

    /// List edges
    Edges {
        /// Graph file (JSON or binary)
        file: PathBuf,

        /// Only edges attached to this node
        #[arg(short, long)]
        node: Option<String>,

        /// Only edges between --node and this node
        #[arg(short, long, requires = "node")]
        target: Option<String>,

        /// Relation (all, in, out, inbound, outbound, directed, undirected)
        #[arg(short, long, default_value = "all")]
        relation: String,
    },

    /// Verify degree counters against a full adjacency traversal
    Check {
        /// Graph file (JSON or binary)
        file: PathBuf,
    },

    /// Re-encode a graph file
    Convert {
        /// Input graph file
        input: PathBuf,

        /// Output graph file
        output: PathBuf,

        /// Output format (defaults to the configured one)
        #[arg(short = 'f', long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Merge graph files into one, in order
    Merge {
        /// Input graph files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output graph file
        #[arg(short, long)]
        output: PathBuf,

        /// Output format (defaults to the configured one)
        #[arg(short = 'f', long, value_enum)]
        format: Option<OutputFormat>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), CliError> {
    let config = OrreryConfig::load(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Stats { file } => cmd_stats(&file, json_mode),
        Commands::Neighbors {
            file,
            node,
            relation,
        } => cmd_neighbors(&file, &node, &relation, json_mode),
        Commands::Edges {
            file,
            node,
            target,
            relation,
        } => cmd_edges(
            &file,
            node.as_deref(),
            target.as_deref(),
            &relation,
            json_mode,
        ),
        Commands::Check { file } => cmd_check(&file, json_mode),
        Commands::Convert {
            input,
            output,
            format,
        } => cmd_convert(
            &input,
            &output,
            format.unwrap_or(config.output.format),
            config.output.pretty,
        ),
        Commands::Merge {
            inputs,
            output,
            format,
        } => cmd_merge(
            &inputs,
            &output,
            &config,
            format.unwrap_or(config.output.format),
            json_mode,
        ),
    }
}
