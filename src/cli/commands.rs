//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Read paginated REST tables by following continuation links
#[derive(Parser, Debug)]
#[command(name = "table-pager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Service root URL (overrides the config file)
    #[arg(short = 'u', long, global = true)]
    pub service_url: Option<String>,

    /// Application key (overrides the config file)
    #[arg(short = 'k', long, global = true)]
    pub app_key: Option<String>,

    /// Table name (overrides the config file)
    #[arg(short, long, global = true)]
    pub table: Option<String>,

    /// Page-size hint (overrides the config file)
    #[arg(short = 'n', long, global = true)]
    pub page_size: Option<u32>,

    /// Where responses carry the continuation (overrides the config file)
    #[arg(short, long, global = true)]
    pub shape: Option<ShapeArg>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every item of the table, following continuations
    Read {
        /// Stop after this many items
        #[arg(long)]
        max_items: Option<usize>,
    },

    /// Print one line per page with its size and continuation
    Pages,

    /// Fetch a single item by id
    Lookup {
        /// Item id
        id: String,
    },

    /// Count, sum and average a numeric field over the whole table
    Summary {
        /// Numeric field to aggregate
        #[arg(long, default_value = "age")]
        field: String,
    },

    /// Delete every item of the table
    Clear,
}

/// Continuation shape selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ShapeArg {
    /// `Link` response header
    Link,
    /// `nextLink` field in a wrapped body
    Body,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one value per line)
    Json,
    /// Human-readable output
    Pretty,
}
