use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "docnav")]
#[command(about = "Build documentation navigation indexes and serve sidebar and search queries", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./docnav.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Analyzer record file; repeat to read several. Replaces `inputs` from the config.
    #[arg(short, long = "input", global = true)]
    pub inputs: Vec<PathBuf>,
    /// Snapshot cache location
    #[arg(long = "cache", global = true)]
    pub cache_path: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the index as MCP tools over stdio (default)
    Serve,
    /// Generate the index once and report the result
    Check,
    Search {
        query: String,
        #[arg(long, default_value = "0")]
        offset: i64,
        #[arg(short = 'n', long)]
        limit: Option<i64>,
        /// Match anywhere in the name instead of by prefix
        #[arg(short, long)]
        substring: bool,
    },
    Sidebar {
        /// Module path, e.g. `guild::automod`
        module: String,
        /// Print the `SIDEBAR_ITEMS` script instead of an outline
        #[arg(long)]
        js: bool,
    },
}
