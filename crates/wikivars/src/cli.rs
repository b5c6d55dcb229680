//! CLI command structure using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wikivars")]
#[command(version, about = "Inspect and maintain stored wiki variable sets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Engine configuration (defaults to ./wikivars.toml when present)
    #[arg(long, global = true, env = "WIKIVARS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Store directory, overriding `store.path` from the configuration
    #[arg(long, global = true, env = "WIKIVARS_STORE")]
    pub store: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List pages with stored sets
    List {
        #[arg(long)]
        json: bool,
    },

    /// Show the stored sets of a page
    Show {
        page_id: u64,

        /// Only this set ("" is the default set)
        #[arg(long)]
        set: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Remove everything stored for a page
    Purge { page_id: u64 },

    /// Plan storing rendered sets from a JSON file against a page
    Diff {
        page_id: u64,

        /// JSON object: set name -> variable name -> { "value", "parse_on_load" }
        file: PathBuf,

        /// Revision of the render (defaults to one past the stored revision)
        #[arg(long)]
        rev: Option<u64>,

        /// Write the plan to the store
        #[arg(long)]
        apply: bool,

        #[arg(long)]
        json: bool,
    },
}
