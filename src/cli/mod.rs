//! Command line interface of `batch-runner`

mod commands;
mod input;

pub use commands::execute;
pub use input::{load_items, parse_items};

use crate::core::batch::FeatureKind;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Run chunked ERP batch jobs
#[derive(Debug, Parser)]
#[command(name = "batch-runner", version, about)]
pub struct Cli {
    /// YAML configuration file; defaults plus environment when omitted
    #[arg(long, short, global = true, env = "BATCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Split an item list into chunks and apply them against the ERP
    Run(RunArgs),
    /// Show the stored status of a queued batch
    Status(BatchArgs),
    /// Ask the ERP to cancel a queued batch at its next chunk boundary
    Cancel(BatchArgs),
    /// List the feature profiles
    Features,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// top-abc-save, zero-min-max, queue-move-online or queue-stock-evidence
    #[arg(long)]
    pub feature: FeatureKind,

    /// JSON array of material codes or `{ "code": ..., "payload": ... }` objects
    #[arg(long)]
    pub items: PathBuf,

    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Branch / warehouse; required by the save features
    #[arg(long)]
    pub branch: Option<String>,

    #[arg(long, env = "BATCH_USER")]
    pub user: String,

    /// Reuse a batch id created by the ERP queue; a fresh one otherwise
    #[arg(long)]
    pub batch_id: Option<String>,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    #[arg(long)]
    pub batch_id: String,

    #[arg(long, env = "BATCH_USER")]
    pub user: String,
}
