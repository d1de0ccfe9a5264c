//! batch-runner - chunked ERP batch jobs from the command line

#![allow(missing_docs)]

use clap::Parser;
use replenish_batch::cli::{self, Cli};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    match cli::execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            // Alternate Display prints the whole context chain
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
