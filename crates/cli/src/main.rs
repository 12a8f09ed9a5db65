// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! dr - Data room pipeline CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{daemon, pipeline, run};

use crate::client::DaemonClient;

#[derive(Parser)]
#[command(name = "dr", version, about = "Data room pipeline runs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pipeline management
    Pipeline(pipeline::PipelineArgs),
    /// Pipeline run management
    Run(run::RunArgs),
    /// Show daemon status
    Status,
    /// Stop the daemon
    Shutdown,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Every command talks to an already-running daemon
    let client = DaemonClient::connect()?;

    match cli.command {
        Commands::Pipeline(args) => pipeline::handle(&client, args.command).await?,
        Commands::Run(args) => run::handle(&client, args.command).await?,
        Commands::Status => daemon::status(&client).await?,
        Commands::Shutdown => daemon::shutdown(&client).await?,
    }

    Ok(())
}
