// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dr run` - Start, retry, and inspect pipeline runs

use anyhow::Result;
use clap::{Args, Subcommand};
use dr_core::RunDetail;
use serde::Serialize;
use std::fmt;

use crate::client::DaemonClient;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct RunArgs {
    #[command(subcommand)]
    pub command: RunCommand,
}

#[derive(Subcommand)]
pub enum RunCommand {
    /// Run a pipeline against a file version
    Start {
        /// Pipeline ID
        pipeline: String,
        /// File version ID
        file_version: String,
    },
    /// Re-run every step of an existing run
    Retry {
        /// Run ID
        run: String,
    },
    /// Show a run and its steps
    Show {
        /// Run ID
        run: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
#[serde(transparent)]
struct RunView(RunDetail);

impl fmt::Display for RunView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let run = &self.0.run;
        writeln!(f, "Run: {}", run.id)?;
        writeln!(f, "  Pipeline: {}", run.pipeline_id)?;
        writeln!(f, "  File version: {}", run.file_version_id)?;
        writeln!(f, "  Status: {}", run.status)?;
        writeln!(f, "  Updated: {}", run.updated_at)?;
        writeln!(f)?;
        writeln!(f, "{:<20} {:<12} MESSAGE", "STEP", "STATUS")?;
        for step in &self.0.steps {
            writeln!(
                f,
                "{:<20} {:<12} {}",
                step.step,
                step.status.as_str(),
                step.error_message.as_deref().unwrap_or("-")
            )?;
        }
        Ok(())
    }
}

pub async fn handle(client: &DaemonClient, command: RunCommand) -> Result<()> {
    match command {
        RunCommand::Start {
            pipeline,
            file_version,
        } => {
            let run_id = client.start_run(&pipeline, &file_version).await?;
            println!("Started run {}", run_id);
        }
        RunCommand::Retry { run } => {
            client.retry_run(&run).await?;
            println!("Retrying run {}", run);
        }
        RunCommand::Show { run, json } => match client.get_run(&run).await? {
            Some(detail) => output::print(&RunView(detail), OutputFormat::from_json_flag(json)),
            None => anyhow::bail!("Run not found: {}", run),
        },
    }
    Ok(())
}
