// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dr pipeline` - Define and inspect pipelines

use anyhow::Result;
use clap::{Args, Subcommand};
use dr_core::Pipeline;
use serde::Serialize;
use std::fmt;

use crate::client::DaemonClient;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct PipelineArgs {
    #[command(subcommand)]
    pub command: PipelineCommand,
}

#[derive(Subcommand)]
pub enum PipelineCommand {
    /// Create a pipeline with an ordered list of steps
    Create {
        /// Data room the pipeline belongs to
        #[arg(long)]
        data_room: String,
        /// Pipeline name
        #[arg(long)]
        name: String,
        /// Step names, in execution order
        #[arg(required = true)]
        steps: Vec<String>,
    },
    /// Show details of a pipeline
    Show {
        /// Pipeline ID
        id: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Text/JSON view of a pipeline
#[derive(Serialize)]
#[serde(transparent)]
struct PipelineView(Pipeline);

impl fmt::Display for PipelineView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.0;
        writeln!(f, "Pipeline: {}", p.id)?;
        writeln!(f, "  Name: {}", p.name)?;
        writeln!(f, "  Data room: {}", p.data_room_id)?;
        writeln!(f, "  Created: {}", p.created_at)?;
        match p.step_names() {
            Ok(steps) => {
                writeln!(f, "  Steps:")?;
                for (i, step) in steps.iter().enumerate() {
                    writeln!(f, "    {}. {}", i + 1, step)?;
                }
            }
            Err(e) => writeln!(f, "  Steps: invalid ({})", e)?,
        }
        Ok(())
    }
}

pub async fn handle(client: &DaemonClient, command: PipelineCommand) -> Result<()> {
    match command {
        PipelineCommand::Create {
            data_room,
            name,
            steps,
        } => {
            let pipeline = client.create_pipeline(&data_room, &name, steps).await?;
            println!("Created pipeline {}", pipeline.id);
        }
        PipelineCommand::Show { id, json } => match client.get_pipeline(&id).await? {
            Some(pipeline) => {
                output::print(&PipelineView(pipeline), OutputFormat::from_json_flag(json))
            }
            None => anyhow::bail!("Pipeline not found: {}", id),
        },
    }
    Ok(())
}
