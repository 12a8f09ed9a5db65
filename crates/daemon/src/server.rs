// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and connection handling.

use dr_core::StepList;
use dr_engine::EngineError;
use dr_storage::RunStore;
use tokio::net::UnixStream;
use tracing::{debug, error};

use crate::lifecycle::DaemonState;
use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// Handle a single client connection
pub async fn handle_connection(
    daemon: &mut DaemonState,
    stream: UnixStream,
) -> Result<(), ServerError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
        Ok(req) => req,
        Err(protocol::ProtocolError::Timeout) => {
            error!("Request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected before sending request");
            return Ok(());
        }
        Err(e) => {
            error!("Failed to read request: {}", e);
            return Err(ServerError::Protocol(e));
        }
    };

    debug!("Received request: {:?}", request);

    let response = handle_request(daemon, request);

    debug!("Sending response: {:?}", response);

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT)
        .await
        .map_err(ServerError::Protocol)?;

    Ok(())
}

/// Handle a single request and return a response
pub fn handle_request(daemon: &mut DaemonState, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },

        Request::Shutdown => {
            daemon.shutdown_requested = true;
            Response::ShuttingDown
        }

        Request::Status => {
            let runs_active = match daemon.engine.store().list_runs() {
                Ok(runs) => runs
                    .iter()
                    .filter(|r| !r.status.is_terminal())
                    .count(),
                Err(e) => return error_response(e.into()),
            };
            Response::Status {
                uptime_secs: daemon.start_time.elapsed().as_secs(),
                runs_active,
                queue_pending: daemon.engine.queue().pending(),
                queue_size: daemon.engine.queue().size(),
            }
        }

        Request::CreatePipeline {
            data_room_id,
            name,
            steps,
        } => match daemon
            .engine
            .create_pipeline(data_room_id, name, StepList::from(steps))
        {
            Ok(pipeline) => Response::Pipeline { pipeline },
            Err(e) => error_response(e),
        },

        Request::GetPipeline { id } => match daemon.engine.get_pipeline(&id) {
            Ok(Some(pipeline)) => Response::Pipeline { pipeline },
            Ok(None) => error_response(EngineError::PipelineNotFound(id)),
            Err(e) => error_response(e),
        },

        Request::StartRun {
            pipeline_id,
            file_version_id,
        } => match daemon
            .engine
            .start_pipeline_run(&pipeline_id, &file_version_id)
        {
            Ok(run_id) => Response::RunStarted { run_id },
            Err(e) => error_response(e),
        },

        Request::RetryRun { run_id } => match daemon.engine.retry_pipeline_run(&run_id) {
            Ok(()) => Response::Ok,
            Err(e) => error_response(e),
        },

        Request::GetRun { run_id } => match daemon.engine.get_pipeline_run(&run_id) {
            Ok(Some(detail)) => Response::Run {
                run: Box::new(detail),
            },
            Ok(None) => error_response(EngineError::RunNotFound(run_id)),
            Err(e) => error_response(e),
        },
    }
}

/// Map an engine error onto the wire: missing rows are `NotFound`
fn error_response(e: EngineError) -> Response {
    if e.is_not_found() {
        Response::NotFound {
            message: e.to_string(),
        }
    } else {
        error!(error = %e, "request failed");
        Response::Error {
            message: e.to_string(),
        }
    }
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Request timeout")]
    Timeout,
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
