// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::path::PathBuf;
use std::time::Duration;

use dr_core::{DataRoomId, FileVersionId, Pipeline, PipelineId, RunDetail, RunId};
use dr_daemon::protocol::{self, ProtocolError};
use dr_daemon::{Config, ConfigError, Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for IPC requests
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("DR_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{0}")]
    NotFound(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Daemon status summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonStatus {
    pub uptime_secs: u64,
    pub runs_active: usize,
    pub queue_pending: usize,
    pub queue_size: usize,
}

/// Daemon client
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connect to the daemon configured by the environment (no auto-start)
    pub fn connect() -> Result<Self, ClientError> {
        let config = Config::from_env()?;
        Self::connect_at(config.socket_path)
    }

    /// Connect to a daemon listening on `socket_path`
    pub fn connect_at(socket_path: PathBuf) -> Result<Self, ClientError> {
        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }

        Ok(Self { socket_path })
    }

    /// Send a request and receive a response with specific timeouts
    async fn send_with_timeout(
        &self,
        request: Request,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = match UnixStream::connect(&self.socket_path).await {
            Ok(stream) => stream,
            // Socket file left behind by a daemon that is gone
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::NotFound
                ) =>
            {
                return Err(ClientError::DaemonNotRunning)
            }
            Err(e) => return Err(e.into()),
        };
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(&request)?;
        tokio::time::timeout(write_timeout, protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let response_bytes =
            tokio::time::timeout(read_timeout, protocol::read_message(&mut reader))
                .await
                .map_err(|_| ProtocolError::Timeout)??;

        let response: Response = protocol::decode(&response_bytes)?;
        Ok(response)
    }

    /// Send a request and receive a response
    pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
        self.send_with_timeout(request, timeout_ipc(), timeout_ipc())
            .await
    }

    /// Get daemon version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        match self
            .send(Request::Hello {
                version: env!("CARGO_PKG_VERSION").to_string(),
            })
            .await?
        {
            Response::Hello { version } => Ok(version),
            other => Err(unexpected(other)),
        }
    }

    pub async fn status(&self) -> Result<DaemonStatus, ClientError> {
        match self.send(Request::Status).await? {
            Response::Status {
                uptime_secs,
                runs_active,
                queue_pending,
                queue_size,
            } => Ok(DaemonStatus {
                uptime_secs,
                runs_active,
                queue_pending,
                queue_size,
            }),
            other => Err(unexpected(other)),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(Request::Shutdown).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn create_pipeline(
        &self,
        data_room_id: &str,
        name: &str,
        steps: Vec<String>,
    ) -> Result<Pipeline, ClientError> {
        match self
            .send(Request::CreatePipeline {
                data_room_id: DataRoomId::new(data_room_id),
                name: name.to_string(),
                steps,
            })
            .await?
        {
            Response::Pipeline { pipeline } => Ok(pipeline),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get_pipeline(&self, id: &str) -> Result<Option<Pipeline>, ClientError> {
        match self
            .send(Request::GetPipeline {
                id: PipelineId::new(id),
            })
            .await?
        {
            Response::Pipeline { pipeline } => Ok(Some(pipeline)),
            Response::NotFound { .. } => Ok(None),
            other => Err(unexpected(other)),
        }
    }

    /// Start a run; returns as soon as the run is queued
    pub async fn start_run(
        &self,
        pipeline_id: &str,
        file_version_id: &str,
    ) -> Result<RunId, ClientError> {
        match self
            .send(Request::StartRun {
                pipeline_id: PipelineId::new(pipeline_id),
                file_version_id: FileVersionId::new(file_version_id),
            })
            .await?
        {
            Response::RunStarted { run_id } => Ok(run_id),
            other => Err(unexpected(other)),
        }
    }

    pub async fn retry_run(&self, run_id: &str) -> Result<(), ClientError> {
        match self
            .send(Request::RetryRun {
                run_id: RunId::new(run_id),
            })
            .await?
        {
            Response::Ok => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get_run(&self, run_id: &str) -> Result<Option<RunDetail>, ClientError> {
        match self
            .send(Request::GetRun {
                run_id: RunId::new(run_id),
            })
            .await?
        {
            Response::Run { run } => Ok(Some(*run)),
            Response::NotFound { .. } => Ok(None),
            other => Err(unexpected(other)),
        }
    }
}

/// Turn an unexpected or error response into a client error
fn unexpected(response: Response) -> ClientError {
    match response {
        Response::NotFound { message } => ClientError::NotFound(message),
        Response::Error { message } => ClientError::Rejected(message),
        _ => ClientError::UnexpectedResponse,
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
