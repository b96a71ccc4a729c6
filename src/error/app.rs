use thiserror::Error;

use super::{ConfigError, PreconditionViolation, RpcError, WorkerError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("CLI error: {source}")]
    Clap {
        #[from]
        source: clap::Error,
    },
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Remote call failed: {0}")]
    Rpc(#[from] RpcError),
    #[error("{0}")]
    Precondition(#[from] PreconditionViolation),
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn config<E>(error: E) -> Self
    where
        E: Into<ConfigError>,
    {
        error.into().into()
    }

    pub fn worker<E>(error: E) -> Self
    where
        E: Into<WorkerError>,
    {
        error.into().into()
    }

    /// Short category name used in logs and worker fault reports.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            AppError::Io { .. } => "io",
            AppError::Clap { .. } => "cli",
            AppError::Config(_) => "configuration",
            AppError::Rpc(RpcError::Transport { .. }) => "transport",
            AppError::Rpc(RpcError::Fault { .. } | RpcError::Malformed { .. }) => {
                "remote_protocol"
            }
            AppError::Precondition(_) => "precondition",
            AppError::Worker(_) => "worker",
        }
    }
}
