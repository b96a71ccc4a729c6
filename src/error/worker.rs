use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{AppError, ConfigFault, PreconditionViolation, RpcError};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Failed to spawn worker {worker}: {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("Worker {worker} has no {pipe} pipe.")]
    MissingPipe { worker: usize, pipe: &'static str },
    #[error("I/O error during {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Worker {worker} exited ({status}) without reporting a result.")]
    Exited { worker: usize, status: String },
    #[error("Worker channel closed.")]
    ConnectionClosed,
    #[error("Wire message exceeded max size ({max_bytes} bytes).")]
    WireMessageTooLarge { max_bytes: usize },
    #[error("Wire message was not valid UTF-8: {source}")]
    WireMessageInvalidUtf8 {
        #[source]
        source: std::str::Utf8Error,
    },
    #[error("Failed to serialize {context}: {source}")]
    Serialize {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to deserialize {context}: {source}")]
    Deserialize {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unexpected wire message '{received}' (expected {expected}).")]
    UnexpectedMessage {
        expected: &'static str,
        received: &'static str,
    },
    #[error("Worker {worker} task failed: {source}")]
    Join {
        worker: usize,
        #[source]
        source: tokio::task::JoinError,
    },
    #[error("Worker {worker} was already joined.")]
    AlreadyJoined { worker: usize },
    #[error("Worker {worker} failed with {category} error: {message}")]
    Failed {
        worker: usize,
        category: String,
        message: String,
    },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}

/// Serializable form of a worker's failure, carried back to the parent.
///
/// RPC, precondition and run-time configuration failures survive the
/// process boundary intact so the parent re-raises the same error the worker
/// saw. Anything else keeps its category and rendered message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum WorkerFault {
    Rpc { error: RpcError },
    Precondition { violation: PreconditionViolation },
    Config { fault: ConfigFault },
    Other { kind: String, message: String },
}

impl From<&AppError> for WorkerFault {
    fn from(error: &AppError) -> Self {
        match error {
            AppError::Rpc(rpc) => WorkerFault::Rpc { error: rpc.clone() },
            AppError::Precondition(violation) => WorkerFault::Precondition {
                violation: violation.clone(),
            },
            AppError::Config(config) => ConfigFault::from_error(config).map_or_else(
                || WorkerFault::other(error),
                |fault| WorkerFault::Config { fault },
            ),
            AppError::Io { .. } | AppError::Clap { .. } | AppError::Worker(_) => {
                WorkerFault::other(error)
            }
        }
    }
}

impl WorkerFault {
    fn other(error: &AppError) -> Self {
        WorkerFault::Other {
            kind: error.category().to_owned(),
            message: error.to_string(),
        }
    }

    /// Rebuilds the error on the parent side of the worker boundary.
    #[must_use]
    pub fn into_app_error(self, worker: usize) -> AppError {
        match self {
            WorkerFault::Rpc { error } => AppError::Rpc(error),
            WorkerFault::Precondition { violation } => AppError::Precondition(violation),
            WorkerFault::Config { fault } => match fault.into_config_error() {
                Ok(config) => AppError::Config(config),
                Err(fault) => AppError::Worker(WorkerError::Failed {
                    worker,
                    category: "configuration".to_owned(),
                    message: format!("{:?}", fault),
                }),
            },
            WorkerFault::Other { kind, message } => AppError::Worker(WorkerError::Failed {
                worker,
                category: kind,
                message,
            }),
        }
    }
}
