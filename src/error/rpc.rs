use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single remote procedure call.
///
/// `Transport` covers everything below the protocol (connection refused, TLS,
/// non-success HTTP status). `Fault` and `Malformed` are remote protocol
/// errors: the server answered, but with a fault or with something that is not
/// a valid response.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RpcError {
    #[error("transport failure talking to {endpoint}: {message}")]
    Transport { endpoint: String, message: String },
    #[error("remote fault {code}: {message}")]
    Fault { code: i64, message: String },
    #[error("malformed response: {message}")]
    Malformed { message: String },
}

impl RpcError {
    pub fn malformed<M>(message: M) -> Self
    where
        M: Into<String>,
    {
        RpcError::Malformed {
            message: message.into(),
        }
    }
}
