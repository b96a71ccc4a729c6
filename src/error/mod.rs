mod app;
mod config;
mod precondition;
mod rpc;
mod worker;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::{ConfigError, ConfigFault};
pub use precondition::{Expectation, Observed, PreconditionViolation};
pub use rpc::RpcError;
pub use worker::{WorkerError, WorkerFault};
