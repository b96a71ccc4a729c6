use std::sync::Arc;

use crate::bench::{Credentials, RpcProvisioner, RunResult, Session, WorkloadOrchestrator};
use crate::config::types::BenchConfig;
use crate::error::AppResult;
use crate::rpc::{RpcTransport, XmlRpcClient};

/// Everything needed to open an independent workload against one server.
///
/// Each call builds its own transport and session, so targets can be cloned
/// into workers without sharing connection state.
#[derive(Debug, Clone)]
pub struct BenchTarget {
    pub credentials: Credentials,
    pub hostname: String,
    pub config: BenchConfig,
}

impl BenchTarget {
    #[must_use]
    pub const fn new(credentials: Credentials, hostname: String, config: BenchConfig) -> Self {
        Self {
            credentials,
            hostname,
            config,
        }
    }

    /// # Errors
    ///
    /// Returns a configuration error for an unusable endpoint URL, or a
    /// transport error when the HTTP client cannot be built.
    pub fn transport(&self) -> AppResult<Arc<dyn RpcTransport>> {
        let endpoint = self.config.endpoint_url(&self.hostname)?;
        Ok(Arc::new(XmlRpcClient::new(endpoint, self.config.insecure)?))
    }

    fn session(&self) -> Session {
        Session::new(self.credentials.clone(), self.hostname.clone())
    }

    fn provisioner(&self) -> Arc<RpcProvisioner> {
        Arc::new(RpcProvisioner::new(self.config.fixtures.clone()))
    }

    /// Logs in and returns a fresh, unchecked workload.
    ///
    /// # Errors
    ///
    /// Returns the transport construction or login error.
    pub async fn start(&self) -> AppResult<WorkloadOrchestrator> {
        WorkloadOrchestrator::new(
            self.session(),
            self.transport()?,
            self.provisioner(),
            self.config.clone(),
        )
        .await
    }

    /// Logs in to a server whose fixtures already exist.
    ///
    /// # Errors
    ///
    /// Returns the transport construction or login error.
    pub async fn resume(&self) -> AppResult<WorkloadOrchestrator> {
        WorkloadOrchestrator::resume(
            self.session(),
            self.transport()?,
            self.provisioner(),
            self.config.clone(),
        )
        .await
    }

    /// One complete measured run: login, run, logout.
    ///
    /// # Errors
    ///
    /// Returns the first error of the login or the run.
    pub async fn run_once(&self) -> AppResult<RunResult> {
        let mut orchestrator = self.resume().await?;
        let result = orchestrator.run().await;
        orchestrator.close().await;
        result
    }
}
