use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::config::types::BenchConfig;
use crate::error::{AppResult, ConfigError};
use crate::rpc::{RpcTransport, Value, into_list, member, member_i64};

use super::cleanup::remove_artifacts;
use super::invoker::TimedInvoker;
use super::precheck::PreconditionChecker;
use super::provision::Provisioner;
use super::record::{ActionRecord, OrgId, Repeats, RunResult};
use super::session::Session;

const LIST_ORGS: &str = "org.listOrgs";
const LIST_USERS: &str = "user.listUsers";
const LIST_CHANNELS: &str = "channel.listSoftwareChannels";
const LIST_PACKAGES: &str = "channel.software.listAllPackages";
const LIST_ERRATA: &str = "channel.software.listErrata";
const LIST_SYSTEMS: &str = "system.listSystems";

/// Distinct items are not interchangeable, so detail calls run once each.
const DETAIL_REPEATS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Uninitialized,
    Checked,
    SetUp,
    Running,
    CleanedUp,
}

impl LifecycleState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Checked => "checked",
            LifecycleState::SetUp => "set up",
            LifecycleState::Running => "running",
            LifecycleState::CleanedUp => "cleaned up",
        }
    }
}

/// Drives one server through check, setup, run and cleanup.
///
/// Owns the session and the measurement log for its whole lifetime. The
/// identity switch to the organization administrator happens during setup
/// (or at the start of the first run of a resumed workload) and persists.
pub struct WorkloadOrchestrator {
    session: Session,
    invoker: TimedInvoker,
    provisioner: Arc<dyn Provisioner>,
    config: BenchConfig,
    state: LifecycleState,
}

impl WorkloadOrchestrator {
    /// Logs in as the initial identity, measuring `auth.login`.
    ///
    /// # Errors
    ///
    /// Returns the error of the login call.
    pub async fn new(
        session: Session,
        transport: Arc<dyn RpcTransport>,
        provisioner: Arc<dyn Provisioner>,
        config: BenchConfig,
    ) -> AppResult<Self> {
        let mut orchestrator = Self {
            session,
            invoker: TimedInvoker::new(transport),
            provisioner,
            config,
            state: LifecycleState::Uninitialized,
        };
        let repeats = orchestrator.config.repeats;
        orchestrator
            .session
            .login(&mut orchestrator.invoker, repeats)
            .await?;
        Ok(orchestrator)
    }

    /// Like [`WorkloadOrchestrator::new`], for fixtures created by an earlier
    /// process: the workload starts out set up.
    ///
    /// # Errors
    ///
    /// Returns the error of the login call.
    pub async fn resume(
        session: Session,
        transport: Arc<dyn RpcTransport>,
        provisioner: Arc<dyn Provisioner>,
        config: BenchConfig,
    ) -> AppResult<Self> {
        let mut orchestrator = Self::new(session, transport, provisioner, config).await?;
        orchestrator.state = LifecycleState::SetUp;
        Ok(orchestrator)
    }

    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Measurements recorded since the last run returned.
    #[must_use]
    pub fn pending_log(&self) -> &[ActionRecord] {
        self.invoker.log()
    }

    /// Runs the baseline checks from any state and moves to `Checked`.
    /// A failed check leaves the state unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first [`crate::error::PreconditionViolation`] or an RPC
    /// error.
    pub async fn check(&mut self) -> AppResult<()> {
        PreconditionChecker::from_fixtures(&self.config.fixtures)
            .check(&self.invoker, &self.session)
            .await?;
        self.state = LifecycleState::Checked;
        Ok(())
    }

    /// Creates the fixtures and switches to the organization administrator.
    /// Returns the created organization ids.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTransition`] unless checked, or the
    /// first RPC error.
    pub async fn setup(&mut self) -> AppResult<Vec<OrgId>> {
        self.require("set up", &[LifecycleState::Checked])?;
        let created = self
            .provisioner
            .create_organizations(&self.invoker, &self.session)
            .await?;

        info!("Continuing with the first created organization only");
        self.switch_to_org_admin().await?;
        self.provisioner
            .populate_organization(&self.invoker, &self.session)
            .await?;

        info!("Created organizations: {}", join_ids(&created));
        self.state = LifecycleState::SetUp;
        Ok(created)
    }

    /// Runs the measured call sequence once and returns every record since
    /// the previous run, including logins.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTransition`] before setup or after
    /// cleanup, [`ConfigError::OrganizationNotFound`] when the primary
    /// organization is absent, or the first RPC error.
    pub async fn run(&mut self) -> AppResult<RunResult> {
        self.require("run", &[LifecycleState::SetUp, LifecycleState::Running])?;
        self.state = LifecycleState::Running;
        let list = i64::from(self.config.repeats);
        let primary = self.config.fixtures.primary_org();
        let channel = json!(self.config.fixtures.target_channel());

        // Admin views, under whatever identity is current.
        let orgs = self.measure_list(list, LIST_ORGS, Vec::new()).await?;
        self.measure(list, "org.listSoftwareEntitlements", Vec::new())
            .await?;
        self.measure(list, "org.listSystemEntitlements", Vec::new())
            .await?;

        let mut org_id = None;
        for org in &orgs {
            let name = member(LIST_ORGS, org, "name")?;
            self.measure(DETAIL_REPEATS, "org.getDetails", vec![name.clone()])
                .await?;
            if name.as_str() == Some(primary.as_str()) {
                org_id = Some(member_i64(LIST_ORGS, org, "id")?);
                break;
            }
        }
        let org_id = org_id.ok_or(ConfigError::OrganizationNotFound { name: primary })?;
        self.measure(list, "org.listUsers", vec![json!(org_id)])
            .await?;

        self.switch_to_org_admin().await?;

        let users = self.measure_list(list, LIST_USERS, Vec::new()).await?;
        self.measure_each(&users, LIST_USERS, "login", "user.getDetails")
            .await?;

        let channels = self.measure_list(list, LIST_CHANNELS, Vec::new()).await?;
        self.measure_each(&channels, LIST_CHANNELS, "label", "channel.software.getDetails")
            .await?;

        let packages = self
            .measure_list(list, LIST_PACKAGES, vec![channel.clone()])
            .await?;
        self.measure_each(&packages, LIST_PACKAGES, "id", "packages.getDetails")
            .await?;

        let errata = self.measure_list(list, LIST_ERRATA, vec![channel]).await?;
        self.measure_each(&errata, LIST_ERRATA, "advisory_name", "errata.getDetails")
            .await?;

        let systems = self.measure_list(list, LIST_SYSTEMS, Vec::new()).await?;
        for system in &systems {
            let id = member(LIST_SYSTEMS, system, "id")?;
            self.measure(DETAIL_REPEATS, "system.getDetails", vec![id.clone()])
                .await?;
            self.measure(
                DETAIL_REPEATS,
                "system.getUnscheduledErrata",
                vec![id.clone()],
            )
            .await?;
        }

        let result = self.invoker.take_log();
        info!("Run finished with {} measurements", result.len());
        Ok(result)
    }

    /// Deletes `orgs` and removes local build artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTransition`] before setup, or the first
    /// deletion error (for example a fault for an unknown id).
    pub async fn cleanup(&mut self, orgs: &[OrgId]) -> AppResult<()> {
        self.require(
            "clean up",
            &[
                LifecycleState::SetUp,
                LifecycleState::Running,
                LifecycleState::CleanedUp,
            ],
        )?;
        info!("Deleting organizations {}", join_ids(orgs));
        for org in orgs {
            self.provisioner
                .delete_organization(&self.invoker, &self.session, *org)
                .await?;
        }
        remove_artifacts(
            &self.config.artifact_dir,
            &self.config.fixtures.artifact_pattern,
        )
        .await;
        info!("Cleanup finished");
        self.state = LifecycleState::CleanedUp;
        Ok(())
    }

    /// Ends the session. Failures are only logged.
    pub async fn close(mut self) {
        if let Err(err) = self.session.logout(&self.invoker).await {
            warn!("Logout failed: {}", err);
        }
    }

    fn require(&self, operation: &'static str, allowed: &[LifecycleState]) -> Result<(), ConfigError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(ConfigError::InvalidTransition {
                operation,
                state: self.state.as_str(),
            })
        }
    }

    async fn switch_to_org_admin(&mut self) -> AppResult<()> {
        let admin = self.config.fixtures.primary_admin();
        if self.session.username() == admin.username {
            return Ok(());
        }
        let repeats: Repeats = self.config.repeats;
        self.session
            .switch_identity(&mut self.invoker, admin, repeats)
            .await
    }

    async fn measure(&mut self, repeats: i64, method: &str, args: Vec<Value>) -> AppResult<Value> {
        let (output, _) = self
            .invoker
            .measure(&self.session, repeats, method, args)
            .await?;
        Ok(output)
    }

    async fn measure_list(
        &mut self,
        repeats: i64,
        method: &str,
        args: Vec<Value>,
    ) -> AppResult<Vec<Value>> {
        let output = self.measure(repeats, method, args).await?;
        Ok(into_list(method, output)?)
    }

    async fn measure_each(
        &mut self,
        items: &[Value],
        list_method: &str,
        key: &str,
        detail_method: &str,
    ) -> AppResult<()> {
        for item in items {
            let arg = member(list_method, item, key)?.clone();
            self.measure(DETAIL_REPEATS, detail_method, vec![arg])
                .await?;
        }
        Ok(())
    }
}

pub(crate) fn join_ids(ids: &[OrgId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
