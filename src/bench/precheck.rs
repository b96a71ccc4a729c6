use tracing::info;

use crate::config::types::FixtureConfig;
use crate::error::{AppResult, Expectation, Observed, PreconditionViolation};
use crate::rpc::{Value, into_list, member, member_u64};

use super::invoker::TimedInvoker;
use super::session::Session;

const LIST_ORGS: &str = "org.listOrgs";
const LIST_SYSTEM_ENTITLEMENTS: &str = "org.listSystemEntitlements";
const LIST_ALL_CHANNELS: &str = "channel.listAllChannels";
const LIST_USERS: &str = "user.listUsers";
const LIST_SYSTEMS: &str = "system.listSystems";

/// Verifies the server is pristine before fixtures are created.
///
/// Checks run in a fixed order and stop at the first violation. All calls
/// are unmeasured and read-only.
#[derive(Debug, Clone)]
pub struct PreconditionChecker {
    entitlement: String,
    min_free: u64,
}

impl PreconditionChecker {
    #[must_use]
    pub fn new(entitlement: impl Into<String>, min_free: u64) -> Self {
        Self {
            entitlement: entitlement.into(),
            min_free,
        }
    }

    #[must_use]
    pub fn from_fixtures(fixtures: &FixtureConfig) -> Self {
        Self::new(fixtures.entitlement.clone(), fixtures.min_free_entitlements)
    }

    /// # Errors
    ///
    /// Returns [`PreconditionViolation`] naming the first failed assertion,
    /// or the RPC error of a listing call.
    pub async fn check(&self, invoker: &TimedInvoker, session: &Session) -> AppResult<()> {
        info!("Checking that {} is in its baseline state", session.hostname());

        let orgs = list(invoker, session, LIST_ORGS).await?;
        ensure("single_organization", Expectation::Exactly(1), count(&orgs))?;

        let entitlements = list(invoker, session, LIST_SYSTEM_ENTITLEMENTS).await?;
        let mut target = None;
        for entitlement in &entitlements {
            let label = member(LIST_SYSTEM_ENTITLEMENTS, entitlement, "label")?;
            if label.as_str() == Some(self.entitlement.as_str()) {
                target = Some(entitlement);
                break;
            }
        }
        let Some(target) = target else {
            return Err(violation("entitlement_present", Expectation::Present, Observed::Missing).into());
        };
        ensure(
            "entitlement_unused",
            Expectation::Exactly(0),
            Observed::Count(member_u64(LIST_SYSTEM_ENTITLEMENTS, target, "used")?),
        )?;
        ensure(
            "entitlement_unallocated",
            Expectation::Exactly(0),
            Observed::Count(member_u64(LIST_SYSTEM_ENTITLEMENTS, target, "allocated")?),
        )?;
        ensure(
            "entitlement_free_capacity",
            Expectation::AtLeast(self.min_free),
            Observed::Count(member_u64(LIST_SYSTEM_ENTITLEMENTS, target, "free")?),
        )?;

        let channels = list(invoker, session, LIST_ALL_CHANNELS).await?;
        ensure("no_channels", Expectation::Exactly(0), count(&channels))?;

        let users = list(invoker, session, LIST_USERS).await?;
        ensure("single_user", Expectation::Exactly(1), count(&users))?;

        let systems = list(invoker, session, LIST_SYSTEMS).await?;
        ensure("no_systems", Expectation::Exactly(0), count(&systems))?;

        info!("Baseline checks passed");
        Ok(())
    }
}

async fn list(invoker: &TimedInvoker, session: &Session, method: &str) -> AppResult<Vec<Value>> {
    let value = invoker.call(session, method, Vec::new()).await?;
    Ok(into_list(method, value)?)
}

fn count(items: &[Value]) -> Observed {
    Observed::Count(u64::try_from(items.len()).unwrap_or(u64::MAX))
}

fn violation(assertion: &str, expected: Expectation, observed: Observed) -> PreconditionViolation {
    PreconditionViolation {
        assertion: assertion.to_owned(),
        expected,
        observed,
    }
}

fn ensure(
    assertion: &str,
    expected: Expectation,
    observed: Observed,
) -> Result<(), PreconditionViolation> {
    if expected.admits(observed) {
        Ok(())
    } else {
        Err(violation(assertion, expected, observed))
    }
}
