use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use crate::config::types::FixtureConfig;
use crate::error::AppResult;
use crate::rpc::{Value, into_list, member_i64};

use super::invoker::TimedInvoker;
use super::record::OrgId;
use super::session::Session;

const GPG_KEY_URL: &str = "https://www.example.com/security/fd431d51.txt";
const GPG_KEY_ID: &str = "FD431D51";
const GPG_KEY_FINGERPRINT: &str = "567E 347A D004 4ADE 55BA 8A5F 199E 2F91 FD43 1D51";
const CONTACT_EMAIL: &str = "root@localhost";

/// Creates and removes benchmark fixtures with unmeasured calls.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Creates the organizations with their entitlements, returning their ids
    /// in creation order. Runs under the privileged identity.
    async fn create_organizations(
        &self,
        invoker: &TimedInvoker,
        session: &Session,
    ) -> AppResult<Vec<OrgId>>;

    /// Fills the primary organization with users, channels, errata and
    /// activation keys. Runs under the organization administrator.
    async fn populate_organization(&self, invoker: &TimedInvoker, session: &Session)
    -> AppResult<()>;

    async fn delete_organization(
        &self,
        invoker: &TimedInvoker,
        session: &Session,
        org: OrgId,
    ) -> AppResult<()>;
}

/// [`Provisioner`] driven by the `[fixtures]` configuration.
///
/// Errata are only created for packages already present in the target
/// channel; packages themselves are never built or pushed.
#[derive(Debug, Clone)]
pub struct RpcProvisioner {
    fixtures: FixtureConfig,
}

impl RpcProvisioner {
    #[must_use]
    pub const fn new(fixtures: FixtureConfig) -> Self {
        Self { fixtures }
    }

    async fn create_users(&self, invoker: &TimedInvoker, session: &Session) -> AppResult<()> {
        info!("Creating {} users", self.fixtures.users);
        for index in 0..self.fixtures.users {
            let user = self.fixtures.user_credentials(index);
            let params = vec![
                json!(user.username),
                json!(user.password),
                json!(format!("Us{}", index)),
                json!(format!("Er{}", index)),
                json!(CONTACT_EMAIL),
                json!(0),
            ];
            invoker.call(session, "user.create", params).await?;
        }
        Ok(())
    }

    async fn create_channels(&self, invoker: &TimedInvoker, session: &Session) -> AppResult<()> {
        info!("Creating {} channels", self.fixtures.channels);
        for index in 0..self.fixtures.channels {
            let label = self.fixtures.channel_label(index);
            let params = vec![
                json!(label),
                json!(label),
                json!(label),
                json!("channel-x86_64"),
                json!(""),
                json!("sha256"),
                json!({
                    "url": GPG_KEY_URL,
                    "id": GPG_KEY_ID,
                    "fingerprint": GPG_KEY_FINGERPRINT,
                }),
            ];
            invoker.call(session, "channel.software.create", params).await?;
        }
        Ok(())
    }

    async fn create_errata(&self, invoker: &TimedInvoker, session: &Session) -> AppResult<()> {
        const LIST_PACKAGES: &str = "channel.software.listAllPackages";

        let channel = self.fixtures.target_channel();
        let packages = into_list(
            LIST_PACKAGES,
            invoker
                .call(session, LIST_PACKAGES, vec![json!(channel)])
                .await?,
        )?;
        let wanted = usize::try_from(self.fixtures.errata).unwrap_or(usize::MAX);
        if packages.len() < wanted {
            warn!(
                "Channel {} holds {} packages; creating {} of {} errata",
                channel,
                packages.len(),
                packages.len(),
                wanted
            );
        }
        info!("Creating errata in {}", channel);
        for (index, package) in (0..self.fixtures.errata).zip(packages.iter()) {
            let package_id = member_i64(LIST_PACKAGES, package, "id")?;
            let params = vec![
                self.errata_info(index),
                json!([{"id": 1_234_567, "summary": "bug summary"}]),
                json!(["benchmark"]),
                json!([package_id]),
                json!(true),
                json!([channel]),
            ];
            invoker.call(session, "errata.create", params).await?;
        }
        Ok(())
    }

    fn errata_info(&self, index: u32) -> Value {
        json!({
            "synopsis": format!("Fake advisory in {} for package {}", self.fixtures.target_channel(), index),
            "advisory_name": self.fixtures.advisory_name(index),
            "advisory_release": 1,
            "advisory_type": "Bug Fix Advisory",
            "product": "Fake product",
            "errataFrom": "11/18/16",
            "topic": "topic",
            "description": "description",
            "references": "references",
            "notes": "notes",
            "solution": "solution",
        })
    }

    async fn create_activation_keys(
        &self,
        invoker: &TimedInvoker,
        session: &Session,
    ) -> AppResult<()> {
        info!("Creating {} activation keys", self.fixtures.activation_keys);
        let channels = self.fixtures.channels.max(1);
        for index in 0..self.fixtures.activation_keys {
            let channel = self
                .fixtures
                .channel_label(index.checked_rem(channels).unwrap_or_default());
            let params = vec![
                json!(""),
                json!(format!("Benchmark AK {}", index)),
                json!(channel),
                json!([]),
                json!(false),
            ];
            invoker.call(session, "activationkey.create", params).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Provisioner for RpcProvisioner {
    async fn create_organizations(
        &self,
        invoker: &TimedInvoker,
        session: &Session,
    ) -> AppResult<Vec<OrgId>> {
        const CREATE_ORG: &str = "org.create";

        info!("Creating {} organizations", self.fixtures.organizations);
        let mut created = Vec::new();
        for index in 0..self.fixtures.organizations {
            let admin = self.fixtures.org_admin(index);
            let params = vec![
                json!(self.fixtures.org_name(index)),
                json!(admin.username),
                json!(admin.password),
                json!("Mr."),
                json!("Mark"),
                json!("Bench"),
                json!(CONTACT_EMAIL),
                json!(false),
            ];
            let org = invoker.call(session, CREATE_ORG, params).await?;
            let org_id = member_i64(CREATE_ORG, &org, "id")?;

            let allocation = self.fixtures.allocation_for(index);
            for label in &self.fixtures.system_entitlements {
                invoker
                    .call(
                        session,
                        "org.setSystemEntitlements",
                        vec![json!(org_id), json!(label), json!(allocation)],
                    )
                    .await?;
            }
            for family in &self.fixtures.software_families {
                invoker
                    .call(
                        session,
                        "org.setSoftwareEntitlements",
                        vec![
                            json!(org_id),
                            json!(family),
                            json!(self.fixtures.software_allocation),
                        ],
                    )
                    .await?;
            }
            created.push(org_id);
        }
        Ok(created)
    }

    async fn populate_organization(
        &self,
        invoker: &TimedInvoker,
        session: &Session,
    ) -> AppResult<()> {
        info!("Populating {}", self.fixtures.primary_org());
        self.create_users(invoker, session).await?;
        self.create_channels(invoker, session).await?;
        self.create_errata(invoker, session).await?;
        self.create_activation_keys(invoker, session).await
    }

    async fn delete_organization(
        &self,
        invoker: &TimedInvoker,
        session: &Session,
        org: OrgId,
    ) -> AppResult<()> {
        info!("Deleting organization {}", org);
        invoker
            .call(session, "org.delete", vec![json!(org)])
            .await?;
        Ok(())
    }
}
