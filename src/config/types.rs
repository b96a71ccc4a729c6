use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::bench::{Credentials, Repeats};
use crate::error::ConfigError;

/// Default API path on a Satellite 5 server.
pub const DEFAULT_ENDPOINT: &str = "/rpc/api";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Https,
    Http,
}

impl Scheme {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Scheme::Https => "https",
            Scheme::Http => "http",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contents of `satbench.toml` / `satbench.json`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub scheme: Option<Scheme>,
    pub endpoint: Option<String>,
    pub insecure: Option<bool>,
    pub repeats: Option<i64>,
    pub artifact_dir: Option<String>,
    pub fixtures: Option<FixtureConfig>,
}

/// Shape and naming of the benchmark fixtures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Name prefix shared by every created entity.
    pub prefix: String,
    pub organizations: u32,
    pub users: u32,
    pub channels: u32,
    pub errata: u32,
    pub activation_keys: u32,
    /// System entitlement inspected by the baseline check.
    pub entitlement: String,
    pub min_free_entitlements: u64,
    pub system_entitlements: Vec<String>,
    /// System entitlement allocation of the first organization, which hosts
    /// the measured content.
    pub primary_allocation: i64,
    pub secondary_allocation: i64,
    pub software_families: Vec<String>,
    pub software_allocation: i64,
    /// Working-directory entries containing this are removed on cleanup.
    pub artifact_pattern: String,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            prefix: "benchmark".to_owned(),
            organizations: 100,
            users: 100,
            channels: 100,
            errata: 200,
            activation_keys: 100,
            entitlement: "enterprise_entitled".to_owned(),
            min_free_entitlements: 100,
            system_entitlements: vec![
                "enterprise_entitled".to_owned(),
                "provisioning_entitled".to_owned(),
            ],
            primary_allocation: 1000,
            secondary_allocation: 1,
            software_families: [
                "rhel-server",
                "rhel-server-6",
                "rhel-server-7",
                "rhel-client",
                "rhel-client-6",
                "rhel-client-7",
            ]
            .iter()
            .map(|family| (*family).to_owned())
            .collect(),
            software_allocation: 1,
            artifact_pattern: "test-rpmbuild-".to_owned(),
        }
    }
}

impl FixtureConfig {
    #[must_use]
    pub fn org_name(&self, index: u32) -> String {
        format!("{}-org-{}", self.prefix, index)
    }

    /// Administrator created together with organization `index`.
    #[must_use]
    pub fn org_admin(&self, index: u32) -> Credentials {
        let org = self.org_name(index);
        Credentials::new(format!("{}-admin", org), format!("{}-pass", org))
    }

    /// The organization all content is created in and measured against.
    #[must_use]
    pub fn primary_org(&self) -> String {
        self.org_name(0)
    }

    #[must_use]
    pub fn primary_admin(&self) -> Credentials {
        self.org_admin(0)
    }

    #[must_use]
    pub fn user_credentials(&self, index: u32) -> Credentials {
        let org = self.primary_org();
        Credentials::new(
            format!("{}-user-{}", org, index),
            format!("{}-pass-{}", org, index),
        )
    }

    #[must_use]
    pub fn channel_label(&self, index: u32) -> String {
        format!("{}-channel-{}", self.primary_org(), index)
    }

    /// Channel whose packages and errata are measured.
    #[must_use]
    pub fn target_channel(&self) -> String {
        self.channel_label(0)
    }

    #[must_use]
    pub fn advisory_name(&self, index: u32) -> String {
        format!("{}-package-{}", self.target_channel(), index)
    }

    #[must_use]
    pub const fn allocation_for(&self, org_index: u32) -> i64 {
        if org_index == 0 {
            self.primary_allocation
        } else {
            self.secondary_allocation
        }
    }
}

/// Fully resolved settings for one invocation, shipped to worker processes
/// as part of their assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchConfig {
    pub scheme: Scheme,
    pub endpoint: String,
    /// Skip TLS certificate and hostname verification.
    pub insecure: bool,
    pub repeats: Repeats,
    pub artifact_dir: PathBuf,
    pub fixtures: FixtureConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::default(),
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            insecure: true,
            repeats: Repeats::DEFAULT,
            artifact_dir: PathBuf::from("."),
            fixtures: FixtureConfig::default(),
        }
    }
}

impl BenchConfig {
    /// API URL on `hostname` (which may carry a port).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEndpoint`] when the pieces do not form a
    /// URL and [`ConfigError::EndpointMissingHost`] when no host results.
    pub fn endpoint_url(&self, hostname: &str) -> Result<Url, ConfigError> {
        let path = if self.endpoint.starts_with('/') {
            self.endpoint.clone()
        } else {
            format!("/{}", self.endpoint)
        };
        let raw = format!("{}://{}{}", self.scheme, hostname, path);
        let url = Url::parse(&raw).map_err(|source| ConfigError::InvalidEndpoint {
            url: raw.clone(),
            source,
        })?;
        if url.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::EndpointMissingHost { url: raw });
        }
        Ok(url)
    }
}
