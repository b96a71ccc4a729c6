use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported config extension '{ext}'. Use .toml or .json.")]
    UnsupportedExtension { ext: String },
    #[error("Config file must have .toml or .json extension.")]
    MissingExtension,
    #[error("Invalid config value for '{field}': {reason}.")]
    InvalidConfigValue {
        field: &'static str,
        reason: &'static str,
    },
    #[error("Repeat count must be >= 1 (got {value}).")]
    InvalidRepeats { value: i64 },
    #[error("Invalid repeat count '{value}': {source}")]
    InvalidRepeatsNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Worker count must be >= 1 (got '{value}').")]
    InvalidWorkerCount { value: String },
    #[error("Invalid organization id '{value}': {source}")]
    InvalidOrgId {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Unrecognized action '{action}'. Use check, setup, run, or cleanup.")]
    UnknownAction { action: String },
    #[error("Action '{action}' requires {argument}.")]
    MissingActionArgument {
        action: &'static str,
        argument: &'static str,
    },
    #[error("Action '{action}' takes at most {max} argument(s).")]
    TooManyActionArguments { action: &'static str, max: usize },
    #[error("Missing {argument} (required unless running as a worker).")]
    MissingPositional { argument: &'static str },
    #[error("Invalid endpoint URL '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Endpoint URL '{url}' has no host.")]
    EndpointMissingHost { url: String },
    #[error("Cannot call '{method}' without an authenticated session.")]
    NotAuthenticated { method: String },
    #[error("Cannot {operation} while the workload is {state}.")]
    InvalidTransition {
        operation: &'static str,
        state: &'static str,
    },
    #[error("Organization '{name}' was not found; run setup first.")]
    OrganizationNotFound { name: String },
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

/// Lifecycle operation and state names that can appear in
/// [`ConfigError::InvalidTransition`].
const TRANSITION_NAMES: [&str; 8] = [
    "check",
    "set up",
    "run",
    "clean up",
    "uninitialized",
    "checked",
    "running",
    "cleaned up",
];

fn transition_name(name: &str) -> Option<&'static str> {
    TRANSITION_NAMES.iter().copied().find(|known| *known == name)
}

/// Serializable form of the configuration errors a worker can hit once it
/// is running its assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum ConfigFault {
    InvalidRepeats { value: i64 },
    NotAuthenticated { method: String },
    InvalidTransition { operation: String, state: String },
    OrganizationNotFound { name: String },
    EndpointMissingHost { url: String },
}

impl ConfigFault {
    /// `None` for errors that only arise while parsing input in the parent.
    #[must_use]
    pub fn from_error(error: &ConfigError) -> Option<Self> {
        match error {
            ConfigError::InvalidRepeats { value } => {
                Some(ConfigFault::InvalidRepeats { value: *value })
            }
            ConfigError::NotAuthenticated { method } => Some(ConfigFault::NotAuthenticated {
                method: method.clone(),
            }),
            ConfigError::InvalidTransition { operation, state } => {
                Some(ConfigFault::InvalidTransition {
                    operation: (*operation).to_owned(),
                    state: (*state).to_owned(),
                })
            }
            ConfigError::OrganizationNotFound { name } => {
                Some(ConfigFault::OrganizationNotFound { name: name.clone() })
            }
            ConfigError::EndpointMissingHost { url } => {
                Some(ConfigFault::EndpointMissingHost { url: url.clone() })
            }
            ConfigError::ReadConfig { .. }
            | ConfigError::ParseToml { .. }
            | ConfigError::ParseJson { .. }
            | ConfigError::UnsupportedExtension { .. }
            | ConfigError::MissingExtension
            | ConfigError::InvalidConfigValue { .. }
            | ConfigError::InvalidRepeatsNumber { .. }
            | ConfigError::InvalidWorkerCount { .. }
            | ConfigError::InvalidOrgId { .. }
            | ConfigError::UnknownAction { .. }
            | ConfigError::MissingActionArgument { .. }
            | ConfigError::TooManyActionArguments { .. }
            | ConfigError::MissingPositional { .. }
            | ConfigError::InvalidEndpoint { .. } => None,
            #[cfg(test)]
            ConfigError::TestExpectation { .. } | ConfigError::TestExpectationValue { .. } => None,
        }
    }

    /// Rebuilds the original error. Returns the fault unchanged when a
    /// transition names an unknown operation or state.
    ///
    /// # Errors
    ///
    /// Returns `self` when the error cannot be rebuilt.
    pub fn into_config_error(self) -> Result<ConfigError, Self> {
        match self {
            ConfigFault::InvalidRepeats { value } => Ok(ConfigError::InvalidRepeats { value }),
            ConfigFault::NotAuthenticated { method } => {
                Ok(ConfigError::NotAuthenticated { method })
            }
            ConfigFault::InvalidTransition { operation, state } => {
                match (transition_name(&operation), transition_name(&state)) {
                    (Some(operation), Some(state)) => {
                        Ok(ConfigError::InvalidTransition { operation, state })
                    }
                    (None, _) | (_, None) => {
                        Err(ConfigFault::InvalidTransition { operation, state })
                    }
                }
            }
            ConfigFault::OrganizationNotFound { name } => {
                Ok(ConfigError::OrganizationNotFound { name })
            }
            ConfigFault::EndpointMissingHost { url } => {
                Ok(ConfigError::EndpointMissingHost { url })
            }
        }
    }
}
