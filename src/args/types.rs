use std::num::NonZeroUsize;

use crate::bench::OrgId;
use crate::error::ConfigError;

use super::parsers::{parse_org_ids, parse_worker_count};

/// What to do with the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Baseline checks only.
    Check,
    /// Baseline checks, then fixture creation.
    Setup,
    Run { workers: NonZeroUsize },
    Cleanup { orgs: Vec<OrgId> },
}

impl Action {
    /// Interprets the action word and its trailing arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unknown action or malformed arguments.
    pub fn parse(action: &str, args: &[String]) -> Result<Self, ConfigError> {
        match action {
            "check" => no_arguments("check", args).map(|()| Action::Check),
            "setup" => no_arguments("setup", args).map(|()| Action::Setup),
            "run" => match args {
                [] => Ok(Action::Run {
                    workers: NonZeroUsize::MIN,
                }),
                [workers] => Ok(Action::Run {
                    workers: parse_worker_count(workers)?,
                }),
                [_, _, ..] => Err(ConfigError::TooManyActionArguments {
                    action: "run",
                    max: 1,
                }),
            },
            "cleanup" => match args {
                [] => Err(ConfigError::MissingActionArgument {
                    action: "cleanup",
                    argument: "a comma-separated list of organization ids",
                }),
                [orgs] => Ok(Action::Cleanup {
                    orgs: parse_org_ids(orgs)?,
                }),
                [_, _, ..] => Err(ConfigError::TooManyActionArguments {
                    action: "cleanup",
                    max: 1,
                }),
            },
            other => Err(ConfigError::UnknownAction {
                action: other.to_owned(),
            }),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Action::Check => "check",
            Action::Setup => "setup",
            Action::Run { .. } => "run",
            Action::Cleanup { .. } => "cleanup",
        }
    }
}

const fn no_arguments(action: &'static str, args: &[String]) -> Result<(), ConfigError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::TooManyActionArguments { action, max: 0 })
    }
}
