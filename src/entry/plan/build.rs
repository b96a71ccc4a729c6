use clap::ArgMatches;

use crate::args::{Action, BenchArgs};
use crate::bench::Credentials;
use crate::config::{load_config, resolve_config};
use crate::error::{AppError, AppResult, ConfigError};
use crate::runner::BenchTarget;

use super::types::RunPlan;

pub(crate) fn build_plan(args: BenchArgs, matches: &ArgMatches) -> AppResult<RunPlan> {
    if args.worker {
        return Ok(RunPlan::Worker);
    }

    let file = load_config(args.config.as_deref())?;
    let config = resolve_config(&args, matches, file.as_ref())?;

    let action_word = required(args.action.as_deref(), "ACTION")?;
    let action = Action::parse(action_word, &args.action_args).map_err(|err| {
        tracing::error!("{}", err);
        AppError::config(err)
    })?;

    let username = required(args.username.as_deref(), "USERNAME")?;
    let password = required(args.password.as_deref(), "PASSWORD")?;
    let hostname = required(args.hostname.as_deref(), "HOSTNAME")?;

    let target = BenchTarget::new(
        Credentials::new(username, password),
        hostname.to_owned(),
        config,
    );
    Ok(RunPlan::Bench { target, action })
}

fn required<'a>(value: Option<&'a str>, argument: &'static str) -> AppResult<&'a str> {
    value.ok_or_else(|| AppError::config(ConfigError::MissingPositional { argument }))
}
