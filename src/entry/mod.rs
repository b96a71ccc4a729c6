mod plan;

use std::ffi::OsString;

use clap::error::ErrorKind;
use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::args::BenchArgs;
use crate::error::AppResult;
use plan::{build_plan, execute_plan};

/// Parses the process arguments and runs the requested action to completion.
///
/// # Errors
///
/// Returns the first error of argument parsing, configuration, or the action.
pub fn run() -> AppResult<()> {
    let raw_args: Vec<OsString> = std::env::args_os().collect();
    let (args, matches) = match parse_args(raw_args)? {
        Some(parsed) => parsed,
        None => return Ok(()),
    };

    crate::system::logger::init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args, &matches))
}

/// `None` means clap already printed help or version output.
fn parse_args(raw_args: Vec<OsString>) -> AppResult<Option<(BenchArgs, ArgMatches)>> {
    let matches = match BenchArgs::command().try_get_matches_from(raw_args) {
        Ok(matches) => matches,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.print()?;
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };
    let args = BenchArgs::from_arg_matches(&matches)?;
    Ok(Some((args, matches)))
}

async fn run_async(args: BenchArgs, matches: &ArgMatches) -> AppResult<()> {
    let plan = build_plan(args, matches)?;
    execute_plan(plan).await
}
