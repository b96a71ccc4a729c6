use std::path::PathBuf;

use clap::ArgMatches;
use clap::parser::ValueSource;
use tracing::debug;

use crate::args::BenchArgs;
use crate::bench::Repeats;
use crate::error::AppResult;

use super::types::{BenchConfig, ConfigFile, DEFAULT_ENDPOINT};

/// Merges command-line options over the config file over built-in defaults.
///
/// An option counts as given on the command line only when clap saw it
/// there; defaulted CLI values lose to the file.
///
/// # Errors
///
/// Returns an error when the config file carries an invalid repeat count.
pub fn resolve_config(
    args: &BenchArgs,
    matches: &ArgMatches,
    file: Option<&ConfigFile>,
) -> AppResult<BenchConfig> {
    let defaults = ConfigFile::default();
    let file = file.unwrap_or(&defaults);

    let scheme = if is_cli(matches, "scheme") {
        args.scheme
    } else {
        file.scheme.unwrap_or(args.scheme)
    };

    let insecure = if is_cli(matches, "secure") {
        !args.secure
    } else {
        file.insecure.unwrap_or(true)
    };

    let repeats = match (args.repeats, file.repeats) {
        (Some(repeats), _) if is_cli(matches, "repeats") => repeats,
        (_, Some(value)) => Repeats::try_from(value)?,
        (Some(repeats), None) => repeats,
        (None, None) => Repeats::DEFAULT,
    };

    let config = BenchConfig {
        scheme,
        endpoint: file
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()),
        insecure,
        repeats,
        artifact_dir: file
            .artifact_dir
            .as_ref()
            .map_or_else(|| PathBuf::from("."), PathBuf::from),
        fixtures: file.fixtures.clone().unwrap_or_default(),
    };
    debug!(
        "Resolved config: scheme={} endpoint={} insecure={} repeats={}",
        config.scheme, config.endpoint, config.insecure, config.repeats
    );
    Ok(config)
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}
