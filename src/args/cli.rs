use clap::Parser;

use crate::bench::Repeats;
use crate::config::types::Scheme;

use super::parsers::parse_repeats;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "satbench",
    version,
    about = "Latency benchmark for the Satellite 5 XML-RPC API - baseline checks, fixture setup, sequential and multi-process runs, per-call and per-method reports.",
    after_help = "Actions:\n  check              verify the server is in its pristine state\n  setup              check, create fixtures, print created organization ids\n  run [WORKERS]      measure the API, optionally across WORKERS processes\n  cleanup <IDS>      delete comma-separated organization ids"
)]
pub struct BenchArgs {
    /// Satellite administrator login
    #[arg(value_name = "USERNAME", required_unless_present = "worker")]
    pub username: Option<String>,

    /// Satellite administrator password
    #[arg(value_name = "PASSWORD", required_unless_present = "worker")]
    pub password: Option<String>,

    /// Satellite hostname, optionally with a port
    #[arg(value_name = "HOSTNAME", required_unless_present = "worker")]
    pub hostname: Option<String>,

    /// One of check, setup, run, cleanup
    #[arg(value_name = "ACTION", required_unless_present = "worker")]
    pub action: Option<String>,

    /// Action arguments (worker count for run, organization ids for cleanup)
    #[arg(value_name = "ARGS")]
    pub action_args: Vec<String>,

    /// Path to config file (TOML or JSON)
    #[arg(long, short = 'c', env = "SATBENCH_CONFIG")]
    pub config: Option<String>,

    /// Enable debug logging (or set SATBENCH_LOG / RUST_LOG for custom filters)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// URL scheme used to reach the API
    #[arg(long, value_enum, default_value_t = Scheme::Https)]
    pub scheme: Scheme,

    /// Verify TLS certificates and hostnames (skipped by default)
    #[arg(long)]
    pub secure: bool,

    /// Repeat count for list calls and logins
    #[arg(long, value_parser = parse_repeats)]
    pub repeats: Option<Repeats>,

    /// Run as a worker process fed by its parent over stdin
    #[arg(long, hide = true)]
    pub worker: bool,
}
