//! Core library for the `satbench` CLI.
//!
//! Measures the latency of a Satellite 5 server's XML-RPC API: baseline
//! checks, fixture creation, a fixed read-heavy workload run by one or more
//! worker processes, and per-call, per-method and total reports. The
//! primary interface is the `satbench` binary; library APIs may change with
//! it.
pub mod args;
pub mod bench;
pub mod config;
pub mod error;
pub mod report;
pub mod rpc;
pub mod runner;

mod entry;
mod system;

pub use entry::run;
