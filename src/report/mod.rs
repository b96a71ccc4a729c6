//! Aggregation of worker run results into per-call, per-method and total
//! views.
//!
//! All arithmetic is done in integer nanoseconds. Calls to one method are
//! merged into a single summary regardless of their arguments.
mod render;

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use crate::bench::{Repeats, RunResult};

pub use render::{print_report, report_lines};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRow {
    pub worker: usize,
    pub method: String,
    pub repeats: Repeats,
    pub output_size: u64,
    pub start: SystemTime,
    pub average: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MethodSummary {
    /// Measured calls merged into this summary.
    pub calls: u64,
    /// Invocations across those calls.
    pub repeats: u64,
    pub total: Duration,
    /// `total / repeats`.
    pub average: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GrandTotal {
    pub workers: usize,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AggregateReport {
    pub rows: Vec<CallRow>,
    pub methods: BTreeMap<String, MethodSummary>,
    pub total: GrandTotal,
}

impl AggregateReport {
    #[must_use]
    pub fn combined_average(&self, method: &str) -> Option<Duration> {
        self.methods.get(method).map(|summary| summary.average)
    }
}

#[derive(Default)]
struct MethodAccumulator {
    calls: u64,
    repeats: u64,
    nanos: u128,
}

/// Merges the results of all workers; `results[i]` belongs to worker `i`.
#[must_use]
pub fn aggregate(results: &[RunResult]) -> AggregateReport {
    let mut rows = Vec::new();
    let mut accumulators: BTreeMap<String, MethodAccumulator> = BTreeMap::new();
    let mut total_nanos = 0_u128;

    for (worker, result) in results.iter().enumerate() {
        for record in result {
            let duration = record.duration();
            let nanos = duration.as_nanos();
            rows.push(CallRow {
                worker,
                method: record.method.clone(),
                repeats: record.repeats,
                output_size: record.output_size,
                start: record.start,
                average: record.average(),
            });

            let entry = accumulators.entry(record.method.clone()).or_default();
            entry.calls = entry.calls.saturating_add(1);
            entry.repeats = entry
                .repeats
                .saturating_add(u64::from(record.repeats.get()));
            entry.nanos = entry.nanos.saturating_add(nanos);
            total_nanos = total_nanos.saturating_add(nanos);
        }
    }

    let methods = accumulators
        .into_iter()
        .map(|(method, acc)| {
            let average = acc
                .nanos
                .checked_div(u128::from(acc.repeats))
                .unwrap_or_default();
            let summary = MethodSummary {
                calls: acc.calls,
                repeats: acc.repeats,
                total: nanos_to_duration(acc.nanos),
                average: nanos_to_duration(average),
            };
            (method, summary)
        })
        .collect();

    AggregateReport {
        rows,
        methods,
        total: GrandTotal {
            workers: results.len(),
            duration: nanos_to_duration(total_nanos),
        },
    }
}

fn nanos_to_duration(nanos: u128) -> Duration {
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}
