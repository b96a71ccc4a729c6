use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};

use super::AggregateReport;

const METHOD_WIDTH: usize = 36;

/// Text of the three report sections, one entry per output line.
#[must_use]
pub fn report_lines(report: &AggregateReport) -> Vec<String> {
    let mut lines = Vec::with_capacity(
        report
            .rows
            .len()
            .saturating_add(report.methods.len())
            .saturating_add(8),
    );

    lines.push("Per-call:".to_owned());
    lines.push(format!(
        "{:>6}  {:<width$}  {:>7}  {:>8}  {:<24}  {:>12}",
        "worker",
        "method",
        "repeats",
        "output",
        "started",
        "avg [s]",
        width = METHOD_WIDTH
    ));
    for row in &report.rows {
        lines.push(format!(
            "{:>6}  {:<width$}  {:>7}  {:>8}  {:<24}  {:>12}",
            row.worker,
            row.method,
            row.repeats,
            row.output_size,
            format_timestamp(row.start),
            format_seconds(row.average),
            width = METHOD_WIDTH
        ));
    }

    lines.push(String::new());
    lines.push("Per-method:".to_owned());
    lines.push(format!(
        "{:<width$}  {:>6}  {:>8}  {:>12}  {:>12}",
        "method",
        "calls",
        "repeats",
        "total [s]",
        "avg [s]",
        width = METHOD_WIDTH
    ));
    for (method, summary) in &report.methods {
        lines.push(format!(
            "{:<width$}  {:>6}  {:>8}  {:>12}  {:>12}",
            method,
            summary.calls,
            summary.repeats,
            format_seconds(summary.total),
            format_seconds(summary.average),
            width = METHOD_WIDTH
        ));
    }

    lines.push(String::new());
    lines.push("Total:".to_owned());
    lines.push(format!("Workers: {}", report.total.workers));
    lines.push(format!("Duration: {}s", format_seconds(report.total.duration)));
    lines
}

pub fn print_report(report: &AggregateReport) {
    for line in report_lines(report) {
        println!("{}", line);
    }
}

fn format_seconds(duration: Duration) -> String {
    format!("{}.{:06}", duration.as_secs(), duration.subsec_micros())
}

fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}
