//! Human-readable output for the CLI

use crate::metrics::MetricsSnapshot;
use crate::tally::WordCounts;
use std::fmt::Write;
use std::time::Duration;

/// Format counts as a `Count Word` table, sorted by word
pub fn format_table(counts: &WordCounts) -> String {
    let mut rows: Vec<_> = counts.iter().collect();
    rows.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut out = String::new();
    let _ = writeln!(out, "{:<10}{}", "Count", "Word");
    let _ = writeln!(out, "{:<10}{}", "-----", "----");
    for (word, count) in rows {
        let _ = writeln!(out, "{:<10}{}", count, word);
    }
    out
}

/// One-line summary printed after every run
pub fn format_summary(counts: &WordCounts, elapsed: Duration) -> String {
    format!(
        "Processing took: {:.2?}\nTotal words: {}",
        elapsed,
        counts.len()
    )
}

/// Summary plus the pipeline counters
pub fn format_metrics(metrics: &MetricsSnapshot) -> String {
    format!("Pipeline metrics: {}", metrics.format())
}
