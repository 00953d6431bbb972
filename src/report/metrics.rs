//! Calculate hot lines and time distribution from report data.
//!
//! Hot lines are the source lines whose own instructions took the most
//! time. These are the primary targets for optimization.

use super::schema::{HotLine, ReportData};
use log::debug;

/// Calculate hot lines from a report
///
/// **Public** - main entry point for metrics calculation
///
/// # Arguments
/// * `report` - Snapshot from the profiler
/// * `top_n` - Number of top lines to return
///
/// # Returns
/// Vector of hot lines, sorted by self time (descending), ties broken by
/// total time. Lines that never ran are skipped.
pub fn calculate_hot_lines(report: &ReportData, top_n: usize) -> Vec<HotLine> {
    let total = report.total_exclusive_ns();

    let mut lines: Vec<HotLine> = report
        .functions
        .iter()
        .flat_map(|f| f.lines.iter().map(move |l| (f, l)))
        .filter(|(_, l)| l.total_ns() > 0)
        .map(|(f, l)| HotLine {
            function: f.name.clone(),
            line_number: l.line_number,
            source: l.source.trim_end().to_string(),
            self_ns: l.self_ns,
            child_ns: l.child_ns,
            total_ns: l.total_ns(),
            percentage: percentage_of(l.self_ns, total),
        })
        .collect();

    debug!("Ranking {} executed lines, keeping top {}", lines.len(), top_n);

    lines.sort_by(|a, b| {
        b.self_ns
            .cmp(&a.self_ns)
            .then_with(|| b.total_ns.cmp(&a.total_ns))
    });
    lines.truncate(top_n);
    lines
}

fn percentage_of(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Calculate where the measured time went
///
/// **Public** - provides summary statistics
pub fn calculate_time_distribution(report: &ReportData) -> TimeDistribution {
    let self_ns = report.functions.iter().map(|f| f.self_ns()).sum();
    let child_ns = report.functions.iter().map(|f| f.child_ns()).sum();
    let overhead_ns = report.functions.iter().map(|f| f.overhead_ns).sum();
    let native_ns = report.natives.iter().map(|n| n.self_ns).sum();
    let total_calls = report.functions.iter().map(|f| f.calls).sum();

    TimeDistribution {
        total_ns: report.total_exclusive_ns(),
        self_ns,
        child_ns,
        overhead_ns,
        native_ns,
        function_count: report.functions.len(),
        native_count: report.natives.len(),
        total_calls,
        degraded_functions: report.functions.iter().filter(|f| f.is_degraded()).count(),
        malformed_events: report.malformed_events,
    }
}

/// Time distribution statistics
///
/// **Public** - returned from calculate_time_distribution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeDistribution {
    /// Total exclusive time
    pub total_ns: u64,

    /// Time on lines' own instructions
    pub self_ns: u64,

    /// Time lines spent waiting on calls they made
    pub child_ns: u64,

    /// Call/return transition time
    pub overhead_ns: u64,

    /// Time inside native callables
    pub native_ns: u64,

    pub function_count: usize,
    pub native_count: usize,
    pub total_calls: u64,
    pub degraded_functions: usize,
    pub malformed_events: u64,
}

impl TimeDistribution {
    /// Share of exclusive time spent in call/return transitions
    pub fn overhead_percentage(&self) -> f64 {
        percentage_of(self.overhead_ns, self.total_ns)
    }

    /// Get human-readable summary
    ///
    /// **Public** - for logging and debugging
    pub fn summary(&self) -> String {
        format!(
            "Total: {} ns | Functions: {} ({} calls) | Natives: {} | Overhead: {:.1}% | Degraded: {} | Malformed events: {}",
            self.total_ns,
            self.function_count,
            self.total_calls,
            self.native_count,
            self.overhead_percentage(),
            self.degraded_functions,
            self.malformed_events
        )
    }
}
