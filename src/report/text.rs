//! Plain-text rendering of report data.
//!
//! `render_dump` prints every function line by line as
//! `total(self/child): source`, in seconds. `generate_text_summary` prints
//! the hot-line table used by `bprof replay --summary`.

use super::schema::{HotLine, ReportData};
use crate::engine::Degradation;
use crate::utils::config::NANOS_PER_SEC;
use std::fmt::Write;

fn secs(ns: u64) -> f64 {
    ns as f64 / NANOS_PER_SEC
}

fn degradation_label(d: Degradation) -> &'static str {
    match d {
        Degradation::SourceUnavailable => "source unavailable",
        Degradation::LineOutOfRange => "lines out of range",
        Degradation::MalformedEvents => "malformed events",
    }
}

/// Render the full per-line dump
///
/// **Public** - used by `bprof replay --dump`
pub fn render_dump(report: &ReportData) -> String {
    let mut out = String::new();

    for function in &report.functions {
        let _ = write!(
            out,
            "Name: {}, {} ({} calls)",
            function.name,
            secs(function.overhead_ns),
            function.calls
        );
        if function.is_degraded() {
            let reasons: Vec<&str> = function.degraded.iter().map(|d| degradation_label(*d)).collect();
            let _ = write!(out, " [degraded: {}]", reasons.join(", "));
        }
        out.push('\n');

        for line in &function.lines {
            let _ = writeln!(
                out,
                "{}({}/{}): {}",
                secs(line.total_ns()),
                secs(line.self_ns),
                secs(line.child_ns),
                line.source.trim_end_matches(&['\r', '\n'][..])
            );
        }
    }

    for native in &report.natives {
        let _ = writeln!(
            out,
            "Name: {}, {} ({} calls)",
            native.name,
            secs(native.self_ns),
            native.calls
        );
    }

    if report.malformed_events > 0 {
        let _ = writeln!(out, "Malformed events ignored: {}", report.malformed_events);
    }

    out
}

/// Render the hot-line table
///
/// **Public** - used by `bprof replay --summary`
pub fn generate_text_summary(hot_lines: &[HotLine], max_lines: usize) -> String {
    let mut lines = Vec::new();

    lines.push("  HOT LINES (by self time)".to_string());
    lines.push("  ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┳━━━━━━━━━━━━━━┳━━━━━━━━━━━━━━┳━━━━━━━━━┓".to_string());
    lines.push(format!(
        "  ┃ {:<42} ┃ {:^12} ┃ {:^12} ┃ {:^7} ┃",
        "Function:line", "SELF (s)", "CHILD (s)", "%"
    ));
    lines.push("  ┣━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━╋━━━━━━━━━━━━━━╋━━━━━━━━━┫".to_string());

    for hot in hot_lines.iter().take(max_lines) {
        let location = format!("{}:{}", hot.function, hot.line_number);

        // Keep the tail, it carries the line number
        let display = if location.chars().count() > 42 {
            let tail: String = location
                .chars()
                .rev()
                .take(39)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("...{}", tail)
        } else {
            location
        };

        lines.push(format!(
            "  ┃ {:<42} ┃ {:>12.6} ┃ {:>12.6} ┃ {:>6.1}% ┃",
            display,
            secs(hot.self_ns),
            secs(hot.child_ns),
            hot.percentage
        ));
    }

    lines.push("  ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┻━━━━━━━━━━━━━━┻━━━━━━━━━━━━━━┻━━━━━━━━━┛".to_string());

    if hot_lines.len() > max_lines {
        lines.push(String::new());
        lines.push(format!(
            "   (Showing top {} of {} hot lines)",
            max_lines,
            hot_lines.len()
        ));
    }

    lines.join("\n")
}
