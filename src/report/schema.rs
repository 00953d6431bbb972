//! Report and profile schema definitions.
//!
//! `ReportData` is the read-only projection of the registries. `Profile`
//! wraps it into the versioned JSON document we write to disk.

use crate::engine::{Degradation, FunctionId, FunctionRegistry, NativeRegistry};
use crate::utils::config::SCHEMA_VERSION;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Snapshot of one session's registries
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportData {
    /// Functions in first-call order
    pub functions: Vec<FunctionReport>,

    /// Native callables in first-call order
    pub natives: Vec<NativeReport>,

    /// Events that did not fit the stack (line/return with no frame, native
    /// return with no pending native call)
    #[serde(default)]
    pub malformed_events: u64,
}

/// Cumulative statistics for one function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionReport {
    pub id: FunctionId,
    pub name: String,
    pub starting_line: u32,

    /// Activations folded into this record
    pub calls: u64,

    /// Call/return transition time, collapsed line time included
    pub overhead_ns: u64,

    /// Line time that could not be placed on a line
    #[serde(default)]
    pub collapsed_ns: u64,

    /// Part of `collapsed_ns` spent in callees and native calls
    #[serde(default)]
    pub collapsed_child_ns: u64,

    pub lines: Vec<LineReport>,

    /// Empty unless attribution for this function is incomplete
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<Degradation>,
}

/// Self/child time of one source line, summed over all activations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineReport {
    pub line_number: u32,
    pub source: String,
    pub self_ns: u64,
    pub child_ns: u64,
}

/// Total time spent inside one native callable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeReport {
    pub name: String,
    pub self_ns: u64,
    pub calls: u64,
}

/// Saturating nanosecond count
pub fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

impl LineReport {
    pub fn total_ns(&self) -> u64 {
        self.self_ns.saturating_add(self.child_ns)
    }
}

impl FunctionReport {
    pub fn self_ns(&self) -> u64 {
        self.lines.iter().map(|l| l.self_ns).sum()
    }

    pub fn child_ns(&self) -> u64 {
        self.lines.iter().map(|l| l.child_ns).sum()
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    /// Line report for an absolute line number
    pub fn line(&self, line_number: u32) -> Option<&LineReport> {
        let index = line_number.checked_sub(self.starting_line)? as usize;
        self.lines.get(index)
    }
}

impl ReportData {
    /// Build the report from live registries
    ///
    /// **Public** - called by `Profiler::snapshot`
    pub fn from_registries(
        functions: &FunctionRegistry,
        natives: &NativeRegistry,
        malformed_events: u64,
    ) -> Self {
        let functions = functions
            .iter()
            .map(|f| FunctionReport {
                id: f.id,
                name: f.name.clone(),
                starting_line: f.starting_line,
                calls: f.calls,
                overhead_ns: nanos(f.overhead_total),
                collapsed_ns: nanos(f.collapsed_self_total + f.collapsed_child_total),
                collapsed_child_ns: nanos(f.collapsed_child_total),
                lines: f
                    .source_lines
                    .iter()
                    .zip(f.line_self.iter().zip(f.line_child.iter()))
                    .enumerate()
                    .map(|(i, (source, (s, c)))| LineReport {
                        line_number: f.starting_line.saturating_add(i as u32),
                        source: source.clone(),
                        self_ns: nanos(*s),
                        child_ns: nanos(*c),
                    })
                    .collect(),
                degraded: f.degraded.iter().copied().collect(),
            })
            .collect();

        let natives = natives
            .iter()
            .map(|n| NativeReport {
                name: n.name.clone(),
                self_ns: nanos(n.self_total),
                calls: n.calls,
            })
            .collect();

        Self {
            functions,
            natives,
            malformed_events,
        }
    }

    pub fn function(&self, name: &str) -> Option<&FunctionReport> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn native(&self, name: &str) -> Option<&NativeReport> {
        self.natives.iter().find(|n| n.name == name)
    }

    /// Exclusive time: line self time, transition overhead and time inside
    /// native calls. Collapsed child time is left out since the callee
    /// already counts it.
    pub fn total_exclusive_ns(&self) -> u64 {
        let functions: u64 = self
            .functions
            .iter()
            .map(|f| f.self_ns() + f.overhead_ns.saturating_sub(f.collapsed_child_ns))
            .sum();
        let natives: u64 = self.natives.iter().map(|n| n.self_ns).sum();
        functions + natives
    }
}

/// Top-level profile structure written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Schema version for compatibility checking
    pub version: String,

    /// Where the events came from (trace file, host name)
    pub source: String,

    /// Total exclusive time measured
    pub total_time_ns: u64,

    /// Full per-function breakdown
    pub report: ReportData,

    /// Lines ranked by self time
    pub hot_lines: Vec<HotLine>,

    /// Timestamp when profile was generated
    pub generated_at: String,
}

/// A hot line in the execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotLine {
    pub function: String,
    pub line_number: u32,
    pub source: String,
    pub self_ns: u64,
    pub child_ns: u64,
    pub total_ns: u64,

    /// Share of total exclusive time spent on this line's own instructions
    pub percentage: f64,
}

impl Profile {
    /// Wrap report data into a versioned profile document
    ///
    /// **Public** - used by the replay command
    pub fn new(source: impl Into<String>, report: ReportData, hot_lines: Vec<HotLine>) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            source: source.into(),
            total_time_ns: report.total_exclusive_ns(),
            report,
            hot_lines,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
