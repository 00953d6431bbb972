//! Recorded trace schema.
//!
//! A recorded trace is what a host adapter would have delivered live: the
//! functions it saw (with their source) and the timestamped event stream.

use serde::{Deserialize, Serialize};

/// Raw trace document as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedTrace {
    /// Functions referenced by the events
    #[serde(default)]
    pub functions: Vec<TraceFunction>,

    /// Events in delivery order
    pub events: Vec<TraceEvent>,

    /// Time at which profiling was stopped (defaults to the last event)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_t: Option<u64>,
}

/// One function body seen by the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceFunction {
    pub id: u64,

    pub name: String,

    /// Absolute line number of the first source line
    #[serde(default = "default_starting_line", alias = "firstLine", alias = "first_line")]
    pub starting_line: u32,

    /// Source lines; `null` means the host could not retrieve them
    #[serde(default)]
    pub source: Option<Vec<String>>,
}

fn default_starting_line() -> u32 {
    1
}

/// One recorded event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Nanosecond timestamp
    #[serde(alias = "ts", alias = "time")]
    pub t: u64,

    /// Event kind name (`call`, `line`, `native_call`, ...)
    #[serde(alias = "event")]
    pub kind: String,

    /// Function the event fired in
    #[serde(default, alias = "code")]
    pub function: Option<u64>,

    /// Line number for line events
    #[serde(default, alias = "lineno")]
    pub line: Option<u32>,

    /// Native callable name for native events
    #[serde(default)]
    pub arg: Option<String>,
}
