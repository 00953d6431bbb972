//! Recorded traces and the replay host adapter.
//!
//! This module handles:
//! - The on-disk recorded trace schema
//! - Parsing and validating traces
//! - Replaying them through the profiler

pub mod replay;
pub mod schema;

// Re-export main types
pub use replay::{load_trace, parse_event_kind, parse_trace, replay_trace, ParsedEvent, ParsedTrace};
pub use schema::{RecordedTrace, TraceEvent, TraceFunction};
