//! Recorded trace parser and replay host.
//!
//! Parses a recorded trace into validated events and feeds them through
//! `Profiler::on_event` with a manual clock set to each event's timestamp,
//! exactly as a live host would deliver them.

use super::schema::{RecordedTrace, TraceEvent, TraceFunction};
use crate::engine::{
    Activation, EventKind, FunctionId, InMemorySource, ManualClock, Profiler, SourceLines,
};
use crate::report::ReportData;
use crate::utils::config::{
    CALL_KIND_NAMES, EXCEPTION_KIND_NAMES, LINE_KIND_NAMES, NATIVE_CALL_KIND_NAMES,
    NATIVE_EXCEPTION_KIND_NAMES, NATIVE_RETURN_KIND_NAMES, RETURN_KIND_NAMES,
};
use crate::utils::error::{ParseError, SessionError};
use log::{debug, info};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Name used for native calls made outside any traced function
pub const MODULE_SCOPE_NAME: &str = "<module>";

/// A validated event ready for replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEvent {
    pub t: u64,
    pub kind: EventKind,
    pub function: Option<FunctionId>,
    pub line: u32,
    pub arg: Option<String>,
}

/// Parsed trace data (internal representation)
#[derive(Debug, Clone)]
pub struct ParsedTrace {
    pub functions: Vec<TraceFunction>,
    pub events: Vec<ParsedEvent>,
    pub end_t: u64,
    names: HashMap<u64, usize>,
}

impl ParsedTrace {
    pub fn start_t(&self) -> u64 {
        self.events.first().map(|e| e.t).unwrap_or(0)
    }

    /// Wall time from the first event to the stop
    pub fn duration_ns(&self) -> u64 {
        self.end_t.saturating_sub(self.start_t())
    }

    pub fn function_name(&self, id: FunctionId) -> Option<&str> {
        self.names
            .get(&id.0)
            .map(|&i| self.functions[i].name.as_str())
    }

    /// Source provider holding every function that shipped its source
    pub fn source_provider(&self) -> InMemorySource {
        let mut source = InMemorySource::new();
        for function in &self.functions {
            if let Some(lines) = &function.source {
                source.insert(
                    FunctionId(function.id),
                    SourceLines::new(lines.clone(), function.starting_line),
                );
            }
        }
        source
    }
}

/// Map an event kind name to an `EventKind`
///
/// **Public** - accepts the spellings listed in `utils::config`
pub fn parse_event_kind(name: &str) -> Option<EventKind> {
    let tables: [(&[&str], EventKind); 7] = [
        (CALL_KIND_NAMES, EventKind::Call),
        (LINE_KIND_NAMES, EventKind::Line),
        (RETURN_KIND_NAMES, EventKind::Return),
        (EXCEPTION_KIND_NAMES, EventKind::Exception),
        (NATIVE_CALL_KIND_NAMES, EventKind::NativeCall),
        (NATIVE_RETURN_KIND_NAMES, EventKind::NativeReturn),
        (NATIVE_EXCEPTION_KIND_NAMES, EventKind::NativeException),
    ];
    tables
        .iter()
        .find(|(names, _)| names.contains(&name))
        .map(|(_, kind)| *kind)
}

/// Parse raw trace JSON
///
/// **Public** - main entry point for parsing
///
/// # Errors
/// * `ParseError::JsonError` - Document does not match the trace schema
/// * `ParseError::InvalidFormat` - Unknown event kind, missing line number,
///   missing function on a frame event, duplicate function id
/// * `ParseError::UnknownFunction` - Event references an undeclared function
/// * `ParseError::NonMonotonic` - Timestamps go backwards
pub fn parse_trace(raw_trace: &serde_json::Value) -> Result<ParsedTrace, ParseError> {
    if !raw_trace.is_object() {
        return Err(ParseError::InvalidFormat(
            "Trace must be a JSON object".to_string(),
        ));
    }

    let recorded = RecordedTrace::deserialize(raw_trace)?;
    validate_trace(recorded)
}

/// Check a deserialized trace and resolve its event kinds
fn validate_trace(recorded: RecordedTrace) -> Result<ParsedTrace, ParseError> {
    let mut names = HashMap::new();
    for (i, function) in recorded.functions.iter().enumerate() {
        if names.insert(function.id, i).is_some() {
            return Err(ParseError::InvalidFormat(format!(
                "Function id {} declared twice",
                function.id
            )));
        }
    }

    let mut events = Vec::with_capacity(recorded.events.len());
    let mut previous = 0;
    for (index, event) in recorded.events.iter().enumerate() {
        let parsed = parse_event(index, event, &names)?;
        if parsed.t < previous {
            return Err(ParseError::NonMonotonic {
                index,
                t: parsed.t,
                previous,
            });
        }
        previous = parsed.t;
        events.push(parsed);
    }

    let end_t = recorded.end_t.unwrap_or(previous).max(previous);

    debug!(
        "Parsed {} functions and {} events",
        recorded.functions.len(),
        events.len()
    );

    Ok(ParsedTrace {
        functions: recorded.functions,
        events,
        end_t,
        names,
    })
}

fn parse_event(
    index: usize,
    event: &TraceEvent,
    names: &HashMap<u64, usize>,
) -> Result<ParsedEvent, ParseError> {
    let kind = parse_event_kind(&event.kind).ok_or_else(|| {
        ParseError::InvalidFormat(format!("Event {} has unknown kind '{}'", index, event.kind))
    })?;

    if let Some(id) = event.function {
        if !names.contains_key(&id) {
            return Err(ParseError::UnknownFunction { index, id });
        }
    } else if !kind.is_native() {
        return Err(ParseError::InvalidFormat(format!(
            "Event {} ({}) has no function",
            index, kind
        )));
    }

    let line = match (kind, event.line) {
        (EventKind::Line, None) => {
            return Err(ParseError::InvalidFormat(format!(
                "Line event {} has no line number",
                index
            )))
        }
        (_, line) => line.unwrap_or(0),
    };

    Ok(ParsedEvent {
        t: event.t,
        kind,
        function: event.function.map(FunctionId),
        line,
        arg: event.arg.clone(),
    })
}

/// Read and parse a trace file
pub fn load_trace(path: impl AsRef<Path>) -> Result<ParsedTrace, ParseError> {
    let path = path.as_ref();
    debug!("Reading trace from: {}", path.display());

    let reader = BufReader::new(File::open(path)?);
    let recorded: RecordedTrace = serde_json::from_reader(reader)?;
    validate_trace(recorded)
}

/// Frame handle built from a recorded event
struct ReplayActivation<'a> {
    id: FunctionId,
    name: &'a str,
    line: u32,
}

impl Activation for ReplayActivation<'_> {
    fn function_id(&self) -> FunctionId {
        self.id
    }

    fn function_name(&self) -> &str {
        self.name
    }

    fn line_number(&self) -> u32 {
        self.line
    }
}

/// Replay a parsed trace through a fresh profiler
///
/// **Public** - used by the replay command
///
/// # Returns
/// The snapshot taken after `stop()`
pub fn replay_trace(trace: &ParsedTrace) -> Result<ReportData, SessionError> {
    let clock = ManualClock::new();
    let mut profiler = Profiler::new(clock.clone(), trace.source_provider());

    clock.set_nanos(trace.start_t());
    profiler.start()?;

    info!("Replaying {} events", trace.events.len());

    for event in &trace.events {
        clock.set_nanos(event.t);

        let id = event.function.unwrap_or(FunctionId(0));
        let mut activation = ReplayActivation {
            id,
            name: trace.function_name(id).unwrap_or(MODULE_SCOPE_NAME),
            line: event.line,
        };
        let payload = event.arg.as_ref().map(|arg| arg as &dyn fmt::Display);

        profiler.on_event(event.kind, &mut activation, payload)?;
    }

    clock.set_nanos(trace.end_t);
    profiler.stop()?;
    profiler.snapshot()
}
