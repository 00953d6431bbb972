//! Event intake types shared by the dispatcher and host adapters.
//!
//! A host adapter translates its runtime's trace hook into calls to
//! `Profiler::on_event`, handing over an `Activation` for the frame the
//! event fired in.

use crate::utils::error::SessionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a trace event
///
/// `None` is the state before any session started. `Origin` is the synthetic
/// kind a session starts in; there is no interval to close for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Origin,
    Line,
    Call,
    Return,
    Exception,
    NativeCall,
    NativeReturn,
    NativeException,
    None,
}

impl EventKind {
    pub fn is_native(self) -> bool {
        matches!(
            self,
            EventKind::NativeCall | EventKind::NativeReturn | EventKind::NativeException
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Origin => "origin",
            EventKind::Line => "line",
            EventKind::Call => "call",
            EventKind::Return => "return",
            EventKind::Exception => "exception",
            EventKind::NativeCall => "native_call",
            EventKind::NativeReturn => "native_return",
            EventKind::NativeException => "native_exception",
            EventKind::None => "none",
        };
        f.write_str(name)
    }
}

/// Stable identity of a compiled function body
///
/// Every activation of the same body, recursive ones included, reports the
/// same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionId(pub u64);

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Handle to the frame an event fired in
///
/// **Public** - implemented by host adapters
pub trait Activation {
    fn function_id(&self) -> FunctionId;

    fn function_name(&self) -> &str;

    /// Absolute source line currently executing
    fn line_number(&self) -> u32;

    /// Turn off per-instruction notifications for this frame, if the host
    /// has them
    fn disable_opcode_events(&mut self) {}
}

/// Arms and disarms the host's event delivery
///
/// **Public** - implemented by host adapters
pub trait EventSource {
    fn arm(&mut self) -> Result<(), SessionError>;

    fn disarm(&mut self);
}

/// Event source for hosts that deliver events without an arming step
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedSource;

impl EventSource for DetachedSource {
    fn arm(&mut self) -> Result<(), SessionError> {
        Ok(())
    }

    fn disarm(&mut self) {}
}
