//! The attribution engine.
//!
//! This module turns a stream of trace events into:
//! - Per-line self and child time for every function
//! - Per-function call/return overhead
//! - Total time spent inside each native callable

pub mod clock;
pub mod dispatcher;
pub mod event;
pub mod registry;
pub mod source;
pub mod stack;

// Re-export main types
pub use clock::{Clock, ClockGate, ManualClock, MonotonicClock};
pub use dispatcher::Profiler;
pub use event::{Activation, DetachedSource, EventKind, EventSource, FunctionId};
pub use registry::{Degradation, FunctionAggregate, FunctionRegistry, NativeAggregate, NativeRegistry};
pub use source::{InMemorySource, SourceLines, SourceProvider};
pub use stack::{CallStack, CurrentLine, FrameRecord, LineBucket};
