//! bprof
//!
//! Deterministic line profiler core: turns a stream of trace events
//! (call, line, return, native call/return) into per-line self and child
//! time, excluding the profiler's own bookkeeping from every measurement.
//!
//! ## Getting Started
//!
//! A host adapter owns a [`engine::Profiler`] and forwards every trace event
//! to [`engine::Profiler::on_event`]:
//!
//! ```ignore
//! let mut profiler = Profiler::new(MonotonicClock::new(), my_source_provider);
//! profiler.start()?;
//! // host delivers events...
//! profiler.stop()?;
//! let report = profiler.snapshot()?;
//! ```
//!
//! The `bprof` CLI replays recorded traces through the same intake.

pub mod commands;
pub mod engine;
pub mod output;
pub mod report;
pub mod trace;
pub mod utils;
