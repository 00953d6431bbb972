//! Clock gate: turns raw clock readings into attributable intervals.
//!
//! The engine reads the clock twice per event: once the instant control
//! re-enters the profiler (`begin_event`) and once after all bookkeeping for
//! the event is finished (`resume`). Only the gap between a `resume` and the
//! following `begin_event` is program time.

use crate::utils::error::ClockError;
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// A monotonic time source
///
/// **Public** - implemented by real and simulated clocks
pub trait Clock {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Result<Duration, ClockError>;
}

/// Wall clock backed by `std::time::Instant`
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Result<Duration, ClockError> {
        Ok(self.origin.elapsed())
    }
}

/// Settable clock shared between the profiler and whoever drives it
///
/// **Public** - used by the trace replay host and by tests
///
/// Clones share the same underlying time, so a driver can keep one handle
/// and hand another to the profiler.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump to an absolute time. Earlier values are ignored.
    pub fn set(&self, at: Duration) {
        if at > self.now.get() {
            self.now.set(at);
        }
    }

    pub fn set_nanos(&self, nanos: u64) {
        self.set(Duration::from_nanos(nanos));
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn current(&self) -> Duration {
        self.now.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Result<Duration, ClockError> {
        Ok(self.now.get())
    }
}

/// Tracks the resume mark and computes attributable intervals
///
/// **Public** - owned by the profiler
#[derive(Debug)]
pub struct ClockGate<C> {
    clock: C,
    resume_mark: Duration,
}

impl<C: Clock> ClockGate<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            resume_mark: Duration::ZERO,
        }
    }

    /// Set the resume mark at session start
    pub fn reset(&mut self) -> Result<(), ClockError> {
        self.resume_mark = self.clock.now()?;
        Ok(())
    }

    /// Capture the start of the current event and return the program time
    /// elapsed since the previous event finished processing
    pub fn begin_event(&mut self) -> Result<Duration, ClockError> {
        let start = self.clock.now()?;
        Ok(start.saturating_sub(self.resume_mark))
    }

    /// Capture the moment control goes back to the program
    pub fn resume(&mut self) -> Result<(), ClockError> {
        self.resume_mark = self.clock.now()?;
        Ok(())
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
