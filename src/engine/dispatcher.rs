//! Event dispatcher: the profiler's state machine.
//!
//! Every event first closes the interval opened by the previous event,
//! charging it to the bucket the *previous* kind implies, and only then
//! applies its own structural effect (push a frame, move the current line,
//! register a native call). The clock is read once on entry and once after
//! all processing, so bookkeeping time never lands in a bucket.

use super::clock::{Clock, ClockGate};
use super::event::{Activation, DetachedSource, EventKind, EventSource};
use super::registry::{Degradation, FunctionRegistry, NativeRegistry, NativeSlot};
use super::source::SourceProvider;
use super::stack::CallStack;
use crate::report::ReportData;
use crate::utils::error::{ClockError, SessionError};
use log::{debug, error, info, trace};
use std::fmt::{self, Write as _};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Idle,
    Running,
    Aborted(String),
}

/// Mutable state of one measurement session
#[derive(Debug)]
struct Session {
    stack: CallStack,
    functions: FunctionRegistry,
    natives: NativeRegistry,
    /// Native calls entered but not yet returned, innermost last
    pending_natives: Vec<NativeSlot>,
    last_kind: EventKind,
    malformed_events: u64,
    events: u64,
    name_buf: String,
}

impl Session {
    fn new() -> Self {
        Self {
            stack: CallStack::new(),
            functions: FunctionRegistry::new(),
            natives: NativeRegistry::new(),
            pending_natives: Vec::new(),
            last_kind: EventKind::None,
            malformed_events: 0,
            events: 0,
            name_buf: String::new(),
        }
    }

    fn reset(&mut self) {
        self.stack.clear();
        self.functions.clear();
        self.natives.clear();
        self.pending_natives.clear();
        self.last_kind = EventKind::Origin;
        self.malformed_events = 0;
        self.events = 0;
    }

    /// Charge the interval that just ended according to the previous kind
    fn close_interval(&mut self, elapsed: Duration) {
        match self.last_kind {
            EventKind::Origin | EventKind::None => {}
            EventKind::Line => {
                if let Some(top) = self.stack.top_mut() {
                    top.add_line_self(elapsed);
                }
            }
            EventKind::Call | EventKind::NativeReturn => {
                if let Some(top) = self.stack.top_mut() {
                    top.add_overhead(elapsed);
                }
            }
            EventKind::Return => {
                if let Some(top) = self.stack.top_mut() {
                    top.add_overhead(elapsed);
                }
                self.pop_frame();
            }
            EventKind::NativeCall => {
                if let Some(&slot) = self.pending_natives.last() {
                    self.natives.add_elapsed(slot, elapsed);
                }
                if let Some(top) = self.stack.top_mut() {
                    top.add_line_child(elapsed);
                }
            }
            // control flow after an exception is unreliable for line attribution
            EventKind::Exception | EventKind::NativeException => {}
        }
    }

    /// Pop the top frame, fold it into its aggregate and charge its total
    /// to the caller's current line
    fn pop_frame(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let total = frame.total_time();
        self.functions.fold(frame);

        if let Some(caller) = self.stack.top_mut() {
            caller.add_line_child(total);
        }
    }

    fn apply(
        &mut self,
        kind: EventKind,
        activation: &mut dyn Activation,
        payload: Option<&dyn fmt::Display>,
        source: &dyn SourceProvider,
    ) {
        match kind {
            EventKind::Call => {
                let id = activation.function_id();
                let aggregate = self
                    .functions
                    .get_or_create(id, activation.function_name(), source);
                let (starting_line, n_lines) = (aggregate.starting_line, aggregate.n_lines());
                activation.disable_opcode_events();
                self.stack.push(id, starting_line, n_lines);
            }
            EventKind::Line => match self.stack.top_mut() {
                Some(top) => {
                    top.set_current_line(activation.line_number());
                }
                None => self.malformed(kind),
            },
            EventKind::Return => match self.stack.top().map(|top| top.identity()) {
                // the top frame is still popped on the next event
                Some(id) if id != activation.function_id() => self.malformed(kind),
                Some(_) => {}
                None => self.malformed(kind),
            },
            EventKind::NativeCall => {
                self.name_buf.clear();
                let written = match payload {
                    Some(callable) => write!(self.name_buf, "{}", callable),
                    None => write!(self.name_buf, "{}", activation.function_name()),
                };
                if written.is_err() {
                    self.name_buf.clear();
                    self.name_buf.push_str("<unprintable>");
                }
                let slot = self.natives.get_or_create(&self.name_buf);
                self.natives.record_call(slot);
                self.pending_natives.push(slot);
            }
            EventKind::NativeReturn | EventKind::NativeException => {
                if self.pending_natives.pop().is_none() {
                    self.malformed(kind);
                }
            }
            EventKind::Exception | EventKind::Origin | EventKind::None => {}
        }
    }

    /// Count an event that does not fit the stack and flag the function
    /// executing when it arrived
    fn malformed(&mut self, kind: EventKind) {
        self.malformed_events += 1;
        if let Some(top) = self.stack.top() {
            let id = top.identity();
            self.functions.mark(id, Degradation::MalformedEvents);
        }
        debug!(
            "Ignoring {} event at depth {} (malformed sequence, {} so far)",
            kind,
            self.stack.depth(),
            self.malformed_events
        );
    }

    /// Fold every still-open frame, innermost first
    fn unwind(&mut self) {
        if !self.stack.is_empty() {
            debug!("Unwinding {} open frames", self.stack.depth());
        }
        while !self.stack.is_empty() {
            self.pop_frame();
        }
        self.pending_natives.clear();
    }
}

/// Deterministic line profiler
///
/// **Public** - main entry point of the engine
///
/// The profiler owns one measurement session at a time. A host adapter calls
/// [`Profiler::on_event`] once per trace event between [`Profiler::start`]
/// and [`Profiler::stop`]; [`Profiler::snapshot`] projects the registries
/// into report data.
///
/// Lifecycle policy: starting a running profiler fails with
/// `AlreadyRunning`, stopping an idle one fails with `NotRunning`, events
/// delivered while not running are ignored.
pub struct Profiler<C, S> {
    gate: ClockGate<C>,
    source: S,
    event_source: Box<dyn EventSource>,
    state: State,
    session: Session,
}

impl<C: Clock, S: SourceProvider> Profiler<C, S> {
    pub fn new(clock: C, source: S) -> Self {
        Self {
            gate: ClockGate::new(clock),
            source,
            event_source: Box::new(DetachedSource),
            state: State::Idle,
            session: Session::new(),
        }
    }

    /// Use a host event source that is armed on start and disarmed on stop
    pub fn with_event_source(mut self, event_source: Box<dyn EventSource>) -> Self {
        self.event_source = event_source;
        self
    }

    /// Reset all session state and arm the event source
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state == State::Running {
            return Err(SessionError::AlreadyRunning);
        }

        self.session.reset();
        if let Err(e) = self.gate.reset() {
            return Err(self.abort(e));
        }
        self.event_source.arm()?;
        self.state = State::Running;

        info!("Profiling started");
        Ok(())
    }

    /// Handle one trace event
    ///
    /// `payload` is the native callable for `NativeCall` events; its
    /// `Display` output names the native aggregate.
    pub fn on_event(
        &mut self,
        kind: EventKind,
        activation: &mut dyn Activation,
        payload: Option<&dyn fmt::Display>,
    ) -> Result<(), SessionError> {
        if self.state != State::Running {
            return Ok(());
        }

        let elapsed = match self.gate.begin_event() {
            Ok(elapsed) => elapsed,
            Err(e) => return Err(self.abort(e)),
        };

        self.session.close_interval(elapsed);
        self.session.apply(kind, activation, payload, &self.source);
        self.session.events += 1;
        trace!("{} event, depth {}", kind, self.session.stack.depth());

        if let Err(e) = self.gate.resume() {
            return Err(self.abort(e));
        }
        self.session.last_kind = kind;
        Ok(())
    }

    /// Close the pending interval, fold open frames and disarm the event
    /// source. Registries stay available for [`Profiler::snapshot`].
    pub fn stop(&mut self) -> Result<(), SessionError> {
        match &self.state {
            State::Idle => return Err(SessionError::NotRunning),
            State::Aborted(reason) => return Err(SessionError::Aborted(reason.clone())),
            State::Running => {}
        }

        let elapsed = match self.gate.begin_event() {
            Ok(elapsed) => elapsed,
            Err(e) => return Err(self.abort(e)),
        };
        self.session.close_interval(elapsed);
        self.session.unwind();
        self.session.last_kind = EventKind::None;

        self.event_source.disarm();
        self.state = State::Idle;

        info!(
            "Profiling stopped: {} events, {} functions, {} native callables, {} malformed events",
            self.session.events,
            self.session.functions.len(),
            self.session.natives.len(),
            self.session.malformed_events
        );
        Ok(())
    }

    /// Project the registries into report data without touching them
    pub fn snapshot(&self) -> Result<ReportData, SessionError> {
        if let State::Aborted(reason) = &self.state {
            return Err(SessionError::Aborted(reason.clone()));
        }
        Ok(ReportData::from_registries(
            &self.session.functions,
            &self.session.natives,
            self.session.malformed_events,
        ))
    }

    fn abort(&mut self, e: ClockError) -> SessionError {
        error!("Aborting profiling session: {}", e);
        self.event_source.disarm();
        self.state = State::Aborted(e.to_string());
        SessionError::Clock(e)
    }

    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.state, State::Aborted(_))
    }

    pub fn last_kind(&self) -> EventKind {
        self.session.last_kind
    }

    pub fn depth(&self) -> usize {
        self.session.stack.depth()
    }

    /// Frame slots allocated so far (deepest nesting seen this session)
    pub fn pooled_frames(&self) -> usize {
        self.session.stack.capacity()
    }

    pub fn events_seen(&self) -> u64 {
        self.session.events
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.session.functions
    }

    pub fn natives(&self) -> &NativeRegistry {
        &self.session.natives
    }

    pub fn clock(&self) -> &C {
        self.gate.clock()
    }
}
