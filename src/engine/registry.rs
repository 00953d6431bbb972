//! Cumulative per-function and per-native-call statistics.
//!
//! Functions and native callables live in separate registries: a function
//! record is line addressable, a native record is a single opaque total.
//! Both keep insertion order so snapshots are deterministic.

use super::event::FunctionId;
use super::source::{SourceLines, SourceProvider};
use super::stack::FrameRecord;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

/// Why a function's line attribution is incomplete
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Degradation {
    /// Source retrieval failed; all line time collapsed into overhead
    SourceUnavailable,
    /// Some line events fell outside the known body
    LineOutOfRange,
    /// An activation received events that did not fit the stack
    MalformedEvents,
}

/// Cumulative statistics for one function body
#[derive(Debug, Clone)]
pub struct FunctionAggregate {
    pub id: FunctionId,
    pub name: String,
    pub starting_line: u32,
    pub source_lines: Vec<String>,
    pub line_self: Vec<Duration>,
    pub line_child: Vec<Duration>,
    pub overhead_total: Duration,
    pub collapsed_self_total: Duration,
    pub collapsed_child_total: Duration,
    pub calls: u64,
    pub degraded: BTreeSet<Degradation>,
}

impl FunctionAggregate {
    fn new(id: FunctionId, name: String, source: SourceLines) -> Self {
        let n_lines = source.lines.len();
        Self {
            id,
            name,
            starting_line: source.starting_line,
            source_lines: source.lines,
            line_self: vec![Duration::ZERO; n_lines],
            line_child: vec![Duration::ZERO; n_lines],
            overhead_total: Duration::ZERO,
            collapsed_self_total: Duration::ZERO,
            collapsed_child_total: Duration::ZERO,
            calls: 0,
            degraded: BTreeSet::new(),
        }
    }

    pub fn n_lines(&self) -> usize {
        self.source_lines.len()
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    /// Fold one finished activation into the totals
    fn absorb(&mut self, frame: &FrameRecord) {
        self.overhead_total += frame.overhead();
        self.collapsed_self_total += frame.collapsed_self();
        self.collapsed_child_total += frame.collapsed_child();
        self.calls += 1;

        for (i, bucket) in frame.lines().iter().enumerate() {
            if let (Some(s), Some(c)) = (self.line_self.get_mut(i), self.line_child.get_mut(i)) {
                *s += bucket.self_time;
                *c += bucket.child_time;
            }
        }

        if frame.saw_unmapped() && !self.degraded.contains(&Degradation::SourceUnavailable) {
            self.degraded.insert(Degradation::LineOutOfRange);
        }
    }
}

/// Function identity -> aggregate
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    entries: Vec<FunctionAggregate>,
    index: HashMap<FunctionId, usize>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a function, registering it on first sight
    ///
    /// Source is fetched from `source` only when the function is new. A
    /// retrieval failure registers the function with no lines.
    pub fn get_or_create(
        &mut self,
        id: FunctionId,
        name: &str,
        source: &dyn SourceProvider,
    ) -> &FunctionAggregate {
        let slot = match self.index.get(&id).copied() {
            Some(slot) => slot,
            None => {
                let aggregate = match source.source_lines_of(id) {
                    Ok(lines) => {
                        debug!("Registered function {} ({}) with {} lines", name, id, lines.lines.len());
                        FunctionAggregate::new(id, name.to_string(), lines)
                    }
                    Err(e) => {
                        warn!("{}; time for {} will be reported as overhead", e, name);
                        let mut aggregate =
                            FunctionAggregate::new(id, name.to_string(), SourceLines::default());
                        aggregate.degraded.insert(Degradation::SourceUnavailable);
                        aggregate
                    }
                };
                self.entries.push(aggregate);
                self.index.insert(id, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &self.entries[slot]
    }

    pub fn get(&self, id: FunctionId) -> Option<&FunctionAggregate> {
        self.index.get(&id).map(|&slot| &self.entries[slot])
    }

    /// Fold a popped frame into its function's aggregate
    pub fn fold(&mut self, frame: &FrameRecord) {
        match self.index.get(&frame.identity()) {
            Some(&slot) => self.entries[slot].absorb(frame),
            None => warn!("Dropping frame of unregistered function {}", frame.identity()),
        }
    }

    /// Flag a registered function as degraded
    pub fn mark(&mut self, id: FunctionId, reason: Degradation) {
        if let Some(&slot) = self.index.get(&id) {
            self.entries[slot].degraded.insert(reason);
        }
    }

    /// Aggregates in registration order
    pub fn iter(&self) -> impl Iterator<Item = &FunctionAggregate> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

/// Cumulative statistics for one native callable
///
/// There is no instrumentation inside native code, so `self_total` is the
/// whole time spent inside the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeAggregate {
    pub name: String,
    pub self_total: Duration,
    pub calls: u64,
}

/// Handle to a native aggregate, stable for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeSlot(usize);

/// Native display name -> aggregate
#[derive(Debug, Default)]
pub struct NativeRegistry {
    entries: Vec<NativeAggregate>,
    index: HashMap<String, usize>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, name: &str) -> NativeSlot {
        if let Some(&slot) = self.index.get(name) {
            return NativeSlot(slot);
        }
        self.entries.push(NativeAggregate {
            name: name.to_string(),
            self_total: Duration::ZERO,
            calls: 0,
        });
        let slot = self.entries.len() - 1;
        self.index.insert(name.to_string(), slot);
        NativeSlot(slot)
    }

    pub fn record_call(&mut self, slot: NativeSlot) {
        if let Some(entry) = self.entries.get_mut(slot.0) {
            entry.calls += 1;
        }
    }

    pub fn add_elapsed(&mut self, slot: NativeSlot, elapsed: Duration) {
        if let Some(entry) = self.entries.get_mut(slot.0) {
            entry.self_total += elapsed;
        }
    }

    pub fn get(&self, name: &str) -> Option<&NativeAggregate> {
        self.index.get(name).map(|&slot| &self.entries[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &NativeAggregate> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::source::InMemorySource;
    use crate::engine::stack::CallStack;
    use std::cell::Cell;

    struct CountingSource {
        inner: InMemorySource,
        fetches: Cell<usize>,
    }

    impl SourceProvider for CountingSource {
        fn source_lines_of(&self, id: FunctionId) -> Result<SourceLines, crate::utils::SourceError> {
            self.fetches.set(self.fetches.get() + 1);
            self.inner.source_lines_of(id)
        }
    }

    #[test]
    fn test_source_fetched_once_per_identity() {
        let source = CountingSource {
            inner: InMemorySource::new().with_function(FunctionId(1), 1, ["a", "b"]),
            fetches: Cell::new(0),
        };
        let mut registry = FunctionRegistry::new();

        registry.get_or_create(FunctionId(1), "f", &source);
        let aggregate = registry.get_or_create(FunctionId(1), "f", &source);

        assert_eq!(aggregate.n_lines(), 2);
        assert_eq!(source.fetches.get(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_missing_source_registers_degraded() {
        let mut registry = FunctionRegistry::new();
        let aggregate = registry.get_or_create(FunctionId(9), "<lambda>", &InMemorySource::new());

        assert_eq!(aggregate.n_lines(), 0);
        assert!(aggregate.degraded.contains(&Degradation::SourceUnavailable));
    }

    #[test]
    fn test_fold_sums_activations() {
        let source = InMemorySource::new().with_function(FunctionId(1), 10, ["x", "y"]);
        let mut registry = FunctionRegistry::new();
        registry.get_or_create(FunctionId(1), "f", &source);

        let mut stack = CallStack::new();
        for _ in 0..2 {
            stack.push(FunctionId(1), 10, 2);
            let frame = stack.top_mut().unwrap();
            frame.add_overhead(Duration::from_nanos(1));
            frame.set_current_line(11);
            frame.add_line_self(Duration::from_nanos(4));
            let popped = stack.pop().unwrap();
            registry.fold(popped);
        }

        let aggregate = registry.get(FunctionId(1)).unwrap();
        assert_eq!(aggregate.calls, 2);
        assert_eq!(aggregate.overhead_total, Duration::from_nanos(2));
        assert_eq!(aggregate.line_self, vec![Duration::ZERO, Duration::from_nanos(8)]);
        assert!(!aggregate.is_degraded());
    }

    #[test]
    fn test_fold_keeps_collapsed_parts_apart() {
        let source = InMemorySource::new().with_function(FunctionId(1), 10, ["x"]);
        let mut registry = FunctionRegistry::new();
        registry.get_or_create(FunctionId(1), "f", &source);

        let mut stack = CallStack::new();
        stack.push(FunctionId(1), 10, 1);
        let frame = stack.top_mut().unwrap();
        frame.set_current_line(40);
        frame.add_line_self(Duration::from_nanos(5));
        frame.add_line_child(Duration::from_nanos(9));
        registry.fold(stack.pop().unwrap());

        let aggregate = registry.get(FunctionId(1)).unwrap();
        assert_eq!(aggregate.collapsed_self_total, Duration::from_nanos(5));
        assert_eq!(aggregate.collapsed_child_total, Duration::from_nanos(9));
        assert_eq!(aggregate.overhead_total, Duration::from_nanos(14));
        assert!(aggregate.degraded.contains(&Degradation::LineOutOfRange));
    }

    #[test]
    fn test_mark_ignores_unknown_function() {
        let source = InMemorySource::new().with_function(FunctionId(1), 1, ["x"]);
        let mut registry = FunctionRegistry::new();
        registry.get_or_create(FunctionId(1), "f", &source);

        registry.mark(FunctionId(2), Degradation::MalformedEvents);
        assert!(!registry.get(FunctionId(1)).unwrap().is_degraded());

        registry.mark(FunctionId(1), Degradation::MalformedEvents);
        registry.mark(FunctionId(1), Degradation::MalformedEvents);
        let degraded: Vec<_> = registry.get(FunctionId(1)).unwrap().degraded.iter().copied().collect();
        assert_eq!(degraded, vec![Degradation::MalformedEvents]);
    }

    #[test]
    fn test_native_registry_keyed_by_name() {
        let mut registry = NativeRegistry::new();
        let a = registry.get_or_create("len");
        let b = registry.get_or_create("len");
        assert_eq!(a, b);

        registry.record_call(a);
        registry.add_elapsed(a, Duration::from_nanos(3));
        registry.add_elapsed(b, Duration::from_nanos(4));

        let entry = registry.get("len").unwrap();
        assert_eq!(entry.self_total, Duration::from_nanos(7));
        assert_eq!(entry.calls, 1);
    }
}
