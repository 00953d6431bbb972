//! Per-activation frame records and the call stack that holds them.
//!
//! Popped slots stay allocated and are reset in place by the next push at
//! the same depth, so once the deepest nesting has been seen call/return
//! does not allocate.

use super::event::FunctionId;
use std::time::Duration;

/// Self/child time of one source line inside one activation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineBucket {
    pub self_time: Duration,
    pub child_time: Duration,
}

impl LineBucket {
    pub fn total(&self) -> Duration {
        self.self_time + self.child_time
    }
}

/// Which line of a frame is executing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentLine {
    /// No line event seen yet for this frame
    Unset,
    /// Zero-based index into the frame's lines
    Index(usize),
    /// Reported line falls outside the known function body
    Unmapped,
}

/// One activation of a function
#[derive(Debug, Clone)]
pub struct FrameRecord {
    identity: FunctionId,
    starting_line: u32,
    current: CurrentLine,
    lines: Vec<LineBucket>,
    overhead: Duration,
    /// Unplaceable line time: own instructions and calls made from the line
    collapsed_self: Duration,
    collapsed_child: Duration,
    saw_unmapped: bool,
}

impl FrameRecord {
    pub fn new(identity: FunctionId, starting_line: u32, n_lines: usize) -> Self {
        Self {
            identity,
            starting_line,
            current: CurrentLine::Unset,
            lines: vec![LineBucket::default(); n_lines],
            overhead: Duration::ZERO,
            collapsed_self: Duration::ZERO,
            collapsed_child: Duration::ZERO,
            saw_unmapped: false,
        }
    }

    /// Reuse this slot for a new activation, keeping the line allocation
    fn reset(&mut self, identity: FunctionId, starting_line: u32, n_lines: usize) {
        self.identity = identity;
        self.starting_line = starting_line;
        self.current = CurrentLine::Unset;
        self.lines.clear();
        self.lines.resize(n_lines, LineBucket::default());
        self.overhead = Duration::ZERO;
        self.collapsed_self = Duration::ZERO;
        self.collapsed_child = Duration::ZERO;
        self.saw_unmapped = false;
    }

    pub fn identity(&self) -> FunctionId {
        self.identity
    }

    pub fn starting_line(&self) -> u32 {
        self.starting_line
    }

    pub fn current(&self) -> CurrentLine {
        self.current
    }

    pub fn lines(&self) -> &[LineBucket] {
        &self.lines
    }

    /// Call/return transition time plus collapsed line time
    pub fn overhead(&self) -> Duration {
        self.overhead + self.collapsed()
    }

    pub fn collapsed(&self) -> Duration {
        self.collapsed_self + self.collapsed_child
    }

    pub fn collapsed_self(&self) -> Duration {
        self.collapsed_self
    }

    /// Collapsed time already measured in a callee or native call
    pub fn collapsed_child(&self) -> Duration {
        self.collapsed_child
    }

    pub fn saw_unmapped(&self) -> bool {
        self.saw_unmapped
    }

    /// Point the frame at an absolute source line
    pub fn set_current_line(&mut self, line_number: u32) -> CurrentLine {
        self.current = match line_number.checked_sub(self.starting_line) {
            Some(offset) if (offset as usize) < self.lines.len() => {
                CurrentLine::Index(offset as usize)
            }
            _ => {
                self.saw_unmapped = true;
                CurrentLine::Unmapped
            }
        };
        self.current
    }

    pub fn add_overhead(&mut self, elapsed: Duration) {
        self.overhead += elapsed;
    }

    /// Charge time to the executing line's own instructions.
    /// A no-op until the first line event.
    pub fn add_line_self(&mut self, elapsed: Duration) {
        match self.current {
            CurrentLine::Index(i) => self.lines[i].self_time += elapsed,
            CurrentLine::Unmapped => self.collapsed_self += elapsed,
            CurrentLine::Unset => {}
        }
    }

    /// Charge time spent in a call made from the executing line
    pub fn add_line_child(&mut self, elapsed: Duration) {
        match self.current {
            CurrentLine::Index(i) => self.lines[i].child_time += elapsed,
            CurrentLine::Unmapped => self.collapsed_child += elapsed,
            // call before any line event, e.g. a default argument
            CurrentLine::Unset => self.overhead += elapsed,
        }
    }

    /// Time this activation contributes to its caller's line
    pub fn total_time(&self) -> Duration {
        self.lines.iter().map(LineBucket::total).sum::<Duration>() + self.collapsed()
    }
}

/// LIFO of active frames with pooled slots
#[derive(Debug, Default)]
pub struct CallStack {
    slots: Vec<FrameRecord>,
    depth: usize,
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    /// Number of allocated slots (deepest nesting seen)
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn push(&mut self, identity: FunctionId, starting_line: u32, n_lines: usize) {
        if let Some(slot) = self.slots.get_mut(self.depth) {
            slot.reset(identity, starting_line, n_lines);
        } else {
            self.slots
                .push(FrameRecord::new(identity, starting_line, n_lines));
        }
        self.depth += 1;
    }

    /// Pop the top frame. The record stays readable until the next push.
    pub fn pop(&mut self) -> Option<&FrameRecord> {
        if self.depth == 0 {
            return None;
        }
        self.depth -= 1;
        self.slots.get(self.depth)
    }

    pub fn top(&self) -> Option<&FrameRecord> {
        self.depth.checked_sub(1).and_then(|i| self.slots.get(i))
    }

    pub fn top_mut(&mut self) -> Option<&mut FrameRecord> {
        match self.depth.checked_sub(1) {
            Some(i) => self.slots.get_mut(i),
            None => None,
        }
    }

    /// Forget every frame and release the pool
    pub fn clear(&mut self) {
        self.slots.clear();
        self.depth = 0;
    }

    /// Active frames, outermost first
    pub fn frames(&self) -> &[FrameRecord] {
        &self.slots[..self.depth]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(n: u64) -> Duration {
        Duration::from_nanos(n)
    }

    #[test]
    fn test_self_time_ignored_before_first_line() {
        let mut frame = FrameRecord::new(FunctionId(1), 10, 3);
        frame.add_line_self(ns(50));
        assert_eq!(frame.total_time(), Duration::ZERO);
        assert_eq!(frame.overhead(), Duration::ZERO);
    }

    #[test]
    fn test_line_index_relative_to_starting_line() {
        let mut frame = FrameRecord::new(FunctionId(1), 10, 3);
        assert_eq!(frame.set_current_line(12), CurrentLine::Index(2));

        frame.add_line_self(ns(5));
        frame.add_line_child(ns(7));

        assert_eq!(frame.lines()[2], LineBucket { self_time: ns(5), child_time: ns(7) });
        assert_eq!(frame.total_time(), ns(12));
    }

    #[test]
    fn test_unmapped_line_collapses_into_overhead() {
        let mut frame = FrameRecord::new(FunctionId(1), 10, 2);
        assert_eq!(frame.set_current_line(9), CurrentLine::Unmapped);
        frame.add_line_self(ns(3));
        frame.add_line_child(ns(4));

        assert!(frame.saw_unmapped());
        assert_eq!(frame.collapsed(), ns(7));
        assert_eq!(frame.collapsed_self(), ns(3));
        assert_eq!(frame.collapsed_child(), ns(4));
        assert_eq!(frame.overhead(), ns(7));
        // collapsed time still reaches the caller
        assert_eq!(frame.total_time(), ns(7));
    }

    #[test]
    fn test_frame_without_lines_is_always_unmapped() {
        let mut frame = FrameRecord::new(FunctionId(1), 0, 0);
        assert_eq!(frame.set_current_line(0), CurrentLine::Unmapped);
    }

    #[test]
    fn test_pop_reuses_slots() {
        let mut stack = CallStack::new();
        stack.push(FunctionId(1), 1, 4);
        stack.push(FunctionId(2), 1, 2);
        stack.top_mut().unwrap().add_overhead(ns(9));

        let popped = stack.pop().unwrap();
        assert_eq!(popped.identity(), FunctionId(2));
        assert_eq!(popped.overhead(), ns(9));

        stack.push(FunctionId(3), 5, 1);
        assert_eq!(stack.capacity(), 2);
        let top = stack.top().unwrap();
        assert_eq!(top.identity(), FunctionId(3));
        assert_eq!(top.overhead(), Duration::ZERO);
        assert_eq!(top.lines().len(), 1);
        assert_eq!(top.current(), CurrentLine::Unset);
    }

    #[test]
    fn test_pop_empty_stack() {
        let mut stack = CallStack::new();
        assert!(stack.pop().is_none());
        assert!(stack.top_mut().is_none());
        assert_eq!(stack.depth(), 0);
    }
}
