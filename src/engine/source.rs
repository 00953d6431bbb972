//! Source retrieval collaborator.
//!
//! The profiler asks for a function's source exactly once, the first time
//! the function is called.

use super::event::FunctionId;
use crate::utils::error::SourceError;
use std::collections::HashMap;

/// Source text of one function body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLines {
    /// One entry per physical line, in order
    pub lines: Vec<String>,

    /// Absolute line number of `lines[0]`
    pub starting_line: u32,
}

impl SourceLines {
    pub fn new(lines: Vec<String>, starting_line: u32) -> Self {
        Self { lines, starting_line }
    }
}

/// Fetches function source for the registry
///
/// **Public** - implemented per host
pub trait SourceProvider {
    fn source_lines_of(&self, id: FunctionId) -> Result<SourceLines, SourceError>;
}

/// Source provider backed by a map filled up front
///
/// **Public** - used by the trace replay host and by tests
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    functions: HashMap<FunctionId, SourceLines>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: FunctionId, source: SourceLines) {
        self.functions.insert(id, source);
    }

    /// Builder-style insert from anything string-like
    pub fn with_function<I, S>(mut self, id: FunctionId, starting_line: u32, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines = lines.into_iter().map(Into::into).collect();
        self.insert(id, SourceLines::new(lines, starting_line));
        self
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl SourceProvider for InMemorySource {
    fn source_lines_of(&self, id: FunctionId) -> Result<SourceLines, SourceError> {
        self.functions
            .get(&id)
            .cloned()
            .ok_or_else(|| SourceError::Unavailable {
                id: id.0,
                reason: "not registered with the source provider".to_string(),
            })
    }
}
