//! Configuration and constants for the profiler and CLI.

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Default number of hot lines kept in a profile
pub const DEFAULT_TOP_LINES: usize = 20;

/// Upper bound accepted for `--top-lines`
pub const MAX_TOP_LINES: usize = 1000;

/// Default output path for the JSON profile
pub const DEFAULT_OUTPUT: &str = "profile.json";

// Durations are reported in seconds by the text dump
pub const NANOS_PER_SEC: f64 = 1e9;

// Accepted spellings for event kinds in recorded traces
pub const CALL_KIND_NAMES: &[&str] = &["call", "CALL"];
pub const LINE_KIND_NAMES: &[&str] = &["line", "LINE"];
pub const RETURN_KIND_NAMES: &[&str] = &["return", "RETURN"];
pub const EXCEPTION_KIND_NAMES: &[&str] = &["exception", "EXCEPTION"];
pub const NATIVE_CALL_KIND_NAMES: &[&str] = &["native_call", "c_call", "C_CALL"];
pub const NATIVE_RETURN_KIND_NAMES: &[&str] = &["native_return", "c_return", "C_RETURN"];
pub const NATIVE_EXCEPTION_KIND_NAMES: &[&str] =
    &["native_exception", "c_exception", "C_EXCEPTION"];
