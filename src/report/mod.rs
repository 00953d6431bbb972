//! Report data, metrics and text rendering.
//!
//! This module turns a profiler snapshot into:
//! - The serializable report and versioned profile document
//! - Hot-line ranking and time distribution statistics
//! - The plain-text dump and summary table

pub mod metrics;
pub mod schema;
pub mod text;

// Re-export main types and functions
pub use metrics::{calculate_hot_lines, calculate_time_distribution, TimeDistribution};
pub use schema::{FunctionReport, HotLine, LineReport, NativeReport, Profile, ReportData};
pub use text::{generate_text_summary, render_dump};
