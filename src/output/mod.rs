//! Output writers for profile data.
//!
//! Profiles are written as pretty-printed JSON documents.

pub mod json;

// Re-export main functions
pub use json::{profile_to_string, read_profile, write_profile};
