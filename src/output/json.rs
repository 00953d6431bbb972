//! Profile documents on disk.
//!
//! Profiles are stored as pretty-printed JSON so they diff cleanly between
//! runs.

use crate::report::Profile;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::path::Path;

/// Write a profile document, creating missing parent directories
///
/// **Public** - used by the replay command
///
/// # Errors
/// * `OutputError::InvalidPath` - Empty path, a directory, or an uncreatable parent
/// * `OutputError::SerializationFailed` - Profile could not be encoded
/// * `OutputError::WriteFailed` - I/O error during write
///
/// # Example
/// ```ignore
/// let profile = Profile::new("trace.json", report, hot_lines);
/// write_profile(&profile, "profile.json")?;
/// ```
pub fn write_profile(profile: &Profile, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    check_output_target(output_path)?;
    ensure_parent_dir(output_path)?;

    let document = profile_to_string(profile)?;
    std::fs::write(output_path, &document)?;

    info!(
        "Wrote {} functions, {} natives to {} ({} bytes)",
        profile.report.functions.len(),
        profile.report.natives.len(),
        output_path.display(),
        document.len()
    );
    Ok(())
}

/// Encode a profile the same way [`write_profile`] stores it
pub fn profile_to_string(profile: &Profile) -> Result<String, OutputError> {
    Ok(serde_json::to_string_pretty(profile)?)
}

fn check_output_target(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("no output path given".to_string()));
    }
    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "{} is a directory",
            path.display()
        )));
    }
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<(), OutputError> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    if parent.exists() {
        return Ok(());
    }

    debug!("Creating output directory {}", parent.display());
    std::fs::create_dir_all(parent).map_err(|e| {
        OutputError::InvalidPath(format!("cannot create {}: {}", parent.display(), e))
    })
}

/// Load a previously written profile document
///
/// **Public** - used by the validate command
///
/// I/O failures surface as `OutputError::WriteFailed`.
pub fn read_profile(input_path: impl AsRef<Path>) -> Result<Profile, OutputError> {
    let input_path = input_path.as_ref();
    let document = std::fs::read_to_string(input_path)?;
    let profile: Profile = serde_json::from_str(&document)?;

    debug!(
        "Loaded profile v{} of {} ({} functions)",
        profile.version,
        profile.source,
        profile.report.functions.len()
    );
    Ok(profile)
}
