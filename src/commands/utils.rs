use crate::output::read_profile;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::Result;
use std::path::PathBuf;

/// Validate a profile JSON file
pub fn validate_profile_file(file_path: PathBuf) -> Result<()> {
    println!("Validating profile: {}", file_path.display());

    let profile = read_profile(&file_path)?;

    if profile.version != SCHEMA_VERSION {
        anyhow::bail!(
            "Unsupported profile version {} (expected {})",
            profile.version,
            SCHEMA_VERSION
        );
    }

    let degraded = profile
        .report
        .functions
        .iter()
        .filter(|f| f.is_degraded())
        .count();

    println!("✓ Valid profile JSON");
    println!("  Version: {}", profile.version);
    println!("  Source: {}", profile.source);
    println!("  Total Time: {} ns", profile.total_time_ns);
    println!("  Functions: {}", profile.report.functions.len());
    println!("  Native Callables: {}", profile.report.natives.len());
    println!("  Degraded Functions: {}", degraded);
    println!("  Hot Lines: {}", profile.hot_lines.len());

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("bprof Profile Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string            - Schema version (e.g., '1.0.0')");
        println!("  source: string             - Trace the profile was built from");
        println!("  total_time_ns: number      - Total exclusive time measured");
        println!("  report: object             - Per-function breakdown");
        println!("    functions: array         - One entry per function body");
        println!("      name, starting_line, calls, overhead_ns, collapsed_ns, collapsed_child_ns");
        println!("      lines: array           - line_number, source, self_ns, child_ns");
        println!("      degraded: array?       - source_unavailable | line_out_of_range | malformed_events");
        println!("    natives: array           - name, self_ns, calls");
        println!("    malformed_events: number - Events ignored as inconsistent");
        println!("  hot_lines: array           - Lines ranked by self time");
        println!("  generated_at: string       - RFC 3339 timestamp");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("bprof v{}", env!("CARGO_PKG_VERSION"));
    println!("Profile Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Deterministic line-level self/child time attribution.");
}
