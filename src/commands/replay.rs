//! Replay command implementation.
//!
//! The replay command:
//! 1. Loads and validates a recorded trace
//! 2. Replays it through the profiler
//! 3. Ranks hot lines
//! 4. Writes the JSON profile
//! 5. Prints the summary and dump when asked

use super::models::ReplayArgs;
use crate::output::write_profile;
use crate::report::{
    calculate_hot_lines, calculate_time_distribution, generate_text_summary, render_dump, Profile,
};
use crate::trace::{load_trace, replay_trace};
use crate::utils::config::MAX_TOP_LINES;
use anyhow::{Context, Result};
use log::{debug, info};
use std::time::Instant;

/// Execute the replay command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Trace file missing or malformed
/// * Fatal profiler errors
/// * File write errors
pub fn execute_replay(args: ReplayArgs) -> Result<Profile> {
    let start_time = Instant::now();

    info!("Starting replay of: {}", args.trace.display());

    info!("Step 1/4: Loading trace...");
    let trace = load_trace(&args.trace)
        .with_context(|| format!("Failed to load trace {}", args.trace.display()))?;

    debug!(
        "Loaded {} functions, {} events spanning {} ns",
        trace.functions.len(),
        trace.events.len(),
        trace.duration_ns()
    );

    info!("Step 2/4: Replaying events...");
    let report = replay_trace(&trace).context("Profiling session failed")?;

    let distribution = calculate_time_distribution(&report);
    info!("Time distribution: {}", distribution.summary());

    info!("Step 3/4: Ranking top {} hot lines...", args.top_lines);
    let hot_lines = calculate_hot_lines(&report, args.top_lines);

    debug!("Top 3 hot lines:");
    for (i, line) in hot_lines.iter().take(3).enumerate() {
        debug!(
            "  {}. {}:{} {} ns ({:.1}%)",
            i + 1,
            line.function,
            line.line_number,
            line.self_ns,
            line.percentage
        );
    }

    info!("Step 4/4: Writing profile...");
    let profile = Profile::new(args.trace.display().to_string(), report, hot_lines);
    write_profile(&profile, &args.output_json).context("Failed to write profile JSON")?;

    info!("✓ Profile written to: {}", args.output_json.display());

    if args.print_summary {
        println!("\n{}", "=".repeat(80));
        println!("PROFILE SUMMARY");
        println!("{}", "=".repeat(80));
        println!("Trace:        {}", args.trace.display());
        println!("Wall time:    {} ns", trace.duration_ns());
        println!("Measured:     {} ns", distribution.total_ns);
        println!("Functions:    {} ({} calls)", distribution.function_count, distribution.total_calls);
        println!("Natives:      {}", distribution.native_count);
        println!("Overhead:     {:.1}%", distribution.overhead_percentage());
        if distribution.degraded_functions > 0 || distribution.malformed_events > 0 {
            println!(
                "Degraded:     {} functions, {} malformed events",
                distribution.degraded_functions, distribution.malformed_events
            );
        }
        println!("\n{}", generate_text_summary(&profile.hot_lines, 10));
        println!("{}", "=".repeat(80));
    }

    if args.print_dump {
        println!("{}", render_dump(&profile.report));
    }

    let elapsed = start_time.elapsed();
    info!("Replay completed in {:.2}s", elapsed.as_secs_f64());

    Ok(profile)
}

/// Validate replay arguments
///
/// **Public** - can be called before execute_replay for early validation
pub fn validate_args(args: &ReplayArgs) -> Result<()> {
    if args.trace.as_os_str().is_empty() {
        anyhow::bail!("Trace path cannot be empty");
    }

    if !args.trace.exists() {
        anyhow::bail!("Trace file does not exist: {}", args.trace.display());
    }

    if args.top_lines == 0 {
        anyhow::bail!("top_lines must be greater than 0");
    }

    if args.top_lines > MAX_TOP_LINES {
        anyhow::bail!("top_lines is too large (max {})", MAX_TOP_LINES);
    }

    Ok(())
}
