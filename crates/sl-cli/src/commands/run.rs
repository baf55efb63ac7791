//! Run command implementation - headless update run

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use sl_update::{ProgressController, RequestTimer};

use crate::cli::{GlobalArgs, RunArgs};
use crate::commands::common::{parse_starts, print_report, resolve_starts, ExitCode};
use crate::context::RuntimeContext;

/// Execute the run command
pub(crate) async fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let explicit = parse_starts(&args.starts)?;

    let mut controller = ProgressController::new(&ctx.engine, ctx.slice_budget());
    let choices = controller
        .selection()
        .await
        .context("Failed to read installed schema versions")?;
    let starts = resolve_starts(&choices, explicit);

    let mut state = controller
        .confirm(&starts)
        .await
        .context("Failed to record start versions")?;
    ctx.verbose(&format!(
        "Run {} queued {} update(s)",
        state.run_id, state.total
    ));

    let progress = if !args.quiet && state.total > 0 {
        let pb = ProgressBar::new(state.total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    // Same slices the HTTP surface runs, back to back
    loop {
        let slice = controller
            .poll(&mut state, &RequestTimer::start())
            .await
            .context("Failed to record installed schema version")?;
        if let Some(pb) = &progress {
            pb.set_position((state.total - state.remaining.len()) as u64);
            pb.set_message(slice.message.clone());
        }
        ctx.verbose(&format!("{}% {}", slice.percent, slice.message));
        if slice.is_complete() {
            break;
        }
    }
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if !args.quiet {
        print_report(&state);
    }

    let summary = state.summary();
    println!(
        "\nApplied {} of {} update(s): {} statement(s), {} failed",
        summary.applied, summary.total, summary.statements, summary.failed_statements
    );

    if summary.has_failures() {
        return Err(ExitCode(1).into());
    }
    Ok(())
}
