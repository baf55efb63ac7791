//! Plan command implementation - dry run of pending updates

use anyhow::{Context, Result};
use sl_db::{dialect_for, RecordingBackend};
use sl_update::{ProgressController, UpdateContext};

use crate::cli::{GlobalArgs, PlanArgs};
use crate::commands::common::{parse_starts, resolve_starts};
use crate::context::RuntimeContext;

/// Execute the plan command
pub(crate) async fn execute(args: &PlanArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let dialect = dialect_for(args.dialect.unwrap_or(ctx.project.config.database.dialect));
    let prefix = ctx.project.config.database.table_prefix.as_str();
    let registry = ctx.engine.registry();

    let choices = ProgressController::new(&ctx.engine, ctx.slice_budget())
        .selection()
        .await
        .context("Failed to read installed schema versions")?;
    let starts = resolve_starts(&choices, parse_starts(&args.starts)?);

    let recorder = RecordingBackend::new();
    let mut planned = 0;
    println!("-- dialect: {}", dialect.name());

    for (module, &start) in &starts {
        let Some((min, max)) = registry.version_range(module) else {
            if registry.contains(module) {
                eprintln!("[warn] Module '{}' declares no updates, skipping", module);
            } else {
                eprintln!("[warn] Unknown module '{}', skipping", module);
            }
            continue;
        };
        if start < min || start > max + 1 {
            eprintln!(
                "[warn] Start {} for module '{}' is outside {}..={}, skipping",
                start,
                module,
                min,
                max + 1
            );
            continue;
        }

        for version in start..=max {
            println!("\n-- {} update #{}", module, version);
            match registry.routine(module, version) {
                Some(routine) => {
                    let update_ctx = UpdateContext::new(&recorder, dialect.as_ref(), prefix);
                    routine.run(&update_ctx).await;
                    let statements = recorder.take_statements();
                    if statements.is_empty() {
                        println!("-- (no queries)");
                    }
                    for sql in statements {
                        println!("{};", sql);
                    }
                }
                None => println!("-- missing update routine"),
            }
            planned += 1;
        }
    }

    println!("\n-- {} pending update(s)", planned);
    ctx.verbose("Plan only: no statements were executed");
    Ok(())
}
