//! Status command implementation - installed vs. available versions

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::{GlobalArgs, OutputFormat, StatusArgs};
use crate::context::RuntimeContext;

/// One row of the status output
#[derive(Debug, Serialize)]
struct ModuleStatus {
    module: String,
    installed: Option<i64>,
    min: Option<i64>,
    max: Option<i64>,
    pending: usize,
}

/// Updates still to run from `installed` up to `max`
fn pending_count(installed: Option<i64>, range: Option<(i64, i64)>) -> usize {
    let Some((min, max)) = range else {
        return 0;
    };
    let next = installed.map_or(min, |v| (v + 1).max(min));
    usize::try_from(max - next + 1).unwrap_or(0)
}

/// Execute the status command
pub(crate) async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let registry = ctx.engine.registry();
    let mut store = ctx.engine.version_store();

    let mut rows = Vec::new();
    for module in registry.module_names() {
        let installed = store
            .installed_version(module)
            .await
            .context("Failed to read installed schema versions")?;
        let range = registry.version_range(module);
        rows.push(ModuleStatus {
            module: module.to_string(),
            installed,
            min: range.map(|(min, _)| min),
            max: range.map(|(_, max)| max),
            pending: pending_count(installed, range),
        });
    }

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Table => print_table(&rows),
    }
    Ok(())
}

fn print_table(rows: &[ModuleStatus]) {
    if rows.is_empty() {
        println!("No modules found.");
        return;
    }

    let name_width = rows.iter().map(|r| r.module.len()).max().unwrap_or(6).max(6);
    println!(
        "{:<name_width$}  {:>9}  {:>9}  {:>7}",
        "MODULE",
        "INSTALLED",
        "AVAILABLE",
        "PENDING",
        name_width = name_width
    );
    println!("{}", "-".repeat(name_width + 33));

    let fmt_opt = |v: Option<i64>| v.map_or_else(|| "-".to_string(), |v| v.to_string());
    for row in rows {
        let available = match (row.min, row.max) {
            (Some(min), Some(max)) => format!("{}..{}", min, max),
            _ => "-".to_string(),
        };
        println!(
            "{:<name_width$}  {:>9}  {:>9}  {:>7}",
            row.module,
            fmt_opt(row.installed),
            available,
            row.pending,
            name_width = name_width
        );
    }

    let total: usize = rows.iter().map(|r| r.pending).sum();
    println!("\n{} pending update(s)", total);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_count() {
        assert_eq!(pending_count(Some(3), Some((1, 5))), 2);
        assert_eq!(pending_count(Some(5), Some((1, 5))), 0);
        assert_eq!(pending_count(Some(9), Some((1, 5))), 0);
        assert_eq!(pending_count(None, Some((2, 3))), 2);
        assert_eq!(pending_count(Some(-1), Some((2, 3))), 2);
        assert_eq!(pending_count(Some(3), None), 0);
    }
}
