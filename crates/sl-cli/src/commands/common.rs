//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use sl_core::{Config, ModuleName, Project, UpdateRunState};
use sl_update::ModuleChoice;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that destructors run before the process exits.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main.rs prints nothing for it
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Load the project, honouring a `--config` override.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = Path::new(&global.project_dir);
    match &global.config {
        Some(config_path) => {
            let config = Config::load(Path::new(config_path))
                .with_context(|| format!("Failed to load configuration file {}", config_path))?;
            Project::with_config(root, config).context("Failed to load project")
        }
        None => Project::load(root).context("Failed to load project"),
    }
}

/// Parse `--start module=N` arguments.
pub(crate) fn parse_starts(args: &[String]) -> Result<BTreeMap<ModuleName, i64>> {
    let mut starts = BTreeMap::new();
    for arg in args {
        let (module, version) = arg
            .split_once('=')
            .with_context(|| format!("Invalid start '{}': expected MODULE=N", arg))?;
        let name = ModuleName::try_new(module.trim())
            .with_context(|| format!("Invalid module name '{}'", module))?;
        let version: i64 = version
            .trim()
            .parse()
            .with_context(|| format!("Invalid version '{}' for module '{}'", version, module))?;
        starts.insert(name, version);
    }
    Ok(starts)
}

/// Default start for every module, with explicit starts layered on top.
///
/// Explicit starts for modules without updates are kept so the engine can
/// report them.
pub(crate) fn resolve_starts(
    choices: &[ModuleChoice],
    explicit: BTreeMap<ModuleName, i64>,
) -> BTreeMap<ModuleName, i64> {
    let mut starts: BTreeMap<ModuleName, i64> = choices
        .iter()
        .map(|c| (c.module.clone(), c.default_start))
        .collect();
    starts.extend(explicit);
    starts
}

/// Print the statements executed during a run, grouped per module update.
pub(crate) fn print_report(state: &UpdateRunState) {
    if state.results.is_empty() {
        println!("No updates were applied.");
        return;
    }
    for (module, updates) in &state.results {
        println!("{} module", module);
        for (version, queries) in updates {
            println!("  Update #{}", version);
            if queries.is_empty() {
                println!("    (no queries)");
            }
            for query in queries {
                let marker = if query.success { "ok    " } else { "FAILED" };
                println!("    [{}] {}", marker, query.query);
            }
        }
    }
}
