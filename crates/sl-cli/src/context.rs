//! Runtime context for CLI commands

use anyhow::{Context, Result};
use sl_core::Project;
use sl_db::{dialect_for, Database, DuckDbBackend};
use sl_update::{ControllerSettings, UpdateEngine, UpdateRegistry};
use std::sync::Arc;
use std::time::Duration;

use crate::cli::GlobalArgs;
use crate::commands::common::load_project;

/// Runtime context containing the loaded project, database connection and
/// update engine
pub struct RuntimeContext {
    /// The loaded project
    pub project: Project,

    /// Database connection
    pub db: Arc<dyn Database>,

    /// Update engine over `db` with every discovered module registered
    pub engine: Arc<UpdateEngine>,

    /// Verbose output enabled
    pub verbose: bool,
}

impl RuntimeContext {
    /// Create a new runtime context from global arguments
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        let project = load_project(args)?;

        let db_path = match &args.target {
            Some(target) => target.clone(),
            None => project.config.database_path_absolute(&project.root),
        };
        let db: Arc<dyn Database> = Arc::new(
            DuckDbBackend::new(&db_path)
                .with_context(|| format!("Failed to connect to database {}", db_path))?,
        );

        let registry = UpdateRegistry::from_modules(&project.modules);
        let engine = Arc::new(UpdateEngine::new(
            db.clone(),
            registry,
            dialect_for(project.config.database.dialect),
            project.config.database.table_prefix.clone(),
        ));

        let ctx = Self {
            project,
            db,
            engine,
            verbose: args.verbose,
        };
        ctx.verbose(&format!(
            "Project '{}' with {} module(s), database {} ({})",
            ctx.project.config.name,
            ctx.project.modules.len(),
            db_path,
            ctx.project.config.database.dialect
        ));
        Ok(ctx)
    }

    /// Print verbose output if enabled
    pub fn verbose(&self, msg: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", msg);
        }
    }

    /// Wall-clock budget for one update slice
    pub fn slice_budget(&self) -> Duration {
        Duration::from_millis(self.project.config.slice_budget_ms)
    }

    /// Page controller settings from the project configuration
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            access_check: self.project.config.access_check,
            slice_budget: self.slice_budget(),
        }
    }
}
