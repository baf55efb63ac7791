//! Update registry: which versions each module declares and the routine that
//! migrates to each of them.

use async_trait::async_trait;
use sl_core::{ModuleDef, ModuleName, QueryResult, UpdateStep};
use sl_db::{ColumnDialect, Database, SchemaMutator};
use std::collections::BTreeMap;
use std::sync::Arc;

/// What an update routine gets to work with
pub struct UpdateContext<'a> {
    /// Database the routine runs against
    pub db: &'a dyn Database,

    /// Column helpers bound to the same database
    pub mutator: SchemaMutator<'a>,
}

impl<'a> UpdateContext<'a> {
    pub fn new(
        db: &'a dyn Database,
        dialect: &'a dyn ColumnDialect,
        table_prefix: &'a str,
    ) -> Self {
        Self {
            db,
            mutator: SchemaMutator::new(db, dialect, table_prefix),
        }
    }
}

/// One module update, migrating the schema to a single version.
///
/// Routines report every statement they ran. They do not fail: a statement
/// the database rejects is returned as a failed [`QueryResult`].
#[async_trait]
pub trait UpdateRoutine: Send + Sync {
    async fn run(&self, ctx: &UpdateContext<'_>) -> Vec<QueryResult>;
}

/// Routine built from the steps listed in a module file
#[derive(Debug, Clone)]
pub struct StepRoutine {
    steps: Vec<UpdateStep>,
}

impl StepRoutine {
    pub fn new(steps: Vec<UpdateStep>) -> Self {
        Self { steps }
    }
}

#[async_trait]
impl UpdateRoutine for StepRoutine {
    async fn run(&self, ctx: &UpdateContext<'_>) -> Vec<QueryResult> {
        let mut results = Vec::new();
        for step in &self.steps {
            match step {
                UpdateStep::Sql(sql) => results.push(ctx.mutator.update_sql(sql).await),
                UpdateStep::AddColumn {
                    table,
                    column,
                    column_type,
                    options,
                } => {
                    ctx.mutator
                        .add_column(&mut results, table, column, column_type, options)
                        .await
                }
                UpdateStep::ChangeColumn {
                    table,
                    column,
                    new_column,
                    column_type,
                    options,
                } => {
                    ctx.mutator
                        .change_column(
                            &mut results,
                            table,
                            column,
                            new_column,
                            column_type,
                            options,
                        )
                        .await
                }
            }
        }
        results
    }
}

struct ModuleEntry {
    min: i64,
    max: Option<i64>,
    routines: BTreeMap<i64, Arc<dyn UpdateRoutine>>,
}

/// Registry of modules, their version ranges and update routines
#[derive(Default)]
pub struct UpdateRegistry {
    modules: BTreeMap<ModuleName, ModuleEntry>,
}

impl UpdateRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from module definition files
    pub fn from_modules(modules: &[ModuleDef]) -> Self {
        let mut registry = Self::new();
        for module in modules {
            registry.register_module(module.name.clone(), module.schema_min, module.declared_max());
            for (version, steps) in &module.updates {
                registry.register_update(
                    &module.name,
                    *version,
                    Arc::new(StepRoutine::new(steps.clone())),
                );
            }
        }
        registry
    }

    /// Declare a module and its version range.
    ///
    /// `min` defaults to 1. A module without a `max` has no updates.
    pub fn register_module(&mut self, name: ModuleName, min: Option<i64>, max: Option<i64>) {
        let entry = self.modules.entry(name).or_insert_with(|| ModuleEntry {
            min: 1,
            max: None,
            routines: BTreeMap::new(),
        });
        entry.min = min.unwrap_or(1);
        entry.max = max;
    }

    /// Register the routine that migrates `module` to `version`.
    ///
    /// Registering a routine for an undeclared module declares it with no
    /// range; call [`UpdateRegistry::register_module`] to set one.
    pub fn register_update(
        &mut self,
        module: &ModuleName,
        version: i64,
        routine: Arc<dyn UpdateRoutine>,
    ) {
        self.modules
            .entry(module.clone())
            .or_insert_with(|| ModuleEntry {
                min: 1,
                max: None,
                routines: BTreeMap::new(),
            })
            .routines
            .insert(version, routine);
    }

    /// Inclusive `(min, max)` range, `None` when the module has no updates
    pub fn version_range(&self, module: &str) -> Option<(i64, i64)> {
        let entry = self.modules.get(module)?;
        entry.max.map(|max| (entry.min, max))
    }

    /// Every version between the declared minimum and maximum
    pub fn available_versions(&self, module: &str) -> Option<Vec<i64>> {
        self.version_range(module)
            .map(|(min, max)| (min..=max).collect())
    }

    /// Routine for one module version
    pub fn routine(&self, module: &str, version: i64) -> Option<Arc<dyn UpdateRoutine>> {
        self.modules
            .get(module)
            .and_then(|e| e.routines.get(&version))
            .cloned()
    }

    /// Whether the module is known to the registry
    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    /// Names of all registered modules, sorted
    pub fn module_names(&self) -> impl Iterator<Item = &ModuleName> {
        self.modules.keys()
    }

    /// Names of modules that declare updates, sorted
    pub fn updatable_modules(&self) -> impl Iterator<Item = &ModuleName> {
        self.modules
            .iter()
            .filter(|(_, e)| e.max.is_some())
            .map(|(name, _)| name)
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
