//! Applies single pending updates and records their outcome.

use crate::error::UpdateResult;
use crate::registry::{UpdateContext, UpdateRegistry};
use sl_core::{ModuleName, PendingUpdate, QueryResult, UpdateRunState};
use sl_db::{ColumnDialect, Database, SchemaVersionStore};
use std::sync::Arc;

/// Everything needed to run updates against one site database.
///
/// Shared across requests; per-request state (the version store cache) lives
/// in the [`UpdateRunner`] it hands out.
pub struct UpdateEngine {
    db: Arc<dyn Database>,
    registry: UpdateRegistry,
    dialect: Box<dyn ColumnDialect>,
    table_prefix: String,
}

impl UpdateEngine {
    pub fn new(
        db: Arc<dyn Database>,
        registry: UpdateRegistry,
        dialect: Box<dyn ColumnDialect>,
        table_prefix: impl Into<String>,
    ) -> Self {
        Self {
            db,
            registry,
            dialect,
            table_prefix: table_prefix.into(),
        }
    }

    pub fn database(&self) -> &Arc<dyn Database> {
        &self.db
    }

    pub fn registry(&self) -> &UpdateRegistry {
        &self.registry
    }

    pub fn dialect(&self) -> &dyn ColumnDialect {
        self.dialect.as_ref()
    }

    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    /// Fresh version store with an empty cache
    pub fn version_store(&self) -> SchemaVersionStore {
        SchemaVersionStore::new(self.db.clone(), &self.table_prefix)
    }

    /// Runner for one request
    pub fn runner(&self) -> UpdateRunner<'_> {
        UpdateRunner {
            engine: self,
            store: self.version_store(),
        }
    }
}

/// Applies updates one at a time
pub struct UpdateRunner<'a> {
    engine: &'a UpdateEngine,
    store: SchemaVersionStore,
}

impl<'a> UpdateRunner<'a> {
    pub fn engine(&self) -> &'a UpdateEngine {
        self.engine
    }

    /// Version store used by this runner
    pub fn store(&mut self) -> &mut SchemaVersionStore {
        &mut self.store
    }

    /// Run the routine for `module` at `version` and record what it did.
    ///
    /// The installed version advances even when statements fail or the
    /// routine is missing. Only a failure to write the version itself is
    /// returned as an error.
    pub async fn apply(
        &mut self,
        state: &mut UpdateRunState,
        module: &ModuleName,
        version: i64,
    ) -> UpdateResult<()> {
        let results = self.invoke(module, version).await;
        state.record(module, version, results);
        self.store.set_installed_version(module, version).await?;
        Ok(())
    }

    /// Apply the update at the front of the queue.
    ///
    /// The update leaves the queue as soon as its routine returns, before the
    /// version is written, so a failed version write is never retried.
    /// Returns `None` when the queue is empty.
    pub async fn apply_next(
        &mut self,
        state: &mut UpdateRunState,
    ) -> UpdateResult<Option<PendingUpdate>> {
        let Some(next) = state.remaining.front().cloned() else {
            return Ok(None);
        };
        let results = self.invoke(&next.module, next.version).await;
        state.record(&next.module, next.version, results);
        state.pop_next();
        self.store
            .set_installed_version(&next.module, next.version)
            .await?;
        Ok(Some(next))
    }

    async fn invoke(&self, module: &ModuleName, version: i64) -> Vec<QueryResult> {
        let engine = self.engine;
        let results = match engine.registry.routine(module, version) {
            Some(routine) => {
                let ctx = UpdateContext::new(
                    engine.db.as_ref(),
                    engine.dialect.as_ref(),
                    &engine.table_prefix,
                );
                routine.run(&ctx).await
            }
            None => {
                log::warn!("No update routine for {} #{}", module, version);
                vec![QueryResult::failed(format!(
                    "Missing update routine: {} update #{}",
                    module, version
                ))]
            }
        };

        let failed = results.iter().filter(|r| !r.success).count();
        log::info!(
            "Applied {} update #{} ({} statements, {} failed)",
            module,
            version,
            results.len(),
            failed
        );
        results
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
