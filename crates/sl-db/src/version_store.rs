//! Installed schema versions kept in the system catalog table.
//!
//! One catalog query loads the version of every module; later lookups are
//! served from that snapshot until [`SchemaVersionStore::reset`] (or a write)
//! drops it.

use crate::catalog::catalog_table;
use crate::error::{DbError, DbResult};
use crate::sql_utils::escape_sql_string;
use crate::traits::Database;
use std::collections::HashMap;
use std::sync::Arc;

/// Read/write access to per-module installed schema versions
pub struct SchemaVersionStore {
    db: Arc<dyn Database>,
    table: String,
    cache: Option<HashMap<String, Option<i64>>>,
}

impl SchemaVersionStore {
    /// Create a store over `{prefix}system`
    pub fn new(db: Arc<dyn Database>, table_prefix: &str) -> Self {
        Self {
            db,
            table: catalog_table(table_prefix),
            cache: None,
        }
    }

    /// Database the store reads from and writes to
    pub fn database(&self) -> &Arc<dyn Database> {
        &self.db
    }

    /// Last recorded version for a module.
    ///
    /// `None` when the module has no catalog row or its version is NULL.
    pub async fn installed_version(&mut self, module: &str) -> DbResult<Option<i64>> {
        if self.cache.is_none() {
            self.cache = Some(self.load().await?);
        }
        Ok(self
            .cache
            .as_ref()
            .and_then(|versions| versions.get(module).copied().flatten()))
    }

    /// Record `version` as installed for a module.
    ///
    /// The catalog row must already exist; the UPDATE matches nothing
    /// otherwise.
    pub async fn set_installed_version(&mut self, module: &str, version: i64) -> DbResult<()> {
        let sql = format!(
            "UPDATE {} SET schema_version = {} WHERE name = '{}'",
            self.table,
            version,
            escape_sql_string(module)
        );
        let affected = self.db.execute(&sql).await?;
        if affected == 0 {
            log::warn!(
                "No catalog row for module '{}'; schema version {} not recorded",
                module,
                version
            );
        }
        self.cache = None;
        Ok(())
    }

    /// Drop the cached snapshot so the next read queries the catalog
    pub fn reset(&mut self) {
        self.cache = None;
    }

    async fn load(&self) -> DbResult<HashMap<String, Option<i64>>> {
        if !self.db.relation_exists(&self.table).await? {
            return Err(DbError::CatalogMissing(self.table.clone()));
        }

        let sql = format!(
            "SELECT name, schema_version FROM {} WHERE type = 'module'",
            self.table
        );
        let rows = self.db.query_rows(&sql).await?;
        log::debug!("Loaded {} module versions from {}", rows.len(), self.table);

        let mut versions = HashMap::with_capacity(rows.len());
        for row in rows {
            let mut cols = row.into_iter();
            let Some(Some(name)) = cols.next() else {
                continue;
            };
            let version = match cols.next().flatten() {
                Some(value) => Some(value.trim().parse::<i64>().map_err(|_| {
                    DbError::InvalidCatalogValue {
                        module: name.clone(),
                        value: value.clone(),
                    }
                })?),
                None => None,
            };
            versions.insert(name, version);
        }
        Ok(versions)
    }
}

#[cfg(test)]
#[path = "version_store_test.rs"]
mod tests;
