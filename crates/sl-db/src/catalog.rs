//! System catalog bootstrap.
//!
//! The version store assumes a row per module already exists. `sluice init`
//! uses [`Catalog`] to create the table and insert the missing rows.

use crate::error::DbResult;
use crate::sql_utils::escape_sql_string;
use crate::traits::Database;
use std::sync::Arc;

/// Name of the catalog table for a prefix
pub fn catalog_table(table_prefix: &str) -> String {
    format!("{}system", table_prefix)
}

/// Creates and populates the system catalog table
pub struct Catalog {
    db: Arc<dyn Database>,
    table: String,
}

impl Catalog {
    /// Create a catalog handle for `{prefix}system`
    pub fn new(db: Arc<dyn Database>, table_prefix: &str) -> Self {
        Self {
            db,
            table: catalog_table(table_prefix),
        }
    }

    /// Catalog table name including the prefix
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether the catalog table exists
    pub async fn exists(&self) -> DbResult<bool> {
        self.db.relation_exists(&self.table).await
    }

    /// Create the catalog table if missing
    pub async fn ensure(&self) -> DbResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                name VARCHAR NOT NULL,
                type VARCHAR NOT NULL,
                schema_version INTEGER
            )",
            self.table
        );
        self.db.execute_batch(&sql).await
    }

    /// Insert a module row unless one exists.
    ///
    /// Returns `true` when a row was inserted. Existing versions are left
    /// untouched.
    pub async fn register_module(&self, name: &str, version: Option<i64>) -> DbResult<bool> {
        let escaped = escape_sql_string(name);
        let existing = self
            .db
            .query_rows(&format!(
                "SELECT name FROM {} WHERE name = '{}' AND type = 'module'",
                self.table, escaped
            ))
            .await?;
        if !existing.is_empty() {
            log::debug!("Module '{}' already registered", name);
            return Ok(false);
        }

        let version = version.map_or_else(|| "NULL".to_string(), |v| v.to_string());
        self.db
            .execute(&format!(
                "INSERT INTO {} (name, type, schema_version) VALUES ('{}', 'module', {})",
                self.table, escaped, version
            ))
            .await?;
        log::info!("Registered module '{}' at schema version {}", name, version);
        Ok(true)
    }
}
