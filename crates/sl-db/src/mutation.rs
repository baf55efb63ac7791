//! Column mutation helpers used by update routines.
//!
//! Every statement is executed on its own and its outcome recorded as a
//! [`QueryResult`]. A failing statement never aborts the routine; the next
//! statement still runs.

use crate::dialect::ColumnDialect;
use crate::sql_utils::prefix_tables;
use crate::traits::Database;
use sl_core::{ColumnOptions, QueryResult};

/// Runs schema mutations against one database with one dialect.
pub struct SchemaMutator<'a> {
    db: &'a dyn Database,
    dialect: &'a dyn ColumnDialect,
    table_prefix: &'a str,
}

impl<'a> SchemaMutator<'a> {
    /// Create a mutator for a database, dialect and table prefix
    pub fn new(
        db: &'a dyn Database,
        dialect: &'a dyn ColumnDialect,
        table_prefix: &'a str,
    ) -> Self {
        Self {
            db,
            dialect,
            table_prefix,
        }
    }

    /// Dialect used to build column statements
    pub fn dialect(&self) -> &dyn ColumnDialect {
        self.dialect
    }

    /// Configured table prefix
    pub fn table_prefix(&self) -> &str {
        self.table_prefix
    }

    /// Run one statement, expanding `{table}` placeholders with the prefix.
    ///
    /// The recorded query is the statement as executed.
    pub async fn update_sql(&self, sql: &str) -> QueryResult {
        let sql = prefix_tables(sql, self.table_prefix);
        self.run_statement(sql).await
    }

    /// Add a column, then apply its default and NOT NULL constraint.
    ///
    /// Appends one result per statement to `results`.
    pub async fn add_column(
        &self,
        results: &mut Vec<QueryResult>,
        table: &str,
        column: &str,
        column_type: &str,
        options: &ColumnOptions,
    ) {
        let table = self.prefixed(table);
        let statements = self.dialect.add_column(&table, column, column_type, options);
        self.run_all(results, statements).await;
    }

    /// Replace `column` with `new_column` of a new type, copying the data.
    ///
    /// The old column survives as `<column>_old`.
    pub async fn change_column(
        &self,
        results: &mut Vec<QueryResult>,
        table: &str,
        column: &str,
        new_column: &str,
        column_type: &str,
        options: &ColumnOptions,
    ) {
        let table = self.prefixed(table);
        let statements =
            self.dialect
                .change_column(&table, column, new_column, column_type, options);
        self.run_all(results, statements).await;
    }

    fn prefixed(&self, table: &str) -> String {
        format!("{}{}", self.table_prefix, table)
    }

    async fn run_all(&self, results: &mut Vec<QueryResult>, statements: Vec<String>) {
        for sql in statements {
            results.push(self.run_statement(sql).await);
        }
    }

    async fn run_statement(&self, sql: String) -> QueryResult {
        match self.db.execute(&sql).await {
            Ok(_) => QueryResult::ok(sql),
            Err(e) => {
                log::warn!("Update statement failed: {}", e);
                QueryResult::failed(sql)
            }
        }
    }
}

#[cfg(test)]
#[path = "mutation_test.rs"]
mod tests;
