//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;

/// One result row with every column coerced to text (`None` for SQL NULL)
pub type Row = Vec<Option<String>>;

/// Database abstraction trait for Sluice
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute SQL that modifies data, returns affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute multiple SQL statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Run a query and return every row as text
    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Row>>;

    /// Check if a table or view exists
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
