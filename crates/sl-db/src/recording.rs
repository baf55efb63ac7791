//! Recording database backend for dry runs
//!
//! Accepts every statement without touching a database and remembers what it
//! was asked to run. `sluice plan` drives update routines against it.

use crate::error::{DbError, DbResult};
use crate::traits::{Database, Row};
use async_trait::async_trait;
use std::sync::Mutex;

/// Backend that records statements instead of executing them
#[derive(Debug, Default)]
pub struct RecordingBackend {
    statements: Mutex<Vec<String>>,
}

impl RecordingBackend {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Statements recorded so far, in order
    pub fn statements(&self) -> Vec<String> {
        self.statements
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Drain the recorded statements
    pub fn take_statements(&self) -> Vec<String> {
        self.statements
            .lock()
            .map(|mut s| std::mem::take(&mut *s))
            .unwrap_or_default()
    }

    fn record(&self, sql: &str) -> DbResult<()> {
        self.statements
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?
            .push(sql.to_string());
        Ok(())
    }
}

#[async_trait]
impl Database for RecordingBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.record(sql)?;
        Ok(0)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.record(sql)
    }

    async fn query_rows(&self, _sql: &str) -> DbResult<Vec<Row>> {
        Ok(Vec::new())
    }

    async fn relation_exists(&self, _name: &str) -> DbResult<bool> {
        Ok(false)
    }

    fn db_type(&self) -> &'static str {
        "recording"
    }
}
