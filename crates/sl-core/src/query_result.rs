//! Outcome of a single schema mutation statement.

use serde::{Deserialize, Serialize};

/// One executed statement and whether the database accepted it.
///
/// Failures are data, not errors: they are collected for the final report and
/// never stop an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Statement text as sent to the database
    pub query: String,

    /// Whether the statement succeeded
    pub success: bool,
}

impl QueryResult {
    /// A statement that succeeded
    pub fn ok(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            success: true,
        }
    }

    /// A statement that failed
    pub fn failed(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            success: false,
        }
    }
}
