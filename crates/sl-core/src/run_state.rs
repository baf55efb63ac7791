//! Update run state carried between requests
//!
//! An update run outlives any single HTTP request: the queue of pending
//! updates and the statements executed so far are stored in the caller's
//! session between slices and read back on the next poll.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::module_name::ModuleName;
use crate::query_result::QueryResult;

/// Statements recorded per module, then per version, in execution order
pub type UpdateResults = BTreeMap<ModuleName, BTreeMap<i64, Vec<QueryResult>>>;

/// One update waiting to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUpdate {
    /// Module that owns the update
    pub module: ModuleName,

    /// Schema version the update migrates to
    pub version: i64,
}

impl PendingUpdate {
    pub fn new(module: ModuleName, version: i64) -> Self {
        Self { module, version }
    }
}

/// State of an update run in progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRunState {
    /// Unique identifier for this run
    pub run_id: String,

    /// When the run was confirmed
    pub started_at: DateTime<Utc>,

    /// When the state was last updated
    pub last_updated_at: DateTime<Utc>,

    /// Updates not yet applied, in execution order
    pub remaining: VecDeque<PendingUpdate>,

    /// Size of the queue at confirmation time
    pub total: usize,

    /// Statements executed so far
    #[serde(default)]
    pub results: UpdateResults,
}

impl UpdateRunState {
    /// Create a new run from the full update queue
    pub fn new(queue: Vec<PendingUpdate>) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4().to_string()[..8].to_string(),
            started_at: now,
            last_updated_at: now,
            total: queue.len(),
            remaining: queue.into(),
            results: BTreeMap::new(),
        }
    }

    /// Load run state from a file path
    pub fn load(path: &Path) -> CoreResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let state: UpdateRunState = serde_json::from_str(&content)?;
        Ok(Some(state))
    }

    /// Save run state to a file path atomically
    ///
    /// Uses write-to-temp-then-rename pattern to prevent corruption
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Take the next pending update off the queue
    pub fn pop_next(&mut self) -> Option<PendingUpdate> {
        let next = self.remaining.pop_front();
        if next.is_some() {
            self.last_updated_at = Utc::now();
        }
        next
    }

    /// Record the statements executed by one update.
    ///
    /// A second record for the same module/version replaces the first.
    pub fn record(&mut self, module: &ModuleName, version: i64, queries: Vec<QueryResult>) {
        self.results
            .entry(module.clone())
            .or_default()
            .insert(version, queries);
        self.last_updated_at = Utc::now();
    }

    /// Percentage of the queue already applied, rounded down.
    ///
    /// An empty run is complete from the start.
    pub fn percent_complete(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let done = self.total.saturating_sub(self.remaining.len());
        ((done * 100) / self.total) as u8
    }

    /// Whether every queued update has been applied
    pub fn is_finished(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Get summary statistics
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            total: self.total,
            applied: 0,
            pending: self.remaining.len(),
            statements: 0,
            failed_statements: 0,
        };
        for versions in self.results.values() {
            summary.applied += versions.len();
            for queries in versions.values() {
                summary.statements += queries.len();
                summary.failed_statements += queries.iter().filter(|q| !q.success).count();
            }
        }
        summary
    }
}

/// Summary statistics for an update run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub applied: usize,
    pub pending: usize,
    pub statements: usize,
    pub failed_statements: usize,
}

impl RunSummary {
    /// Whether any recorded statement failed
    pub fn has_failures(&self) -> bool {
        self.failed_statements > 0
    }
}

#[cfg(test)]
#[path = "run_state_test.rs"]
mod tests;
