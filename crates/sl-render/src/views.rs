//! Data handed to the page templates.

use serde::Serialize;
use sl_core::{QueryResult, RunSummary, UpdateResults};

/// One entry of a version drop-down
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionOption {
    pub value: i64,
    pub label: String,
}

/// Version drop-down for one module on the selection page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSelection {
    pub module: String,
    pub options: Vec<VersionOption>,

    /// Value selected when the page loads
    pub default: i64,
}

/// Progress bar state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressView {
    pub percent: u8,
    pub message: String,
}

/// Executed statements for one update
#[derive(Debug, Clone, Serialize)]
pub struct VersionReport {
    pub version: i64,
    pub queries: Vec<QueryResult>,
}

/// Executed updates for one module
#[derive(Debug, Clone, Serialize)]
pub struct ModuleReport {
    pub module: String,
    pub updates: Vec<VersionReport>,
}

/// Everything the finished page shows
#[derive(Debug, Clone, Serialize)]
pub struct FinishedView {
    pub modules: Vec<ModuleReport>,
    pub summary: Option<RunSummary>,

    /// Remind the operator to re-enable the access check
    pub access_check_disabled: bool,
}

impl FinishedView {
    /// Flatten run results into module and version order
    pub fn from_results(
        results: &UpdateResults,
        summary: Option<RunSummary>,
        access_check_disabled: bool,
    ) -> Self {
        let modules = results
            .iter()
            .map(|(module, versions)| ModuleReport {
                module: module.to_string(),
                updates: versions
                    .iter()
                    .map(|(version, queries)| VersionReport {
                        version: *version,
                        queries: queries.clone(),
                    })
                    .collect(),
            })
            .collect();
        Self {
            modules,
            summary,
            access_check_disabled,
        }
    }
}
