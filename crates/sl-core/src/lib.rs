//! sl-core - Core library for Sluice
//!
//! This crate provides the shared types used across all Sluice components:
//! project configuration, module definition discovery, query results, and the
//! serializable state of an update run.

pub mod config;
pub mod error;
pub mod module;
pub mod module_name;
pub mod project;
pub mod query_result;
pub mod run_state;

pub use config::{Config, DatabaseConfig, DatabaseDialect};
pub use error::{CoreError, CoreResult};
pub use module::{discover_modules, ColumnOptions, ModuleDef, UpdateStep};
pub use module_name::ModuleName;
pub use project::Project;
pub use query_result::QueryResult;
pub use run_state::{PendingUpdate, RunSummary, UpdateResults, UpdateRunState};
