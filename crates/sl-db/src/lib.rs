//! sl-db - Database layer for Sluice
//!
//! This crate provides the `Database` trait with a DuckDB implementation and a
//! recording backend for dry runs, the dialect strategies used to build column
//! mutation SQL, the mutation helpers themselves, and the schema version store
//! kept in the system catalog table.

pub mod catalog;
pub mod dialect;
pub mod duckdb;
pub mod error;
pub mod mutation;
pub mod recording;
pub mod sql_utils;
pub mod traits;
pub mod version_store;

pub use catalog::{catalog_table, Catalog};
pub use dialect::{dialect_for, ColumnDialect, DuckDbDialect, MySqlDialect, PostgresDialect};
pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use mutation::SchemaMutator;
pub use recording::RecordingBackend;
pub use traits::{Database, Row};
pub use version_store::SchemaVersionStore;
