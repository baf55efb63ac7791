//! Error types for sl-core

use thiserror::Error;

/// Core error type for Sluice
#[derive(Error, Debug)]
pub enum CoreError {
    /// S001: Configuration file not found
    #[error("[S001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// S002: Invalid configuration value
    #[error("[S002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// S003: Project directory not found
    #[error("[S003] Project directory not found: {path}")]
    ProjectNotFound { path: String },

    /// S004: Failed to parse a module definition file
    #[error("[S004] Failed to parse module file {path}: {details}")]
    ModuleParseError { path: String, details: String },

    /// S005: Two module files declare the same module name
    #[error("[S005] Duplicate module name '{name}' in {path1} and {path2}")]
    DuplicateModule {
        name: String,
        path1: String,
        path2: String,
    },

    /// S006: Module declares an impossible version range
    #[error("[S006] Module '{module}' declares schema_min {min} above schema_version {max}")]
    InvalidVersionRange { module: String, min: i64, max: i64 },

    /// S007: Module declares an update outside its version range
    #[error("[S007] Module '{module}' declares update {version} outside its range {min}..={max}")]
    UpdateOutOfRange {
        module: String,
        version: i64,
        min: i64,
        max: i64,
    },

    /// IO error with file path context
    #[error("IO error at {path}: {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
