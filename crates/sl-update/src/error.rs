//! Error types for sl-update

use thiserror::Error;

/// Update engine errors.
///
/// Statement failures are not errors; they are recorded in the run results.
/// These cover the infrastructure the engine depends on.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// U001: Session id contains characters outside `[A-Za-z0-9_-]`
    #[error("[U001] Invalid session id '{0}'")]
    InvalidSessionId(String),

    /// U002: Session state could not be read or written
    #[error("[U002] Session storage failed for '{session}': {message}")]
    SessionStorage { session: String, message: String },

    /// U003: Poll lock table poisoned
    #[error("[U003] Session lock table poisoned: {0}")]
    LockPoisoned(String),

    /// U004: Version store or database error propagation
    #[error("[U004] Database error: {0}")]
    Db(#[from] sl_db::DbError),

    /// U005: Core error propagation
    #[error("[U005] Core error: {0}")]
    Core(#[from] sl_core::CoreError),

    /// U006: Template error propagation
    #[error("[U006] Render error: {0}")]
    Render(#[from] sl_render::RenderError),
}

/// Result type alias for UpdateError
pub type UpdateResult<T> = Result<T, UpdateError>;
