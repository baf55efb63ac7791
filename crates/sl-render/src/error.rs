//! Error types for sl-render

use thiserror::Error;

/// Page rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// Template render error (R001)
    #[error("[R001] Template render error: {0}")]
    RenderFailed(String),

    /// Template not embedded in the binary (R002)
    #[error("[R002] Template '{0}' not found")]
    TemplateNotFound(String),
}

/// Result type alias for RenderError
pub type RenderResult<T> = Result<T, RenderError>;

impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        match err.kind() {
            minijinja::ErrorKind::TemplateNotFound => {
                RenderError::TemplateNotFound(err.detail().unwrap_or_default().to_string())
            }
            _ => RenderError::RenderFailed(err.to_string()),
        }
    }
}
