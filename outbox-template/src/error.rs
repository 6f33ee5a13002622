//! Error types for template rendering.

use thiserror::Error;

/// Rendering error type.
///
/// Missing variables are not an error (they render as empty strings); the
/// only way rendering fails is asking for a template that was never
/// registered.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// No template registered under this id.
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),
}

/// Specialized `Result` type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;
