//! Fixture source error types.

use thiserror::Error;

/// Errors that can occur when fetching assessments from a source.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// No assessment with this id exists at the source.
    #[error("assessment not found: {0}")]
    NotFound(String),

    /// The source returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The source returned data that is not a valid assessment.
    #[error("malformed assessment data: {0}")]
    Malformed(String),
}
