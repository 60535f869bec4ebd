//! Backend error handling
//!
//! Every remote operation returns one of these - a transport failure or a
//! non-2xx response is classified here and never propagates as a panic or
//! an unclassified error.

use thiserror::Error;

/// Errors that can occur talking to a remote backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// No backend credentials are present
    #[error("No remote backend configured. Set Airtable or Supabase credentials in config.")]
    NotConfigured,

    /// Transport-level failure (connection refused, timeout, TLS, ...)
    #[error("HTTP transport error: {0}")]
    Http(String),

    /// The backend answered with a non-success status
    #[error("Remote API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The backend answered 2xx but the body wasn't what we expected
    #[error("Unexpected response from remote backend: {0}")]
    Unexpected(String),

    /// The configured backend doesn't implement this operation
    #[error("Operation not supported by the {0} backend")]
    Unsupported(&'static str),

    /// The operation requires a signed-in user
    #[error("Authentication required")]
    AuthRequired,
}

impl From<reqwest::Error> for BackendError {
    fn from(error: reqwest::Error) -> Self {
        BackendError::Http(error.to_string())
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;
