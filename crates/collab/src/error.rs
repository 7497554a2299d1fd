//! Collaborator errors.

/// Error type for collaborator calls.
pub type Result<T> = std::result::Result<T, CollabError>;

/// Errors that can occur talking to external services.
#[derive(Debug, thiserror::Error)]
pub enum CollabError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Git operation error
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unexpected HTTP status
    #[error("{service} returned status {status} for {url}")]
    Status {
        /// Which collaborator
        service: &'static str,
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Failure worth retrying
    #[error("transient failure: {0}")]
    Transient(String),

    /// Failure not worth retrying
    #[error("{0}")]
    Fatal(String),
}

impl CollabError {
    /// Whether a retry may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Transient(_) => true,
            Self::Git(_) | Self::Json(_) | Self::Fatal(_) => false,
        }
    }
}
