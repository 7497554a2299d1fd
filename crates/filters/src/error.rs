//! Filter errors.

use ciselect_core::{AttributeError, ParameterError};

/// Error type for filter evaluation.
pub type Result<T> = std::result::Result<T, FilterError>;

/// Errors that can occur while evaluating a filter.
///
/// All of these point at a broken task definition or a malformed push, never
/// at a task that merely lacks an optional attribute.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// Attribute with the wrong type
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// Parameter missing or mistyped
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// Pattern does not compile
    #[error("invalid pattern '{pattern}': {source}")]
    Regex {
        /// The offending pattern
        pattern: String,
        /// Compiler error
        #[source]
        source: regex::Error,
    },

    /// Unknown regex filter mode
    #[error("unknown regex filter mode '{0}', expected 'include' or 'exclude'")]
    Mode(String),
}
