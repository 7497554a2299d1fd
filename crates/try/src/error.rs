//! Try syntax errors.

use ciselect_core::AttributeError;
use ciselect_filters::FilterError;

/// Error type for try syntax parsing and matching.
pub type Result<T> = std::result::Result<T, TrySyntaxError>;

/// Errors reported to the developer who pushed the try syntax.
#[derive(Debug, thiserror::Error)]
pub enum TrySyntaxError {
    /// Unbalanced quote in the try line
    #[error("unterminated quote in try syntax: {0}")]
    UnterminatedQuote(String),

    /// Flag given a value it cannot accept
    #[error("invalid value '{value}' for {flag}")]
    InvalidValue {
        /// Flag as written
        flag: String,
        /// Offending value
        value: String,
    },

    /// Flag that needs a value came last
    #[error("{0} expects a value")]
    MissingValue(String),

    /// Build types absent from the graph
    #[error("unknown build type(s) [{}] specified for try", .0.join(","))]
    UnknownBuildTypes(Vec<String>),

    /// Platforms absent from the graph
    #[error("unknown platform(s) [{}] specified for try", .0.join(","))]
    UnknownPlatforms(Vec<String>),

    /// Task attribute with the wrong type
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// Matcher failure
    #[error(transparent)]
    Filter(#[from] FilterError),
}
