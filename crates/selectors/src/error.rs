//! Selection errors.

use ciselect_collab::CollabError;
use ciselect_core::{AttributeError, ParameterError};
use ciselect_filters::FilterError;
use ciselect_try::TrySyntaxError;

use crate::registry::RegistryError;

/// Error type for selection.
pub type Result<T> = std::result::Result<T, SelectError>;

/// Errors that abort a selection.
#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    /// Malformed task attribute
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// Missing or malformed parameter
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// Filter failure (bad regex, bad attribute)
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// Invalid try syntax in the push message
    #[error("invalid try syntax: {0}")]
    TrySyntax(#[from] TrySyntaxError),

    /// Collaborator failed after retries
    #[error("collaborator error: {0}")]
    Collab(#[from] CollabError),

    /// Unknown or clashing selector name
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A selector returned a label missing from the graph
    #[error("selector '{selector}' returned unknown label '{label}'")]
    UnknownLabel {
        /// Selector name
        selector: String,
        /// Offending label
        label: String,
    },

    /// Release simulation for a release type with no matching project
    #[error("unknown or unspecified release type '{0}' in simulation run")]
    SimulationReleaseType(String),

    /// Graph config lacks a key a selector needs
    #[error("graph config is missing '{0}'")]
    MissingConfig(&'static str),
}
