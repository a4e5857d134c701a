//! Error types for viewcast-core

use thiserror::Error;

/// Result type alias for viewcast-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving a projection
#[derive(Error, Debug)]
pub enum Error {
    /// A projectable or its configuration is structurally unusable:
    /// its source document cannot be produced, or a template/mapping
    /// declaration is invalid. Never retried.
    #[error("invalid declaration: {message}")]
    Declaration {
        /// Description of what's invalid
        message: String,
    },

    /// A field's mapping rule failed while producing its value
    #[error("field '{field}' failed to resolve: {message}")]
    FieldResolution {
        /// Name of the field under resolution
        field: String,
        /// Description of the failure
        message: String,
    },

    /// A sequence element's recursive resolution failed, aborting the
    /// containing field
    #[error("element {index} failed to resolve: {message}")]
    ElementResolution {
        /// Zero-based position of the element in the sequence
        index: usize,
        /// Description of the failure
        message: String,
    },

    /// A caller-supplied mapping closure reported a failure
    #[error("mapping error: {message}")]
    Mapping {
        /// Description of the failure
        message: String,
    },

    /// Template serialization/deserialization error
    #[error("template error: {0}")]
    Template(#[from] serde_json::Error),
}

impl Error {
    /// Build a [`Error::Mapping`] from any displayable message.
    ///
    /// Convenience constructor for mapping closures:
    ///
    /// ```rust,ignore
    /// table.sync_fn("total", |order| {
    ///     order.total().map(Raw::from).map_err(Error::mapping)
    /// });
    /// ```
    pub fn mapping(message: impl std::fmt::Display) -> Self {
        Self::Mapping {
            message: message.to_string(),
        }
    }

    /// Build a [`Error::Declaration`] from any displayable message.
    pub fn declaration(message: impl std::fmt::Display) -> Self {
        Self::Declaration {
            message: message.to_string(),
        }
    }
}
