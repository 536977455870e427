//! Error types for graph construction and type introspection.

/// Error type for graph kernel operations.
///
/// Every variant is surfaced synchronously to the immediate caller.
/// Traversal is deterministic, so none of these are retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Element classes were requested from a container type whose
    /// generic arguments are not concretely known.
    #[error("Generic type not parametrized: {base_type}")]
    GenericTypeNotParametrized {
        /// Textual form of the unresolved base type.
        base_type: String,
    },

    /// A mandatory value was missing or had the wrong shape.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A value used as a graph node is not an Entity or ValueObject.
    #[error("Type is not managed (expected Entity or ValueObject): {type_name}")]
    NotManaged {
        /// Name of the offending type.
        type_name: String,
    },

    /// The traversal went deeper than the configured bound.
    #[error("Traversal depth limit exceeded: {limit}")]
    DepthLimitExceeded {
        /// The configured limit.
        limit: usize,
    },
}

impl GraphError {
    /// Create a not-parametrized error from any displayable type.
    pub fn not_parametrized(base_type: impl std::fmt::Display) -> Self {
        Self::GenericTypeNotParametrized {
            base_type: base_type.to_string(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a not-managed error.
    pub fn not_managed(type_name: impl std::fmt::Display) -> Self {
        Self::NotManaged {
            type_name: type_name.to_string(),
        }
    }
}

/// Result alias for graph kernel operations.
pub type GraphResult<T> = Result<T, GraphError>;
