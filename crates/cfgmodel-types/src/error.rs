use thiserror::Error;

/// Errors produced while constructing or converting foundation types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// A default value was rejected by its own checker.
    #[error("invalid default value {value:?}: rejected by checker ({reason})")]
    InvalidDefault { value: String, reason: String },

    /// A key name was empty or contained whitespace.
    #[error("invalid key name {0:?}")]
    InvalidKey(String),

    /// Text could not be parsed into a value.
    #[error("cannot parse {value:?}: {reason}")]
    Parse { value: String, reason: String },

    /// A parsed value cannot be rendered back to text by this parser.
    #[error("value not representable: {reason}")]
    Unrepresentable { reason: String },

    /// A parsed value was not of the requested kind.
    #[error("type mismatch: expected {expected}, got {actual}")]
    Mismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Convenience type alias for type-level operations.
pub type TypeResult<T> = std::result::Result<T, TypeError>;
