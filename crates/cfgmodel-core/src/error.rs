use cfgmodel_types::{ConfigKey, TypeError};

/// Errors from configuration model operations.
///
/// "Nothing changed" is not an error: adding a present key, removing an
/// absent key, or setting a value on an absent key all return `Ok(false)`.
/// Errors are reserved for misuse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Construction or conversion of a foundation type failed.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// A mutation was attempted through a read-only handle.
    #[error("unsupported operation: {operation}")]
    Unsupported { operation: &'static str },

    /// The key is not present in the store.
    #[error("key not found: {0}")]
    KeyNotFound(ConfigKey),

    /// Typed access was requested for a key without a value parser.
    #[error("no value parser registered for key {0}")]
    MissingParser(ConfigKey),

    /// The parsed value is not of the requested type.
    #[error("type mismatch for key {key}: expected {expected}, got {actual}")]
    TypeMismatch {
        key: ConfigKey,
        expected: &'static str,
        actual: &'static str,
    },

    /// A lock guarding a shared store was poisoned.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// A loader could not apply a value.
    #[error("cannot load {key}: {reason}")]
    Load { key: String, reason: String },

    /// A saver could not capture a value.
    #[error("cannot save {key}: {reason}")]
    Save { key: String, reason: String },
}

impl ConfigError {
    /// Create an unsupported-operation error.
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Returns `true` for [`ConfigError::Unsupported`].
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// Convenience type alias for model operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
