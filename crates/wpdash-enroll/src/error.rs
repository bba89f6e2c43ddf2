//! Error types for site enrollment.

/// Key conversion errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// The outer transport layer (base64) could not be removed.
    #[error("invalid transport encoding: {reason}")]
    Transport { reason: String },

    /// The decoded bytes are not a supported public key.
    #[error("malformed public key: {reason}")]
    MalformedKey { reason: String },

    /// The parsed key could not be written as OpenSSH text.
    #[error("failed to encode OpenSSH public key: {reason}")]
    Encode { reason: String },
}

/// Key store backend errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be read or written.
    #[error("key store unavailable: {message}")]
    Unavailable { message: String },

    /// The backend holds data it cannot interpret.
    #[error("key store corrupt: {message}")]
    Corrupt { message: String },
}

/// Enrollment errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// A required registration parameter is absent or empty.
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    /// The registration policy rejected the request.
    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// The candidate key could not be converted.
    #[error("key conversion failed: {0}")]
    ConversionFailed(#[from] ConversionError),

    /// The key store could not be read or written.
    #[error("storage unavailable: {message}")]
    StorageUnavailable { message: String },

    /// No original key has been registered yet.
    #[error("site is not registered: no public key stored")]
    NotRegistered,

    /// A stored value could not be interpreted.
    #[error("corrupt stored value for {key}: {reason}")]
    CorruptEntry { key: String, reason: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl RegistrationError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Caller errors
            Self::MissingField { .. } => 1,
            Self::Config { .. } => 1,
            Self::NotRegistered => 1,

            // Auth issues
            Self::Unauthorized { .. } => 2,

            // Key material
            Self::ConversionFailed(_) => 4,

            // Storage
            Self::StorageUnavailable { .. } => 5,
            Self::CorruptEntry { .. } => 6,
        }
    }

    /// Whether the error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }

    /// Whether the candidate key failed to parse as a public key.
    pub fn is_malformed_key(&self) -> bool {
        matches!(
            self,
            Self::ConversionFailed(ConversionError::MalformedKey { .. })
                | Self::ConversionFailed(ConversionError::Transport { .. })
        )
    }
}

impl From<StoreError> for RegistrationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable { message } => Self::StorageUnavailable { message },
            StoreError::Corrupt { message } => Self::CorruptEntry {
                key: "store".to_string(),
                reason: message,
            },
        }
    }
}

/// Result type for enrollment operations.
pub type EnrollResult<T> = Result<T, RegistrationError>;

/// Result type for key store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_storage_errors_are_retryable() {
        let storage = RegistrationError::from(StoreError::Unavailable {
            message: "disk full".into(),
        });
        assert!(storage.is_retryable());
        assert_eq!(storage.exit_code(), 5);

        let missing = RegistrationError::MissingField { field: "server" };
        assert!(!missing.is_retryable());
        assert_eq!(missing.to_string(), "missing required field: server");
    }

    #[test]
    fn test_malformed_key_classification() {
        let err = RegistrationError::from(ConversionError::MalformedKey {
            reason: "garbage".into(),
        });
        assert!(err.is_malformed_key());
        assert_eq!(err.exit_code(), 4);

        let encode = RegistrationError::from(ConversionError::Encode {
            reason: "comment".into(),
        });
        assert!(!encode.is_malformed_key());
    }
}
