//! Error types for credential operations.

/// Result type alias for credential operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Credential error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to access the system keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// Token is not a decodable JWT.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// The `exp` claim is outside the representable time range.
    #[error("Token expiry out of range: {0}")]
    ExpiryOutOfRange(f64),
}

impl Error {
    /// Creates a malformed token error.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedToken(reason.into())
    }
}
