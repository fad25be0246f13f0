//! Session and token file errors.

use thiserror::Error;

/// Failure of a session operation.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Token file could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Request to the authentication service failed
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
}

/// Token file errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read token file")]
    ReadFailed(#[source] std::io::Error),

    #[error("Failed to write token file")]
    WriteFailed(#[source] std::io::Error),

    #[error("Failed to remove token file")]
    DeleteFailed(#[source] std::io::Error),

    #[error("Token file is not a valid credential")]
    CorruptedData(#[source] serde_json::Error),

    #[error("Failed to encode credential")]
    EncodeFailed(#[source] serde_json::Error),
}

/// Failures talking to the authentication service.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Authentication service timed out")]
    Timeout,

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else if err.is_decode() {
            NetworkError::InvalidResponse(err.to_string())
        } else {
            NetworkError::RequestFailed(err.to_string())
        }
    }
}

/// Result of a session operation.
pub type AuthResult<T> = Result<T, AuthError>;
