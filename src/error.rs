// Typed error taxonomy shared across the engine and the HTTP layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A required request field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The retriever produced no results, or a requested file does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The session id does not resolve to a live session (never created,
    /// already purged, or its staging directory vanished mid-operation).
    #[error("invalid session: {0}")]
    InvalidSession(String),

    /// A filesystem operation failed unexpectedly.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The image provider failed (network error, timeout, bad status).
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Archive encoding failed.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_session(id: impl Into<String>) -> Self {
        Self::InvalidSession(id.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
