//! Unified error types for the wikistack pipeline.

use tokio_rusqlite::rusqlite;

/// Errors surfaced by the fetch layer, resolver, section pipeline, and cache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No response arrived within the per-call window.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Network/DNS/abort failure, or a non-success HTTP status.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote API answered but reported an application-level error.
    /// Carries the remote's own message verbatim.
    #[error("remote API error: {0}")]
    Remote(String),

    /// Response body was not the expected structured format.
    #[error("parse error: {0}")]
    Parse(String),

    /// The resolver determined the page does not exist, even after the
    /// search fallback.
    #[error("page not found: {0}")]
    MissingSource(String),

    /// A source URL could not be interpreted.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Snapshot file I/O failed.
    #[error("snapshot I/O error: {0}")]
    Snapshot(String),

    /// Durable store operation failed.
    #[error("cache database error: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("cache database error: migration failed: {0}")]
    MigrationFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl Error {
    /// True for failures the fetch layer is allowed to retry.
    ///
    /// A structurally valid error response from the remote API is final;
    /// only transport-level failures get another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Timeout(_) | Error::Transport(_) | Error::Parse(_))
    }
}
