//! Unified error types for the portico gateway.

use tokio_rusqlite::rusqlite;

/// Unified error type for gateway, cache, and network operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Precaching a manifest path failed; fatal to that install attempt.
    #[error("install failed: {0}")]
    InstallFailed(String),

    /// Transport-level network failure (DNS, connect, timeout, read).
    ///
    /// HTTP error statuses are not errors at this layer; they come back
    /// as a [`Response`](crate::Response) with the status set.
    #[error("network fetch failed: {0}")]
    Network(String),

    /// Response body exceeded the configured size limit.
    #[error("fetch too large: {0}")]
    FetchTooLarge(String),

    /// A URL could not be parsed or resolved against the site origin.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A stored entry could not be decoded back into a response.
    #[error("corrupt cache entry: {0}")]
    CorruptEntry(String),

    /// Database operation failed.
    #[error("cache store error: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("cache store error: migration failed: {0}")]
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InstallFailed("/index.html: connection refused".to_string());
        assert!(err.to_string().contains("install failed"));
        assert!(err.to_string().contains("/index.html"));
    }

    #[test]
    fn test_network_error_display() {
        let err = Error::Network("dns failure".to_string());
        assert!(err.to_string().contains("network fetch failed"));
    }
}
