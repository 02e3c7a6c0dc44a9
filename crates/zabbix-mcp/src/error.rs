//! Lifecycle errors of the transports.

use std::time::Duration;
use thiserror::Error;

/// Server lifecycle failures.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound. Fatal.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server stopped with an error.
    #[error("HTTP server error: {0}")]
    Serve(#[source] std::io::Error),

    /// In-flight requests outlived the drain deadline.
    #[error("graceful shutdown did not finish within {0:?}")]
    DrainTimeout(Duration),

    /// Reading or writing the stdio stream failed.
    #[error("stdio transport error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for transport operations.
pub type ServerResult<T> = Result<T, ServerError>;
