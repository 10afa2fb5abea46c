//! Error types for relfetch.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Every failure relfetch can report, from the release lookup through to
/// writing a downloaded asset.
#[derive(Debug, Error)]
pub enum Error {
    /// The repository, tag or latest release does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// GitHub rejected the supplied credentials (or their absence).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Connection failure, transport error or a non-success HTTP status.
    #[error("network error: {0}")]
    Network(String),

    /// The destination file could not be created.
    #[error("cannot create {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading the response body or writing it to disk failed mid-stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The API answered with a body that is not a release.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Setting up or drawing the terminal failed.
    #[error("terminal error: {0}")]
    Terminal(#[source] io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }
}

/// Convenience result type for relfetch operations.
pub type Result<T> = std::result::Result<T, Error>;
