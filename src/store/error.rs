use std::io;

/// Errors surfaced by every fallible `BlobStore` operation.
///
/// `io::Error` is never handed back directly; it is always wrapped so the
/// error surface stays closed and matchable.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("insufficient space: need {needed} bytes, {available} available")]
    InsufficientSpace { needed: i64, available: i64 },

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] io::Error),

    #[error("io failure: {0}")]
    IoFailure(#[source] io::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IoFailure(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
