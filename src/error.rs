use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the archive-creation engine.
///
/// Every failure is fatal to the whole run: the engine never retries an
/// entry, and the caller decides whether to re-run the operation. The
/// variants follow the failure taxonomy of the engine boundary:
///
/// - [`ZipError::InvalidRequest`]: the request was rejected before any
///   output byte was written (empty input list, unusable output location).
/// - [`ZipError::SourceRead`]: a named input could not be opened or failed
///   mid-read.
/// - [`ZipError::SinkWrite`]: the output stream failed (disk full,
///   permission, device fault).
/// - [`ZipError::Codec`]: the DEFLATE encoder violated an internal
///   invariant; not expected for well-formed input and never retried.
/// - [`ZipError::Cancelled`]: the caller's advisory cancellation flag was
///   observed between entries.
#[derive(Error, Debug)]
pub enum ZipError {
    /// The request was malformed or the output location unusable before
    /// any write was attempted.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An input file could not be opened or failed during reading.
    #[error("cannot read source {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive output stream failed.
    #[error("cannot write archive output: {0}")]
    SinkWrite(#[source] std::io::Error),

    /// The compression codec failed internally.
    #[error("deflate encoder failed: {0}")]
    Codec(String),

    /// The run was cancelled between entries at the caller's request.
    #[error("archive creation cancelled")]
    Cancelled,
}

impl ZipError {
    pub(crate) fn source_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ZipError::SourceRead {
            path: path.into(),
            source,
        }
    }
}

/// Convenient crate-wide result type.
pub type Result<T> = std::result::Result<T, ZipError>;
