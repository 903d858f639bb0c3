//! Error types for serial-bridge.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for serial-bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for serial-bridge operations.
///
/// "No data yet" and "nothing accepted yet" are never errors: the transport
/// reports them as a zero count. The variants below are genuine faults.
#[derive(Debug, Error)]
pub enum Error {
    /// The device is missing, busy, inaccessible or refused the link settings.
    #[error("Failed to open {path}: {source}")]
    Open {
        /// Device path that was requested.
        path: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Fatal I/O fault while sending.
    #[error("Write failed: {0}")]
    Write(#[source] io::Error),

    /// Fatal I/O fault while receiving.
    #[error("Read failed: {0}")]
    Read(#[source] io::Error),

    /// The byte source for a file transfer could not be opened.
    #[error("Cannot open source {}: {source}", path.display())]
    SourceUnavailable {
        /// Path of the source file.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// An operation needed a live link but none was open.
    #[error("Port is not open")]
    NotOpen,

    /// Terminal attributes could not be read or applied.
    #[error("Terminal error: {0}")]
    Terminal(#[source] io::Error),

    /// Any other I/O error (source reads, standard streams).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Build an [`Error::Open`] for `path`.
    pub fn open(path: impl Into<String>, source: impl Into<io::Error>) -> Self {
        Self::Open {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Whether an I/O error only means "no progress right now" on a
/// non-blocking handle.
pub(crate) fn is_no_progress(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}
