//! Error types and handling for postal-facade.

use crate::provider::Subsystem;
use std::path::PathBuf;

/// Result type alias for startup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while bringing libpostal up.
///
/// Every variant is fatal for the context being built. Per-call problems are
/// reported as [`Rejection`] instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A native subsystem reported failure during setup
    #[error("Failed to load libpostal {subsystem} subsystem")]
    SetupFailed {
        /// The subsystem that did not load
        subsystem: Subsystem,
    },

    /// The linked library is already owned by a live context
    #[error("libpostal is already initialized by another context in this process")]
    AlreadyInitialized,

    /// A data file required by a subsystem is missing or empty
    #[error("Missing data for libpostal {subsystem} subsystem: {}", path.display())]
    MissingData {
        /// The subsystem the file belongs to
        subsystem: Subsystem,
        /// The file that was expected
        path: PathBuf,
    },

    /// The data directory cannot be handed to C
    #[error("Invalid libpostal data directory: {}", path.display())]
    InvalidDataDir {
        /// The offending path
        path: PathBuf,
    },

    /// I/O errors
    #[error("I/O error: {source}")]
    IoError {
        /// Source error
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a new setup error
    pub fn setup_failed(subsystem: Subsystem) -> Self {
        Self::SetupFailed { subsystem }
    }

    /// Create a new missing-data error
    pub fn missing_data(subsystem: Subsystem, path: impl Into<PathBuf>) -> Self {
        Self::MissingData {
            subsystem,
            path: path.into(),
        }
    }

    /// Create a new invalid data directory error
    pub fn invalid_data_dir(path: impl Into<PathBuf>) -> Self {
        Self::InvalidDataDir { path: path.into() }
    }
}

/// Why a parse or expand call produced no result.
///
/// The plain `parse_address`/`expand_address` calls fold all of these into
/// `None`; the `try_*` variants hand them back to callers that want to tell
/// bad input apart from an empty answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The address bytes are not valid UTF-8
    #[error("address is not valid UTF-8")]
    InvalidEncoding,

    /// A string bound for C contains a NUL byte
    #[error("{field} contains an interior NUL byte")]
    InteriorNul {
        /// Which input carried the NUL
        field: &'static str,
    },

    /// libpostal returned a null response
    #[error("libpostal returned no response")]
    ProviderMiss,
}
