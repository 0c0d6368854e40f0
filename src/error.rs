//! Error handling for aymix
//!
//! Every fatal condition of the render pipeline maps to one variant. Each
//! error carries a stable code and recovery suggestions for the CLI.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for aymix operations
pub type Result<T> = std::result::Result<T, AymixError>;

/// Main error type for aymix operations
#[derive(Error, Debug)]
pub enum AymixError {
    // Input Errors
    #[error("Channel dump not found: {}", path.display())]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read channel dump {}: {source}", path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Channel dumps contain no samples to render")]
    EmptyInput,

    // Output Errors
    #[error("FLAC encoding failed: {reason}")]
    Encode { reason: String },

    #[error("Failed to write {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AymixError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            AymixError::InputNotFound { .. } => "INPUT_NOT_FOUND",
            AymixError::InputRead { .. } => "INPUT_READ",
            AymixError::EmptyInput => "EMPTY_INPUT",
            AymixError::Encode { .. } => "ENCODE",
            AymixError::OutputWrite { .. } => "OUTPUT_WRITE",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            AymixError::InputNotFound { .. } => vec![
                "Pass the common prefix of the dumps, not one of the dump files",
                "The renderer must have written <basename>_a, <basename>_b and <basename>_c",
            ],
            AymixError::InputRead { .. } => vec![
                "Check the dump files are readable by the current user",
            ],
            AymixError::EmptyInput => vec![
                "At least one of the dumps is empty or too short to produce a 48 kHz sample",
                "Re-run the renderer for a longer capture",
            ],
            AymixError::OutputWrite { .. } => vec![
                "Check the output directory is writable",
                "Free up disk space",
            ],
            _ => vec![],
        }
    }

    /// Build an input error, telling a missing file apart from other failures
    pub(crate) fn input(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            AymixError::InputNotFound { path, source }
        } else {
            AymixError::InputRead { path, source }
        }
    }
}
