//! Error types for model conversion.

use std::path::PathBuf;
use thiserror::Error;

/// Error classes surfaced by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ErrorCode {
    /// Wrong argument shape supplied to an adapter or codec (-1)
    InvalidInput = -1,
    /// An external tool exited non-zero or could not be spawned (-2)
    ToolFailed = -2,
    /// An expected intermediate file is absent (-3)
    MissingArtifact = -3,
    /// The running platform has no supported toolchain (-4)
    UnsupportedPlatform = -4,
    /// Filesystem error (-5)
    Io = -5,
    /// Malformed document content (-6)
    Parse = -6,
}

/// Main error type for the converter.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Command failed: {command}\n\n{log}")]
    ToolFailed { command: String, log: String },

    #[error("Missing artifact: {path}")]
    MissingArtifact { path: PathBuf },

    #[error("Unsupported platform: {platform}")]
    UnsupportedPlatform { platform: String },

    #[error("Parse error in {path} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// Shorthand for an [`ConvertError::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ConvertError::InvalidInput {
            message: message.into(),
        }
    }

    /// Get the error class for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ConvertError::InvalidInput { .. } => ErrorCode::InvalidInput,
            ConvertError::ToolFailed { .. } => ErrorCode::ToolFailed,
            ConvertError::MissingArtifact { .. } => ErrorCode::MissingArtifact,
            ConvertError::UnsupportedPlatform { .. } => ErrorCode::UnsupportedPlatform,
            ConvertError::Parse { .. } => ErrorCode::Parse,
            ConvertError::Json { .. } => ErrorCode::Parse,
            ConvertError::Io(_) => ErrorCode::Io,
        }
    }

    /// Get the numeric error code value.
    pub fn code_value(&self) -> i32 {
        self.code() as i32
    }
}

/// Result type alias for converter operations.
pub type Result<T> = std::result::Result<T, ConvertError>;
