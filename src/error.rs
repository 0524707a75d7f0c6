//! Error types for coursegen.

use crate::completion::CompletionError;
use serde::Serialize;
use thiserror::Error;

/// Library-level error type for coursegen operations.
#[derive(Error, Debug)]
pub enum CourseGenError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Completion service failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("Model returned invalid JSON after {attempts} attempt(s): {message}")]
    MalformedOutput { attempts: u32, message: String },

    #[error("Generated content failed validation: {0}")]
    Validation(String),

    #[error("Video search failed: {0}")]
    Search(String),

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Coarse classification of a failure, reported to callers instead of a bare message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Model output never parsed as JSON.
    Format,
    /// An upstream service (completion, search, transcription) failed.
    Service,
    /// Parsed output did not fit the result schema.
    Validation,
    /// The requested operation does not exist.
    NotFound,
    /// Caller-supplied arguments were missing or out of range.
    InvalidInput,
    Timeout,
    Config,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Format => "format",
            ErrorKind::Service => "service",
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CourseGenError {
    /// Classify this error for structured reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CourseGenError::Config(_) => ErrorKind::Config,
            CourseGenError::InvalidInput(_) => ErrorKind::InvalidInput,
            CourseGenError::UnknownOperation(_) => ErrorKind::NotFound,
            CourseGenError::Completion(CompletionError::Timeout(_)) => ErrorKind::Timeout,
            CourseGenError::Completion(_) => ErrorKind::Service,
            CourseGenError::MalformedOutput { .. } => ErrorKind::Format,
            CourseGenError::Validation(_) => ErrorKind::Validation,
            CourseGenError::Search(_)
            | CourseGenError::AudioDownload(_)
            | CourseGenError::Transcription(_)
            | CourseGenError::Http(_) => ErrorKind::Service,
            CourseGenError::Timeout(_) => ErrorKind::Timeout,
            CourseGenError::ToolNotFound(_) => ErrorKind::Config,
            CourseGenError::TomlParse(_) => ErrorKind::Config,
            CourseGenError::Io(_) | CourseGenError::Json(_) => ErrorKind::Internal,
        }
    }
}

/// Result type alias for coursegen operations.
pub type Result<T> = std::result::Result<T, CourseGenError>;
