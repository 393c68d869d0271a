//! Error types and exit codes for injectlint

use std::process::ExitCode;
use thiserror::Error;

/// Main error type for injectlint operations
#[derive(Error, Debug)]
pub enum LintError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse file: {message}")]
    ParseFailure { message: String },

    #[error("Failed to render report: {message}")]
    ReportFailure { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LintError {
    /// Convert error to appropriate exit code:
    /// - 0: Success, no findings
    /// - 1: Findings reported (not an error variant; set by the CLI)
    /// - 2: File not found / IO error
    /// - 3: Parse failure
    /// - 4: Report rendering failure
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::FileNotFound { .. } => ExitCode::from(2),
            Self::ParseFailure { .. } => ExitCode::from(3),
            Self::ReportFailure { .. } => ExitCode::from(4),
            Self::Io(_) => ExitCode::from(2),
        }
    }
}

/// Result type alias for injectlint operations
pub type Result<T> = std::result::Result<T, LintError>;
