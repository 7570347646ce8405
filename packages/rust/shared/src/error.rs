//! Error types for bookrelease.
//!
//! Library crates use [`BookReleaseError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::fmt;
use std::path::PathBuf;

/// A required input file that was not found during preflight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingInput {
    /// Path that was expected to exist.
    pub path: PathBuf,
    /// Command the user should run to produce it.
    pub remedy: String,
}

impl fmt::Display for MissingInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (run: {})", self.path.display(), self.remedy)
    }
}

/// Top-level error type for all bookrelease operations.
#[derive(Debug, thiserror::Error)]
pub enum BookReleaseError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// One or more required input files are missing.
    #[error("missing required input(s):\n{}", list_missing(.0))]
    MissingInputs(Vec<MissingInput>),

    /// A required external program is not on `PATH`.
    #[error("required tool `{program}` not found on PATH")]
    ToolNotFound { program: String },

    /// A script the external toolchain runs does not exist.
    #[error("required script {path:?} not found")]
    ScriptNotFound { path: PathBuf },

    /// An external program ran but exited unsuccessfully.
    #[error("{tool} failed with status {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: i32,
        stderr: String,
    },

    /// A stage finished without producing its expected output.
    #[error("{stage}: expected output {path:?} was not produced")]
    OutputMissing { stage: String, path: PathBuf },

    /// PDF parsing or writing error in the built-in PDF tools.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Release creation error.
    #[error("publish error: {0}")]
    Publish(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (page counts, repository names, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

fn list_missing(missing: &[MissingInput]) -> String {
    missing
        .iter()
        .map(|m| format!("  - {m}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BookReleaseError>;

impl BookReleaseError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// A stage did not leave its output behind.
    pub fn output_missing(stage: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::OutputMissing {
            stage: stage.into(),
            path: path.into(),
        }
    }
}
