use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Classification of every way a generation request can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ToolNotFound,
    OutputDirectoryUnavailable,
    LaunchFailure,
    TimedOut,
    Cancelled,
    ProcessExitNonZero,
    OutputMissing,
    OutputEmpty,
    OutputUnreadable,
    OutputBlank,
    OutputMalformed,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::ToolNotFound => "tool not found",
            ErrorKind::OutputDirectoryUnavailable => "output directory unavailable",
            ErrorKind::LaunchFailure => "launch failure",
            ErrorKind::TimedOut => "timed out",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::ProcessExitNonZero => "non-zero exit",
            ErrorKind::OutputMissing => "output missing",
            ErrorKind::OutputEmpty => "output empty",
            ErrorKind::OutputUnreadable => "output unreadable",
            ErrorKind::OutputBlank => "output blank",
            ErrorKind::OutputMalformed => "output malformed",
        };
        write!(f, "{}", name)
    }
}

/// A classified failure with a human-readable diagnosis
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct GenerationError {
    pub kind: ErrorKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn tool_not_found(searched: &[PathBuf]) -> Self {
        let listing = searched
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Self::new(
            ErrorKind::ToolNotFound,
            format!(
                "UML generator jar not found (searched: {}). Configure it with --tool, UMLGEN_TOOL_PATH or generator.tool_path",
                if listing.is_empty() { "nothing" } else { listing.as_str() }
            ),
        )
    }

    pub fn output_directory(dir: &Path, err: std::io::Error) -> Self {
        Self::new(
            ErrorKind::OutputDirectoryUnavailable,
            format!("Could not create output directory {}: {}", dir.display(), err),
        )
    }

    pub fn launch(program: &Path, err: std::io::Error) -> Self {
        Self::new(
            ErrorKind::LaunchFailure,
            format!("Failed to start {}: {}", program.display(), err),
        )
    }

    pub fn timed_out(limit: Duration) -> Self {
        Self::new(
            ErrorKind::TimedOut,
            format!("Generator did not finish within {:?} and was killed", limit),
        )
    }

    pub fn cancelled(input: &Path) -> Self {
        Self::new(
            ErrorKind::Cancelled,
            format!("Generation for {} was cancelled", input.display()),
        )
    }
}

/// Terminal result of one request
#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    Success { output_file_path: PathBuf },
    Failure { kind: ErrorKind, message: String },
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            GenerationOutcome::Success { .. } => None,
            GenerationOutcome::Failure { kind, .. } => Some(*kind),
        }
    }
}

impl From<Result<PathBuf, GenerationError>> for GenerationOutcome {
    fn from(result: Result<PathBuf, GenerationError>) -> Self {
        match result {
            Ok(output_file_path) => GenerationOutcome::Success { output_file_path },
            Err(e) => GenerationOutcome::Failure {
                kind: e.kind,
                message: e.message,
            },
        }
    }
}
