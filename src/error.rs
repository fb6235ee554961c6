use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Usage(String),

    #[error("{tool} not found at {path}. {hint}")]
    ToolMissing {
        tool: String,
        path: PathBuf,
        hint: String,
    },

    #[error("Cannot write {path}. {hint}")]
    NotWritable { path: PathBuf, hint: String },

    #[error("{tool} failed with {status}")]
    ToolFailed { tool: String, status: ExitStatusText },

    #[error("{stage} failed to produce expected output (missing {path})")]
    OutputMissing { stage: String, path: PathBuf },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Broad failure classes reported to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Usage,
    MissingDependency,
    SubprocessFailure,
    FileNotFound,
    Internal,
}

impl PipelineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::Usage(_) | PipelineError::Config(_) => ErrorCategory::Usage,
            PipelineError::ToolMissing { .. } => ErrorCategory::MissingDependency,
            PipelineError::ToolFailed { .. } | PipelineError::OutputMissing { .. } => {
                ErrorCategory::SubprocessFailure
            }
            PipelineError::FileNotFound(_) => ErrorCategory::FileNotFound,
            PipelineError::NotWritable { .. }
            | PipelineError::Io(_)
            | PipelineError::Http(_)
            | PipelineError::Toml(_)
            | PipelineError::Json(_) => ErrorCategory::Internal,
        }
    }
}

/// Exit status of a finished tool, rendered for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatusText(pub Option<i32>);

impl fmt::Display for ExitStatusText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(code) => write!(f, "exit code {}", code),
            None => write!(f, "termination by signal"),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
