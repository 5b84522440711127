use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort processing of a single input and are raised to the caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input file not found: {0}")]
    InputNotFound(String),
    #[error("cannot derive target year/month from file name: {0}")]
    FileName(String),
    #[error("failed to decode {path} with any of [{tried}]")]
    Decode { path: PathBuf, tried: String },
    #[error("config invalid or unreadable: {0}")]
    Config(String),
    #[error("io failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageErrorKind {
    /// A required column, row or companion file is absent.
    Structural,
    Unexpected,
}

impl StageErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Unexpected => "unexpected",
        }
    }
}

/// Error descriptor produced by a stage; the pipeline turns it into an error artifact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StageError {
    pub kind: StageErrorKind,
    pub message: String,
}

impl StageError {
    pub fn structural(message: impl Into<String>) -> Self {
        Self {
            kind: StageErrorKind::Structural,
            message: message.into(),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self {
            kind: StageErrorKind::Unexpected,
            message: message.into(),
        }
    }

    /// Minimum header width check shared by the positional stages.
    pub fn require_columns(
        column_count: usize,
        required: usize,
        columns_label: &str,
    ) -> Result<(), Self> {
        if column_count >= required {
            return Ok(());
        }
        let noun = if columns_label.contains(['-', '/']) {
            "columns"
        } else {
            "column"
        };
        let verb = if noun == "columns" { "do" } else { "does" };
        Err(Self::structural(format!(
            "Error: required {noun} {columns_label} {verb} not exist (need at least {required} columns). ColumnCount = {column_count}"
        )))
    }
}

pub type StageOutcome<T> = Result<T, StageError>;
