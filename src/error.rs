//! Error types.
//!
//! - `CzmError`: failure kinds raised by the numeric core and the IO layer.
//! - `AppError`: what the binary reports (message + process exit code).
//!
//! Exit codes: 2 = input/IO/config, 3 = no usable data, 4 = numeric failure,
//! 5 = external job failure.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for library operations.
pub type Result<T> = std::result::Result<T, CzmError>;

#[derive(Debug, Error)]
pub enum CzmError {
    /// Non-positive geometry, zero rigidity, square root of a negative, ...
    #[error("arithmetic domain error: {0}")]
    Domain(String),

    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("insufficient data: need at least {needed} point(s), got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("columns are misaligned at row {row}: x and y must be missing together")]
    MisalignedColumns { row: usize },

    #[error("column {index} out of range (table has {width} columns)")]
    ColumnOutOfRange { index: usize, width: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("fit did not converge after {iterations} iterations: {reason}")]
    Convergence { iterations: usize, reason: String },

    #[error("input deck error: {0}")]
    Deck(String),

    #[error("job error: {0}")]
    Job(String),

    #[error("failed to access '{}': {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CzmError {
    /// Attach a path to an IO error.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CzmError::File {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this failure kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            CzmError::InvalidArgument(_)
            | CzmError::ColumnOutOfRange { .. }
            | CzmError::Deck(_)
            | CzmError::File { .. }
            | CzmError::Io(_)
            | CzmError::Csv(_)
            | CzmError::Json(_) => 2,
            CzmError::EmptyInput(_)
            | CzmError::InsufficientData { .. }
            | CzmError::MisalignedColumns { .. } => 3,
            CzmError::Domain(_) | CzmError::Convergence { .. } => 4,
            CzmError::Job(_) => 5,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<CzmError> for AppError {
    fn from(err: CzmError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
