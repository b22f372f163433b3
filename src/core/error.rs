use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading, cleaning, analyzing or reporting on a dataset.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The input header does not carry every required column.
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A field in the input could not be interpreted.
    #[error("Invalid {column} value {value:?} on line {line}: {reason}")]
    Parse {
        line: u64,
        column: String,
        value: String,
        reason: String,
    },

    /// A calculation needs at least one record (or one value in a column).
    #[error("Dataset is empty: {0}")]
    EmptyDataset(String),

    /// The dataset and the analysis results describe different categories.
    #[error("Analysis results do not match dataset: {0}")]
    IncompatibleResults(String),

    /// A file could not be read or written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Building or sending the report email failed.
    #[error("Email transport failed: {0}")]
    Transport(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used by the pipeline modules.
pub type Result<T> = std::result::Result<T, PipelineError>;
