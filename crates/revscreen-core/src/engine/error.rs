use super::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a run. Row-level and task-level problems never surface here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Model database directory not found: {path}")]
    DatabaseNotFound { path: PathBuf },

    #[error("No .pm model files found in database directory: {path}")]
    EmptyDatabase { path: PathBuf },

    #[error("No valid queries found ({skipped} row(s) skipped)")]
    EmptyQuerySet { skipped: usize },

    #[error("Results file not found: {path}")]
    ResultsNotFound { path: PathBuf },

    #[error("Results file contains no rows: {path}")]
    EmptyResults { path: PathBuf },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Internal logic error: {0}")]
    Internal(String),
}
