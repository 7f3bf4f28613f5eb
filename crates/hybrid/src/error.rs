use crate::types::{MovieId, UserId};
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, HybridError>;

#[derive(Debug, thiserror::Error)]
pub enum HybridError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV error in {}: {source}", .path.display())]
    CsvFile {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown user id: {0}")]
    UnknownUser(UserId),

    #[error("Unknown movie id: {0}")]
    UnknownMovie(MovieId),

    #[error("No internal index {index} in {space} mapping")]
    UnknownInternalIndex { space: &'static str, index: usize },

    #[error("No feature row for movie id {0}")]
    MissingItemFeatures(MovieId),

    #[error("Feature matrix has {actual} rows but the interaction matrix has {expected} items")]
    FeatureMisaligned { expected: usize, actual: usize },

    #[error("Invalid score at index {index}: non-finite or not a number")]
    InvalidScore { index: usize },

    #[error("Model not trained yet")]
    NotTrained,

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Empty dataset: {0}")]
    EmptyDataset(String),
}

impl From<config::ConfigError> for HybridError {
    fn from(err: config::ConfigError) -> Self {
        HybridError::Config(err.to_string())
    }
}
