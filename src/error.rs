use crate::schema::Column;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Failed to parse tabular payload: {0}")]
    Ingestion(#[from] csv::Error),

    #[error("Not enough time points for a degree-{degree} fit: need at least {needed}, got {got}")]
    InsufficientData {
        degree: usize,
        needed: usize,
        got: usize,
    },

    #[error("Unknown reducer '{0}': expected one of sum, mean, median, count")]
    UnknownReducer(String),

    #[error("Column '{0}' is not categorical and cannot be a grouping dimension")]
    NonCategoricalDimension(Column),

    #[error("Column '{0}' has no numeric reading and cannot be a measure")]
    NonNumericMeasure(Column),

    #[error("Regression error: {0}")]
    Regression(String),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExplorerError>;
