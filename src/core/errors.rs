// src/core/errors.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExplainError {
    /// Adjacency, feature, concept or label dimensions disagree.
    #[error("Shape Mismatch: {0}")]
    ShapeMismatch(String),
    /// A value is outside the domain an operation is defined on
    /// (non-increasing keep numbers, empty class pool, ...).
    #[error("Invalid Domain: {0}")]
    InvalidDomain(String),
    /// A histogram was requested over values with zero range.
    #[error("Degenerate Histogram: {0}")]
    DegenerateHistogram(String),
    #[error("Invalid Input: {0}")]
    InvalidInput(String),
    #[error("Model Error: {0}")]
    Model(String),
    #[error("Internal Error: {0}")]
    Internal(String),
    #[error("Ndarray Error: {0}")]
    Ndarray(#[from] ndarray::ShapeError),
}

// Convenience type alias for Result
pub type Result<T> = std::result::Result<T, ExplainError>;
