use thiserror::Error;

/// Failures of the grouping core. None of them are transient.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GroupingError {
    #[error("embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("descriptor {index} has a non-finite embedding value at position {position}")]
    NonFiniteEmbedding { index: usize, position: usize },

    #[error("invalid grouping configuration: {0}")]
    InvalidConfig(String),

    #[error("no group with id {0}")]
    UnknownGroup(usize),
}
