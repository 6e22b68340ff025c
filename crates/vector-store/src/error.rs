use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Empty embedding")]
    EmptyEmbedding,

    #[error("Non-finite value at position {position}")]
    NonFinite { position: usize },

    #[error("Invalid similarity band: lower={lower}, upper={upper}")]
    InvalidBand { lower: f32, upper: f32 },

    #[error("Matrix shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}
