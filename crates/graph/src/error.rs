use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Invalid cluster bounds: min_size={min_size}, max_size={max_size} (need 2 <= min <= max)")]
    InvalidBounds { min_size: usize, max_size: usize },
}
