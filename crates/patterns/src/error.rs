use crate::ports::PortError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Signal fetch failed: {0}")]
    Fetch(#[source] PortError),

    #[error("Vector store error: {0}")]
    VectorStore(#[from] pattern_vector_store::VectorStoreError),

    #[error("Graph error: {0}")]
    Graph(#[from] pattern_graph::GraphError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
