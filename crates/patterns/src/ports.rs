//! Collaborator boundaries. The engine only talks to storage and the text
//! model through these traits.

use async_trait::async_trait;
use pattern_protocol::{Insight, Signal};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Rejected by backend: {0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Source of active signals.
#[async_trait]
pub trait SignalRepository: Send + Sync {
    /// Up to `max_n` active signals. Records without an embedding or a domain
    /// tag are never returned.
    async fn fetch_active_with_embeddings(&self, max_n: usize) -> Result<Vec<Signal>, PortError>;
}

/// Durable home of synthesized insights.
#[async_trait]
pub trait InsightStore: Send + Sync {
    /// `related_signal_ids` of every active insight, for deduplication.
    async fn fetch_active_related_id_sets(&self) -> Result<Vec<BTreeSet<String>>, PortError>;

    async fn persist(&self, insight: &Insight) -> Result<(), PortError>;
}

/// Input handed to the text generator for one cluster.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub description: String,
    pub affected_domains: Vec<String>,
    /// JSON Schema the reply is expected to satisfy
    pub response_schema: serde_json::Value,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Raw JSON text describing one insight.
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<String, PortError>;
}
