//! # Pattern Engine
//!
//! Discovers emergent relationships between signals of different domains and
//! turns them into insights.
//!
//! ## Pipeline
//!
//! ```text
//! SignalRepository
//!     │
//!     ├──> Ingest (dimension check, per-signal rejection)
//!     │
//!     ├──> LinkDetector (vectorized cosine, open band)
//!     │
//!     ├──> ClusterBuilder (union-find, diversity cap, ranking)
//!     │
//!     ├──> InsightSynthesizer (TextGenerator, timeout, validation)
//!     │
//!     ├──> Deduplicator (Jaccard vs stored + accepted)
//!     │
//!     └──> InsightStore
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use pattern_engine::{
//!     run_pattern_detection, EngineConfig, JsonInsightStore, JsonSignalRepository,
//!     PortError, SynthesisRequest, TextGenerator,
//! };
//!
//! struct Echo;
//!
//! #[async_trait::async_trait]
//! impl TextGenerator for Echo {
//!     async fn synthesize(&self, _request: &SynthesisRequest) -> Result<String, PortError> {
//!         Ok(r#"{"title":"Transit meets housing","confidence":0.8}"#.to_string())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = JsonSignalRepository::new("signals.json");
//!     let store = JsonInsightStore::new("insights.json");
//!     let summary =
//!         run_pattern_detection(&repo, &store, &Echo, &EngineConfig::default()).await?;
//!     println!("{} insights stored", summary.insights_stored);
//!     Ok(())
//! }
//! ```

mod config;
mod dedup;
mod error;
mod json_store;
mod orchestrator;
mod ports;
mod synthesizer;
mod text;

pub use config::EngineConfig;
pub use dedup::{jaccard, DedupOutcome, Deduplicator};
pub use error::{EngineError, Result};
pub use json_store::{JsonInsightStore, JsonSignalRepository};
pub use orchestrator::run_pattern_detection;
pub use ports::{InsightStore, PortError, SignalRepository, SynthesisRequest, TextGenerator};
pub use synthesizer::{
    describe_cluster, parse_insight_reply, InsightSynthesizer, SynthesisFailure, SynthesisOutcome,
};
