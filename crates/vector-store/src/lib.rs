//! # Pattern Vector Store
//!
//! Embedding validation and vectorized cross-domain similarity.
//!
//! ## Architecture
//!
//! ```text
//! Signal[]
//!     │
//!     ├──> Partition by domain tag
//!     │      └─> one embedding matrix per domain (rows L2-normalized)
//!     │
//!     ├──> For every pair of domains
//!     │      └─> A · Bᵀ  (full cosine matrix, one multiplication)
//!     │
//!     └──> Band filter (lower < sim < upper)
//!            └─> CrossDomainLink[] sorted by similarity
//! ```

mod embedding;
mod error;
mod links;

pub use embedding::validate_embedding;
pub use error::{Result, VectorStoreError};
pub use links::{LinkDetector, SimilarityBand};
