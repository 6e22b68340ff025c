//! # Pattern Graph
//!
//! Groups cross-domain links into disjoint clusters of related signals.
//!
//! ## Architecture
//!
//! ```text
//! CrossDomainLink[]
//!     │
//!     ├──> Disjoint set (union by size, full path compression)
//!     │      └─ running similarity sum/count per root
//!     │
//!     ├──> Connected components
//!     │      ├─ drop: fewer than 2 domains
//!     │      └─ drop: fewer than min_size members
//!     │
//!     ├──> Size cap
//!     │      ├─ one signal per domain (encounter order)
//!     │      └─ fill from leftovers (encounter order)
//!     │
//!     └──> Rank by (domain count, avg similarity) descending
//! ```

mod builder;
mod error;
mod types;
mod union_find;

pub use builder::ClusterBuilder;
pub use error::{GraphError, Result};
pub use types::{Cluster, ClusterBounds};
pub use union_find::DisjointSet;
