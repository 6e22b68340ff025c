use crate::error::{GraphError, Result};
use pattern_protocol::Signal;
use std::collections::BTreeSet;

/// Connected group of signals spanning at least two domains.
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Representative members, at most `max_size`
    pub members: Vec<Signal>,

    /// Domains covered by `members`
    pub domains: BTreeSet<String>,

    /// Mean similarity over every link inside the connected component
    pub avg_similarity: f32,

    /// Number of links the component was built from
    pub link_count: usize,
}

impl Cluster {
    #[must_use]
    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|s| s.id.clone()).collect()
    }

    /// Stable identifier for logs and error records.
    #[must_use]
    pub fn key(&self) -> String {
        self.member_ids().join(",")
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Minimum and maximum member counts for a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterBounds {
    min_size: usize,
    max_size: usize,
}

impl ClusterBounds {
    pub fn new(min_size: usize, max_size: usize) -> Result<Self> {
        if min_size < 2 || max_size < min_size {
            return Err(GraphError::InvalidBounds { min_size, max_size });
        }
        Ok(Self { min_size, max_size })
    }

    #[must_use]
    pub const fn min_size(&self) -> usize {
        self.min_size
    }

    #[must_use]
    pub const fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for ClusterBounds {
    fn default() -> Self {
        Self {
            min_size: 2,
            max_size: 6,
        }
    }
}
