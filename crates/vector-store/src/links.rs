use crate::embedding::normalized_matrix;
use crate::error::{Result, VectorStoreError};
use ndarray::Array2;
use pattern_protocol::{CrossDomainLink, Signal};
use std::collections::HashMap;

/// Open similarity interval `(lower, upper)`.
///
/// Below `lower` signals are unrelated; above `upper` they describe the same
/// topic twice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityBand {
    lower: f32,
    upper: f32,
}

impl SimilarityBand {
    pub fn new(lower: f32, upper: f32) -> Result<Self> {
        let in_range = (-1.0..=1.0).contains(&lower) && (-1.0..=1.0).contains(&upper);
        if !in_range || lower >= upper {
            return Err(VectorStoreError::InvalidBand { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// Both ends are exclusive.
    #[must_use]
    pub fn contains(&self, similarity: f32) -> bool {
        similarity > self.lower && similarity < self.upper
    }
}

impl Default for SimilarityBand {
    fn default() -> Self {
        Self {
            lower: 0.70,
            upper: 0.95,
        }
    }
}

/// Finds semantically related signal pairs that sit in different domains.
pub struct LinkDetector {
    band: SimilarityBand,
}

struct DomainGroup<'a> {
    domain: &'a str,
    members: Vec<&'a Signal>,
}

impl LinkDetector {
    #[must_use]
    pub const fn new(band: SimilarityBand) -> Self {
        Self { band }
    }

    /// Compute every cross-domain pair whose cosine similarity is in band.
    ///
    /// Returns an empty list when fewer than two domains are present. All
    /// embeddings must share one dimensionality. Links come back sorted by
    /// similarity, highest first.
    pub fn detect(&self, signals: &[Signal]) -> Result<Vec<CrossDomainLink>> {
        let groups = partition_by_domain(signals);
        if groups.len() < 2 {
            log::debug!(
                "Only {} domain(s) among {} signals; no cross-domain links possible",
                groups.len(),
                signals.len()
            );
            return Ok(Vec::new());
        }

        let dimension = signals
            .first()
            .map(|s| s.embedding.dimension())
            .unwrap_or_default();

        // One normalized matrix per domain, reused for every pair it takes part in
        let matrices = groups
            .iter()
            .map(|group| {
                let rows: Vec<&[f32]> = group
                    .members
                    .iter()
                    .map(|s| s.embedding.as_slice())
                    .collect();
                normalized_matrix(&rows, dimension)
            })
            .collect::<Result<Vec<Array2<f32>>>>()?;

        let mut links = Vec::new();
        for i in 0..groups.len() {
            for j in (i + 1)..groups.len() {
                let similarities = matrices[i].dot(&matrices[j].t());
                let before = links.len();
                for ((row, col), &similarity) in similarities.indexed_iter() {
                    if self.band.contains(similarity) {
                        links.push(CrossDomainLink {
                            signal_a_id: groups[i].members[row].id.clone(),
                            signal_b_id: groups[j].members[col].id.clone(),
                            similarity,
                        });
                    }
                }
                log::debug!(
                    "{} x {}: {} links in band",
                    groups[i].domain,
                    groups[j].domain,
                    links.len() - before
                );
            }
        }

        links.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

        log::info!(
            "Detected {} cross-domain links across {} domains",
            links.len(),
            groups.len()
        );
        Ok(links)
    }
}

/// Domains in first-encounter order, members in input order.
fn partition_by_domain(signals: &[Signal]) -> Vec<DomainGroup<'_>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<DomainGroup<'_>> = Vec::new();
    for signal in signals {
        let domain = signal.domain_tag.as_str();
        let slot = *index.entry(domain).or_insert_with(|| {
            groups.push(DomainGroup {
                domain,
                members: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].members.push(signal);
    }
    groups
}
