use pattern_protocol::Insight;
use std::collections::BTreeSet;

/// `|A ∩ B| / |A ∪ B|`; two empty sets score 0.
#[must_use]
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

#[derive(Debug, Default)]
pub struct DedupOutcome {
    pub accepted: Vec<Insight>,
    pub rejected: Vec<Insight>,
}

/// Rejects insights whose related signals overlap an existing or already
/// accepted insight by more than the threshold.
pub struct Deduplicator {
    threshold: f64,
    pool: Vec<BTreeSet<String>>,
}

impl Deduplicator {
    #[must_use]
    pub fn new(threshold: f64, existing: Vec<BTreeSet<String>>) -> Self {
        Self {
            threshold,
            pool: existing,
        }
    }

    /// Admit `ids` unless it overlaps the pool too much. Admitted sets join
    /// the pool immediately.
    pub fn admit(&mut self, ids: BTreeSet<String>) -> bool {
        if let Some(overlap) = self
            .pool
            .iter()
            .map(|existing| jaccard(&ids, existing))
            .find(|&overlap| overlap > self.threshold)
        {
            log::debug!("Rejecting candidate: overlap {overlap:.2} > {:.2}", self.threshold);
            return false;
        }
        self.pool.push(ids);
        true
    }

    /// Filter candidates in order; earlier candidates win.
    pub fn filter(&mut self, candidates: Vec<Insight>) -> DedupOutcome {
        let mut outcome = DedupOutcome::default();
        for insight in candidates {
            if self.admit(insight.related_id_set()) {
                outcome.accepted.push(insight);
            } else {
                log::info!("Dropping duplicate insight '{}'", insight.title);
                outcome.rejected.push(insight);
            }
        }
        outcome
    }
}
