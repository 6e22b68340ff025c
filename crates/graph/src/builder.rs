use crate::types::{Cluster, ClusterBounds};
use crate::union_find::DisjointSet;
use pattern_protocol::{CrossDomainLink, Signal};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Build disjoint cross-domain clusters from links
pub struct ClusterBuilder {
    bounds: ClusterBounds,
}

/// Connected components with per-root similarity accumulators.
struct Components<'a> {
    set: DisjointSet,
    index: HashMap<&'a str, usize>,
    members: Vec<&'a Signal>,
    sim_sum: Vec<f64>,
    sim_count: Vec<usize>,
}

impl<'a> Components<'a> {
    fn new() -> Self {
        Self {
            set: DisjointSet::new(),
            index: HashMap::new(),
            members: Vec::new(),
            sim_sum: Vec::new(),
            sim_count: Vec::new(),
        }
    }

    fn intern(&mut self, signal: &'a Signal) -> usize {
        if let Some(&idx) = self.index.get(signal.id.as_str()) {
            return idx;
        }
        let idx = self.set.add();
        self.index.insert(signal.id.as_str(), idx);
        self.members.push(signal);
        self.sim_sum.push(0.0);
        self.sim_count.push(0);
        idx
    }

    fn link(&mut self, a: usize, b: usize, similarity: f32) {
        if let Some((root, absorbed)) = self.set.union(a, b) {
            self.sim_sum[root] += self.sim_sum[absorbed];
            self.sim_count[root] += self.sim_count[absorbed];
        }
        let root = self.set.find(a);
        self.sim_sum[root] += f64::from(similarity);
        self.sim_count[root] += 1;
    }

    /// Components ordered by first encounter, members in encounter order.
    fn into_groups(mut self) -> Vec<Group<'a>> {
        let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
        let mut groups: Vec<Group<'a>> = Vec::new();
        for idx in 0..self.members.len() {
            let root = self.set.find(idx);
            let slot = *slot_of_root.entry(root).or_insert_with(|| {
                groups.push(Group {
                    members: Vec::new(),
                    sim_sum: self.sim_sum[root],
                    link_count: self.sim_count[root],
                });
                groups.len() - 1
            });
            groups[slot].members.push(self.members[idx]);
        }
        groups
    }
}

struct Group<'a> {
    members: Vec<&'a Signal>,
    sim_sum: f64,
    link_count: usize,
}

impl Group<'_> {
    fn avg_similarity(&self) -> f32 {
        if self.link_count == 0 {
            return 0.0;
        }
        (self.sim_sum / self.link_count as f64) as f32
    }
}

impl ClusterBuilder {
    #[must_use]
    pub const fn new(bounds: ClusterBounds) -> Self {
        Self { bounds }
    }

    /// Union linked signals into clusters.
    ///
    /// Links naming signals that are not in `signals` are ignored. Returned
    /// clusters are pairwise disjoint, span at least two domains, and are
    /// ranked by domain count then average similarity.
    pub fn build(&self, links: &[CrossDomainLink], signals: &[Signal]) -> Vec<Cluster> {
        let by_id: HashMap<&str, &Signal> = signals.iter().map(|s| (s.id.as_str(), s)).collect();

        let mut components = Components::new();
        for link in links {
            let (Some(&a), Some(&b)) = (
                by_id.get(link.signal_a_id.as_str()),
                by_id.get(link.signal_b_id.as_str()),
            ) else {
                log::debug!(
                    "Skipping link {} <-> {}: unknown signal",
                    link.signal_a_id,
                    link.signal_b_id
                );
                continue;
            };
            let ia = components.intern(a);
            let ib = components.intern(b);
            components.link(ia, ib, link.similarity);
        }

        let mut clusters = Vec::new();
        for group in components.into_groups() {
            let domain_count = distinct_domains(&group.members).len();
            if group.members.len() < self.bounds.min_size() || domain_count < 2 {
                log::debug!(
                    "Dropping component of {} signals across {} domain(s)",
                    group.members.len(),
                    domain_count
                );
                continue;
            }

            let avg_similarity = group.avg_similarity();
            let link_count = group.link_count;
            let selected = if group.members.len() > self.bounds.max_size() {
                select_representatives(&group.members, self.bounds.max_size())
            } else {
                group.members
            };

            clusters.push(Cluster {
                domains: distinct_domains(&selected),
                members: selected.into_iter().cloned().collect(),
                avg_similarity,
                link_count,
            });
        }

        clusters.sort_by(|a, b| {
            b.domains
                .len()
                .cmp(&a.domains.len())
                .then_with(|| b.avg_similarity.total_cmp(&a.avg_similarity))
        });

        log::info!(
            "Built {} clusters from {} links",
            clusters.len(),
            links.len()
        );
        clusters
    }
}

fn distinct_domains(members: &[&Signal]) -> BTreeSet<String> {
    members.iter().map(|s| s.domain_tag.clone()).collect()
}

/// Pick at most `cap` members: first one per domain, then leftovers, both
/// passes in the given order.
pub(crate) fn select_representatives<'a>(members: &[&'a Signal], cap: usize) -> Vec<&'a Signal> {
    let mut selected: Vec<&'a Signal> = Vec::with_capacity(cap.min(members.len()));
    let mut taken = vec![false; members.len()];
    let mut seen_domains: HashSet<&str> = HashSet::new();

    for (idx, &signal) in members.iter().enumerate() {
        if selected.len() == cap {
            break;
        }
        if seen_domains.insert(signal.domain_tag.as_str()) {
            selected.push(signal);
            taken[idx] = true;
        }
    }

    for (idx, &signal) in members.iter().enumerate() {
        if selected.len() == cap {
            break;
        }
        if !taken[idx] {
            selected.push(signal);
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use pattern_protocol::Embedding;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn signal(id: &str, domain: &str) -> Signal {
        Signal {
            id: id.to_string(),
            name: id.to_uppercase(),
            summary: String::new(),
            domain_tag: domain.to_string(),
            stage: None,
            horizon: None,
            embedding: Embedding::new(vec![1.0]),
        }
    }

    fn link(a: &str, b: &str, similarity: f32) -> CrossDomainLink {
        CrossDomainLink {
            signal_a_id: a.to_string(),
            signal_b_id: b.to_string(),
            similarity,
        }
    }

    fn ids(cluster: &Cluster) -> Vec<&str> {
        cluster.members.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn two_domains_fully_linked_form_one_cluster() {
        let signals = vec![
            signal("x1", "X"),
            signal("x2", "X"),
            signal("x3", "X"),
            signal("y1", "Y"),
            signal("y2", "Y"),
            signal("y3", "Y"),
        ];
        let mut links = Vec::new();
        for x in ["x1", "x2", "x3"] {
            for y in ["y1", "y2", "y3"] {
                links.push(link(x, y, 0.80));
            }
        }

        let clusters = ClusterBuilder::new(ClusterBounds::default()).build(&links, &signals);
        assert_eq!(clusters.len(), 1);
        let cluster = &clusters[0];
        assert_eq!(cluster.len(), 6);
        assert_eq!(cluster.link_count, 9);
        assert!((cluster.avg_similarity - 0.80).abs() < 1e-6);
        assert_eq!(
            cluster.domains.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["X", "Y"]
        );

        let capped = ClusterBuilder::new(ClusterBounds::new(2, 4).unwrap()).build(&links, &signals);
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].len(), 4);
        assert_eq!(capped[0].domains.len(), 2);
    }

    #[test]
    fn capping_takes_one_per_domain_then_fills_in_encounter_order() {
        let signals = vec![
            signal("a1", "A"),
            signal("a2", "A"),
            signal("a3", "A"),
            signal("b1", "B"),
            signal("c1", "C"),
        ];
        let links = vec![
            link("a1", "b1", 0.8),
            link("a2", "b1", 0.8),
            link("a3", "b1", 0.8),
            link("a3", "c1", 0.8),
        ];
        let clusters = ClusterBuilder::new(ClusterBounds::new(2, 4).unwrap()).build(&links, &signals);
        assert_eq!(clusters.len(), 1);
        // encounter order: a1, b1, a2, a3, c1
        assert_eq!(ids(&clusters[0]), vec!["a1", "b1", "c1", "a2"]);
        assert_eq!(clusters[0].domains.len(), 3);
    }

    #[test]
    fn cap_smaller_than_domain_count_keeps_first_domains() {
        let members = [
            signal("a", "A"),
            signal("b", "B"),
            signal("c", "C"),
            signal("d", "D"),
        ];
        let refs: Vec<&Signal> = members.iter().collect();
        let selected = select_representatives(&refs, 2);
        let picked: Vec<&str> = selected.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(picked, vec!["a", "b"]);
    }

    #[test]
    fn ranks_by_domain_count_then_similarity() {
        let signals = vec![
            signal("p1", "P"),
            signal("q1", "Q"),
            signal("r1", "R"),
            signal("s1", "S"),
            signal("t1", "T"),
            signal("u1", "U"),
            signal("v1", "V"),
        ];
        let links = vec![
            // two-domain cluster with high similarity
            link("p1", "q1", 0.93),
            // three-domain cluster with modest similarity
            link("r1", "s1", 0.75),
            link("s1", "t1", 0.75),
            // two-domain cluster with lower similarity
            link("u1", "v1", 0.72),
        ];
        let clusters = ClusterBuilder::new(ClusterBounds::default()).build(&links, &signals);
        let order: Vec<Vec<&str>> = clusters.iter().map(ids).collect();
        assert_eq!(
            order,
            vec![vec!["r1", "s1", "t1"], vec!["p1", "q1"], vec!["u1", "v1"]]
        );
    }

    #[test]
    fn average_similarity_survives_root_merges() {
        let signals = vec![
            signal("a", "A"),
            signal("b", "B"),
            signal("c", "A"),
            signal("d", "B"),
        ];
        let links = vec![
            link("a", "b", 0.9),
            link("c", "d", 0.7),
            link("a", "d", 0.8),
        ];
        let clusters = ClusterBuilder::new(ClusterBounds::default()).build(&links, &signals);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].link_count, 3);
        assert!((clusters[0].avg_similarity - 0.8).abs() < 1e-6);
    }

    #[test]
    fn drops_small_components_and_ignores_unknown_ids() {
        let signals = vec![signal("a", "A"), signal("b", "B")];
        let links = vec![link("a", "b", 0.8), link("a", "ghost", 0.9)];

        let clusters = ClusterBuilder::new(ClusterBounds::default()).build(&links, &signals);
        assert_eq!(clusters.len(), 1);
        assert_eq!(ids(&clusters[0]), vec!["a", "b"]);

        let strict = ClusterBuilder::new(ClusterBounds::new(3, 6).unwrap()).build(&links, &signals);
        assert!(strict.is_empty());
    }

    #[test]
    fn no_links_no_clusters() {
        let signals = vec![signal("a", "A")];
        assert!(ClusterBuilder::new(ClusterBounds::default())
            .build(&[], &signals)
            .is_empty());
    }

    proptest! {
        #[test]
        fn proptest_clusters_are_disjoint_and_cross_domain(
            domains in prop::collection::vec(0usize..4, 2..20),
            edges in prop::collection::vec((0usize..20, 0usize..20, 0.71f32..0.94), 0..40),
            max_size in 2usize..8,
        ) {
            let signals: Vec<Signal> = domains
                .iter()
                .enumerate()
                .map(|(i, d)| signal(&format!("s{i}"), &format!("d{d}")))
                .collect();
            let links: Vec<CrossDomainLink> = edges
                .into_iter()
                .filter(|(a, b, _)| *a < signals.len() && *b < signals.len())
                .filter(|(a, b, _)| signals[*a].domain_tag != signals[*b].domain_tag)
                .map(|(a, b, sim)| link(&signals[a].id, &signals[b].id, sim))
                .collect();

            let bounds = ClusterBounds::new(2, max_size).unwrap();
            let clusters = ClusterBuilder::new(bounds).build(&links, &signals);

            let mut seen: HashSet<String> = HashSet::new();
            for cluster in &clusters {
                prop_assert!(cluster.domains.len() >= 2);
                prop_assert!(cluster.len() >= 2 && cluster.len() <= max_size);
                for id in cluster.member_ids() {
                    prop_assert!(seen.insert(id), "signal in two clusters");
                }
            }
        }

        #[test]
        fn proptest_capping_keeps_every_domain_when_domains_fit(
            domains in prop::collection::vec(0usize..6, 2..24),
            max_size in 2usize..8,
        ) {
            let signals: Vec<Signal> = domains
                .iter()
                .enumerate()
                .map(|(i, d)| signal(&format!("s{i}"), &format!("d{d}")))
                .collect();
            let all_domains: BTreeSet<String> = signals.iter().map(|s| s.domain_tag.clone()).collect();
            prop_assume!(all_domains.len() >= 2);

            // Link every cross-domain pair so the whole set is one component
            let mut links = Vec::new();
            for (i, a) in signals.iter().enumerate() {
                for b in signals.iter().skip(i + 1) {
                    if a.domain_tag != b.domain_tag {
                        links.push(link(&a.id, &b.id, 0.8));
                    }
                }
            }

            let bounds = ClusterBounds::new(2, max_size).unwrap();
            let clusters = ClusterBuilder::new(bounds).build(&links, &signals);
            prop_assert_eq!(clusters.len(), 1);
            prop_assert_eq!(clusters[0].len(), signals.len().min(max_size));
            if all_domains.len() <= max_size {
                prop_assert_eq!(&clusters[0].domains, &all_domains);
            }
        }
    }
}
