/// Disjoint-set forest over dense indices `0..len`.
///
/// Union by size with full path compression.
#[derive(Debug, Clone, Default)]
pub struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a singleton set and return its index.
    pub fn add(&mut self) -> usize {
        let idx = self.parent.len();
        self.parent.push(idx);
        self.size.push(1);
        idx
    }

    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        // Point every node on the walked path straight at the root
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Merge the sets containing `a` and `b`.
    ///
    /// Returns `Some((root, absorbed))` when two sets were merged, `None` when
    /// they were already one set.
    pub fn union(&mut self, a: usize, b: usize) -> Option<(usize, usize)> {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return None;
        }

        let (root, absorbed) = if self.size[ra] >= self.size[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[absorbed] = root;
        self.size[root] += self.size[absorbed];
        Some((root, absorbed))
    }
}
