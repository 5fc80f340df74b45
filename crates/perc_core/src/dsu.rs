//! Disjoint Set Union (DSU) data structure with size tracking.
//!
//! Implements a union-find structure that maintains disjoint sets of
//! analysis-graph nodes while tracking the number of members of each set.
//! Merging every edge of a graph leaves one set per connected component,
//! and the sizes stored at the roots give the component sizes directly.

/// Union-Find data structure with per-set member counts.
///
/// Uses path halving and union-by-rank so that a full pass over the edges
/// of a diagram runs in near-linear time.
pub struct UnionFind {
    /// Parent pointer array for the union-find forest.
    ///
    /// Root nodes point to themselves. Shortened during find operations so
    /// that repeated lookups along the same chain become cheap.
    parent: Vec<usize>,

    /// Rank array for the union-by-rank heuristic.
    ///
    /// Approximates the depth of each tree and keeps merged trees balanced.
    rank: Vec<u8>,

    /// Member count of each set, valid at set roots only.
    size: Vec<usize>,
}

impl UnionFind {
    /// Creates `n` singleton sets.
    ///
    /// # Arguments
    ///
    /// * `n` - Number of elements, addressed as `0..n`
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
            size: vec![1; n],
        }
    }

    /// Number of elements tracked by the structure.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Finds the root of the set containing element i, with path halving.
    ///
    /// Every visited element is re-pointed at its grandparent while the
    /// chain is walked, which roughly halves the path on each call.
    ///
    /// # Arguments
    ///
    /// * `i` - Element index to find the root for
    ///
    /// # Returns
    ///
    /// The root element of the set containing i.
    #[inline(always)]
    pub fn find(&mut self, mut i: usize) -> usize {
        while i != self.parent[i] {
            let p = self.parent[i];
            let gp = self.parent[p];
            self.parent[i] = gp;
            i = p;
        }
        i
    }

    /// Merges the sets containing elements i and j.
    ///
    /// The shallower tree is hung below the deeper one and the member
    /// count of the surviving root becomes the sum of both counts.
    ///
    /// # Arguments
    ///
    /// * `i` - First element index
    /// * `j` - Second element index
    ///
    /// # Returns
    ///
    /// True if the sets were merged, false if they were already united.
    pub fn union(&mut self, i: usize, j: usize) -> bool {
        let root_i = self.find(i);
        let root_j = self.find(j);

        if root_i == root_j {
            return false;
        }

        let (keep, absorb) = if self.rank[root_i] < self.rank[root_j] {
            (root_j, root_i)
        } else {
            (root_i, root_j)
        };
        self.parent[absorb] = keep;
        self.size[keep] += self.size[absorb];
        if self.rank[keep] == self.rank[absorb] {
            self.rank[keep] += 1;
        }
        true
    }

    /// Member count of the set containing element i.
    pub fn set_size(&mut self, i: usize) -> usize {
        let root = self.find(i);
        self.size[root]
    }

    /// Sizes of all sets, largest first.
    pub fn component_sizes(&mut self) -> Vec<usize> {
        let mut sizes = Vec::new();
        for i in 0..self.len() {
            if self.find(i) == i {
                sizes.push(self.size[i]);
            }
        }
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        sizes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_tracks_sizes() {
        let mut dsu = UnionFind::new(6);
        assert!(dsu.union(0, 1));
        assert!(dsu.union(1, 2));
        assert!(!dsu.union(0, 2));
        assert!(dsu.union(3, 4));
        assert_eq!(dsu.set_size(2), 3);
        assert_eq!(dsu.set_size(4), 2);
        assert_eq!(dsu.component_sizes(), vec![3, 2, 1]);
    }

    #[test]
    fn test_empty() {
        let mut dsu = UnionFind::new(0);
        assert!(dsu.is_empty());
        assert!(dsu.component_sizes().is_empty());
    }
}
