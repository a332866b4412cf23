use assume::assume;

/// Union-find over `0..size` with union by rank and path halving.
///
/// Independent of the tree shape every set also remembers its smallest member, which is the
/// stable representative reported by [`DisjointSet::representative()`].
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parents: Vec<usize>,
    ranks: Vec<u8>,
    smallest: Vec<usize>,
    num_sets: usize,
}

impl DisjointSet {
    pub fn new(size: usize) -> Self {
        DisjointSet {
            parents: (0..size).collect(),
            ranks: vec![0; size],
            smallest: (0..size).collect(),
            num_sets: size,
        }
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Number of disjoint sets, singletons included.
    pub fn num_sets(&self) -> usize {
        self.num_sets
    }

    /// Tree root of the set containing `node`.
    #[inline]
    pub fn find(&mut self, node: usize) -> usize {
        assert!(node < self.parents.len(), "node {node} out of bounds");
        let mut x = node;
        loop {
            let parent = self.parents[x];
            // parents only ever hold indices below len()
            assume!(unsafe: parent < self.parents.len(), "parent: {parent} > {}", self.parents.len());
            if parent == x {
                return x;
            }
            let grandparent = self.parents[parent];
            assume!(unsafe: grandparent < self.parents.len(), "grandparent: {grandparent} > {}", self.parents.len());
            self.parents[x] = grandparent;
            x = grandparent;
        }
    }

    /// Smallest member of the set containing `node`.
    #[inline]
    pub fn representative(&mut self, node: usize) -> usize {
        let root = self.find(node);
        self.smallest[root]
    }

    /// Join the sets of `node_i` and `node_j`. Returns the representative of the joined set.
    pub fn merge(&mut self, node_i: usize, node_j: usize) -> usize {
        let mut root_x = self.find(node_i);
        let mut root_y = self.find(node_j);
        if root_x == root_y {
            return self.smallest[root_x];
        }
        if self.ranks[root_x] < self.ranks[root_y] {
            std::mem::swap(&mut root_x, &mut root_y);
        }
        self.parents[root_y] = root_x;
        if self.ranks[root_x] == self.ranks[root_y] {
            self.ranks[root_x] = self.ranks[root_x].saturating_add(1);
        }
        self.smallest[root_x] = self.smallest[root_x].min(self.smallest[root_y]);
        self.num_sets -= 1;
        self.smallest[root_x]
    }
}

#[cfg(test)]
mod tests {
    use super::DisjointSet;

    #[test]
    fn representative_is_smallest_member() {
        let mut set = DisjointSet::new(8);
        assert_eq!(set.merge(5, 6), 5);
        assert_eq!(set.merge(7, 6), 5);
        assert_eq!(set.merge(2, 3), 2);
        // rank of {5, 6, 7} is higher, but the representative must still be 2
        assert_eq!(set.merge(7, 3), 2);
        for node in [2, 3, 5, 6, 7] {
            assert_eq!(set.representative(node), 2);
        }
        assert_eq!(set.representative(4), 4);
        assert_eq!(set.num_sets(), 4);
        assert_eq!(set.merge(3, 6), 2);
        assert_eq!(set.num_sets(), 4);
    }

    #[test]
    fn long_chain_is_compressed() {
        let size = 10_000;
        let mut set = DisjointSet::new(size);
        for i in 1..size {
            set.merge(i - 1, i);
        }
        assert_eq!(set.num_sets(), 1);
        assert!((0..size).all(|i| set.representative(i) == 0));
    }
}
