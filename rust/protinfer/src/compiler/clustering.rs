//! Connected components of the accession-peptide graph.

/// Disjoint-set forest with path halving and union by size.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    pub fn new(num_nodes: usize) -> Self {
        Self {
            parent: (0..num_nodes).collect(),
            size: vec![1; num_nodes],
        }
    }

    pub fn find(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            self.parent[node] = self.parent[self.parent[node]];
            node = self.parent[node];
        }
        node
    }

    /// Returns `true` if the two nodes were in different sets.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
        true
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }
}

/// Nodes of every connected component, each list in ascending node order.
///
/// Components are ordered by their smallest node, so the output only depends
/// on which edges exist, not on the order they are given in.
pub fn connected_components(
    num_nodes: usize,
    edges: impl IntoIterator<Item = (usize, usize)>,
) -> Vec<Vec<usize>> {
    let mut uf = UnionFind::new(num_nodes);
    for (a, b) in edges {
        uf.union(a, b);
    }

    let mut component_of_root = vec![usize::MAX; num_nodes];
    let mut components: Vec<Vec<usize>> = Vec::new();
    for node in 0..num_nodes {
        let root = uf.find(node);
        if component_of_root[root] == usize::MAX {
            component_of_root[root] = components.len();
            components.push(Vec::new());
        }
        components[component_of_root[root]].push(node);
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_find() {
        let mut uf = UnionFind::new(5);
        assert!(uf.union(0, 1));
        assert!(uf.union(3, 4));
        assert!(!uf.union(1, 0));
        assert_eq!(uf.find(0), uf.find(1));
        assert_ne!(uf.find(0), uf.find(3));
        assert!(uf.union(1, 4));
        assert_eq!(uf.find(0), uf.find(3));
        assert_eq!(uf.len(), 5);
    }

    #[test]
    fn test_components_are_order_independent() {
        let edges = vec![(0, 5), (1, 5), (2, 6), (3, 6), (3, 7)];
        let mut reversed = edges.clone();
        reversed.reverse();

        let a = connected_components(9, edges);
        let b = connected_components(9, reversed);
        assert_eq!(a, b);
        assert_eq!(a, vec![vec![0, 1, 5], vec![2, 3, 6, 7], vec![4], vec![8]]);
    }
}
