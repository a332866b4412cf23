use crate::graph::{EdgeId, Graph, NodeId};
use rustc_hash::FxHashMap;

/// Simple undirected graph with explicit adjacency lists.
///
/// Node ids are chosen by the caller and may be sparse (a region adjacency graph uses the
/// superpixel labels). Edge ids are assigned consecutively in insertion order. Parallel edges and
/// self-loops are rejected, edge lookup by node pair is O(1).
#[derive(Clone, Debug, Default)]
pub struct AdjacencyListGraph {
    present: Vec<bool>,
    adjacency: Vec<Vec<EdgeId>>,
    edges: Vec<(NodeId, NodeId)>,
    edge_index: FxHashMap<(NodeId, NodeId), EdgeId>,
    num_nodes: usize,
}

#[inline(always)]
fn ordered(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl AdjacencyListGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(node_bound: usize, edges: usize) -> Self {
        Self {
            present: Vec::with_capacity(node_bound),
            adjacency: Vec::with_capacity(node_bound),
            edges: Vec::with_capacity(edges),
            edge_index: FxHashMap::default(),
            num_nodes: 0,
        }
    }

    /// Insert node `id`. Returns `false` when it was already present.
    pub fn add_node(&mut self, id: NodeId) -> bool {
        if id >= self.present.len() {
            self.present.resize(id + 1, false);
            self.adjacency.resize_with(id + 1, Vec::new);
        }
        if self.present[id] {
            return false;
        }
        self.present[id] = true;
        self.num_nodes += 1;
        true
    }

    /// Edge between `a` and `b`, in any order.
    #[inline]
    pub fn find_edge(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        self.edge_index.get(&ordered(a, b)).copied()
    }

    /// Insert edge `(a, b)` and return its id together with `true` if it was created. Existing
    /// edge between the same nodes is returned with `false`. Missing nodes are added.
    ///
    /// # Panics
    /// On self-loop (`a == b`).
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> (EdgeId, bool) {
        assert_ne!(a, b, "self-loops are not allowed (node {a})");
        let key = ordered(a, b);
        if let Some(edge) = self.edge_index.get(&key) {
            return (*edge, false);
        }
        self.add_node(a);
        self.add_node(b);
        let edge = self.edges.len();
        self.edges.push(key);
        self.edge_index.insert(key, edge);
        self.adjacency[a].push(edge);
        self.adjacency[b].push(edge);
        (edge, true)
    }

    /// Number of edges touching `node`.
    pub fn degree(&self, node: NodeId) -> usize {
        self.adjacency.get(node).map_or(0, Vec::len)
    }
}

impl Graph for AdjacencyListGraph {
    fn node_count(&self) -> usize {
        self.num_nodes
    }
    fn edge_count(&self) -> usize {
        self.edges.len()
    }
    fn node_bound(&self) -> usize {
        self.present.len()
    }
    fn edge_bound(&self) -> usize {
        self.edges.len()
    }
    fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.present
            .iter()
            .enumerate()
            .filter(|(_, present)| **present)
            .map(|(id, _)| id)
    }
    fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        0..self.edges.len()
    }
    fn incident_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.adjacency
            .get(node)
            .map(|edges| edges.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
    }
    fn has_node(&self, node: NodeId) -> bool {
        self.present.get(node).copied().unwrap_or(false)
    }
    #[inline(always)]
    fn u(&self, edge: EdgeId) -> NodeId {
        self.edges[edge].0
    }
    #[inline(always)]
    fn v(&self, edge: EdgeId) -> NodeId {
        self.edges[edge].1
    }
}
