//! Graph capability shared by the pixel grid and the region adjacency graph.

pub type NodeId = usize;
pub type EdgeId = usize;

/// Undirected graph with integer node and edge ids.
///
/// Ids are dense indices below `node_bound()` / `edge_bound()`, but not every index has to be a
/// live node or edge (region adjacency graphs keep the superpixel labels as node ids). Property
/// maps are sized by the bounds.
pub trait Graph {
    /// Number of live nodes.
    fn node_count(&self) -> usize;
    /// Number of live edges.
    fn edge_count(&self) -> usize;
    /// One past the largest node id.
    fn node_bound(&self) -> usize;
    /// One past the largest edge id.
    fn edge_bound(&self) -> usize;
    /// Live node ids in increasing order. The iterator can be recreated any number of times.
    fn nodes(&self) -> impl Iterator<Item = NodeId> + '_;
    /// Live edge ids in increasing order.
    fn edges(&self) -> impl Iterator<Item = EdgeId> + '_;
    /// Edges touching `node`.
    fn incident_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_;
    fn has_node(&self, node: NodeId) -> bool;
    /// First endpoint, the smaller node id.
    fn u(&self, edge: EdgeId) -> NodeId;
    /// Second endpoint, the larger node id.
    fn v(&self, edge: EdgeId) -> NodeId;

    fn endpoints(&self, edge: EdgeId) -> (NodeId, NodeId) {
        (self.u(edge), self.v(edge))
    }
    /// Endpoint of `edge` that is not `node`.
    fn opposite(&self, edge: EdgeId, node: NodeId) -> NodeId {
        let (u, v) = self.endpoints(edge);
        debug_assert!(u == node || v == node, "{node} is not incident to edge {edge}");
        if u == node {
            v
        } else {
            u
        }
    }
}
