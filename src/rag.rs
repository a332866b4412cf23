//! Region adjacency graph construction and projection of region labels back to the source graph.
use crate::adjacency_graph::AdjacencyListGraph;
use crate::common::Error;
use crate::graph::{EdgeId, Graph, NodeId};
use crate::property_map::{EdgeMap, NodeMap};
use log::debug;
use rustc_hash::FxHashMap;

/// Graph of superpixels. Node ids are the superpixel labels.
#[derive(Clone, Debug)]
pub struct RegionAdjacencyGraph {
    pub graph: AdjacencyListGraph,
    /// For every RAG edge the source edges (in source edge order) lying on the shared boundary.
    pub affiliated_edges: EdgeMap<Vec<EdgeId>>,
}

fn check_labels<G: Graph>(source: &G, labels: &NodeMap<i64>) -> Result<(), Error> {
    if labels.len() != source.node_bound() {
        return Err(Error::InvalidLabeling(format!(
            "label map has {} entries but the source graph has node bound {}",
            labels.len(),
            source.node_bound()
        )));
    }
    if let Some(node) = source.nodes().find(|n| labels[*n] < 0) {
        return Err(Error::InvalidLabeling(format!(
            "node {node} has negative label {}",
            labels[node]
        )));
    }
    Ok(())
}

/// Contract `source` by `labels`.
///
/// Every distinct label becomes a node with the label as its id. Every source edge between two
/// different labels is affiliated with the RAG edge between those labels; edges inside a
/// superpixel are dropped. Labels without any boundary become isolated nodes.
pub fn make_region_adjacency_graph<G: Graph>(
    source: &G,
    labels: &NodeMap<i64>,
) -> Result<RegionAdjacencyGraph, Error> {
    check_labels(source, labels)?;
    let max_label = source.nodes().map(|n| labels[n] as usize).max().unwrap_or(0);
    let mut graph = AdjacencyListGraph::with_capacity(max_label + 1, 0);
    for node in source.nodes() {
        graph.add_node(labels[node] as NodeId);
    }
    let mut affiliated: Vec<Vec<EdgeId>> = Vec::new();
    let mut interior = 0usize;
    for edge in source.edges() {
        let (u, v) = source.endpoints(edge);
        let (lu, lv) = (labels[u] as NodeId, labels[v] as NodeId);
        if lu == lv {
            interior += 1;
            continue;
        }
        let (rag_edge, created) = graph.add_edge(lu, lv);
        if created {
            affiliated.push(Vec::new());
        }
        affiliated[rag_edge].push(edge);
    }
    debug!(
        "RAG: {} regions, {} region edges from {} source edges ({} interior)",
        graph.node_count(),
        graph.edge_count(),
        source.edge_count(),
        interior
    );
    Ok(RegionAdjacencyGraph {
        graph,
        affiliated_edges: EdgeMap::from_vec(affiliated),
    })
}

/// Cluster id of every source node, given the RAG node clustering.
pub fn project_to_source<G: Graph>(
    source: &G,
    labels: &NodeMap<i64>,
    cluster_labels: &NodeMap<NodeId>,
) -> Result<NodeMap<NodeId>, Error> {
    check_labels(source, labels)?;
    let mut projected = NodeMap::new(source, 0);
    for node in source.nodes() {
        let label = labels[node] as NodeId;
        if label >= cluster_labels.len() {
            return Err(Error::InvalidLabeling(format!(
                "label {label} of node {node} has no cluster (cluster map size {})",
                cluster_labels.len()
            )));
        }
        projected[node] = cluster_labels[label];
    }
    Ok(projected)
}

/// Replace arbitrary ids with `0..k` in order of first appearance. Returns the number of distinct
/// ids `k`.
pub fn relabel_consecutive(labels: &mut [NodeId]) -> usize {
    let mut mapping: FxHashMap<NodeId, NodeId> = FxHashMap::default();
    for label in labels.iter_mut() {
        let next = mapping.len();
        *label = *mapping.entry(*label).or_insert(next);
    }
    mapping.len()
}

#[cfg(test)]
mod tests {
    use super::{make_region_adjacency_graph, project_to_source, relabel_consecutive};
    use crate::common::Error;
    use crate::graph::Graph;
    use crate::grid_graph::{GridGraph, Neighborhood};
    use crate::property_map::NodeMap;

    // 4x3 image:
    // 0 0 5 5
    // 0 0 5 5
    // 9 9 9 5
    fn labels() -> NodeMap<i64> {
        NodeMap::from_vec(vec![0, 0, 5, 5, 0, 0, 5, 5, 9, 9, 9, 5])
    }

    #[test]
    fn rag_keeps_label_ids() {
        let grid = GridGraph::new(4, 3, Neighborhood::Four);
        let rag = make_region_adjacency_graph(&grid, &labels()).unwrap();
        assert_eq!(rag.graph.node_count(), 3);
        assert_eq!(rag.graph.nodes().collect::<Vec<_>>(), vec![0, 5, 9]);
        assert_eq!(rag.graph.edge_count(), 3);
        let e05 = rag.graph.find_edge(0, 5).unwrap();
        let e09 = rag.graph.find_edge(9, 0).unwrap();
        let e59 = rag.graph.find_edge(5, 9).unwrap();
        assert_eq!(rag.affiliated_edges[e05].len(), 2);
        assert_eq!(rag.affiliated_edges[e09].len(), 2);
        assert_eq!(rag.affiliated_edges[e59].len(), 2);
    }

    #[test]
    fn affiliation_is_boundary_only_and_complete() {
        let labels = labels();
        for neighborhood in [Neighborhood::Four, Neighborhood::Eight] {
            let grid = GridGraph::new(4, 3, neighborhood);
            let rag = make_region_adjacency_graph(&grid, &labels).unwrap();
            let mut seen = vec![0usize; grid.edge_count()];
            for rag_edge in rag.graph.edges() {
                let (a, b) = rag.graph.endpoints(rag_edge);
                assert!(!rag.affiliated_edges[rag_edge].is_empty());
                for edge in &rag.affiliated_edges[rag_edge] {
                    let (u, v) = grid.endpoints(*edge);
                    let mut pair = [labels[u] as usize, labels[v] as usize];
                    pair.sort();
                    assert_eq!(pair, [a, b]);
                    seen[*edge] += 1;
                }
            }
            for edge in grid.edges() {
                let (u, v) = grid.endpoints(edge);
                let expected = usize::from(labels[u] != labels[v]);
                assert_eq!(seen[edge], expected, "edge {edge}");
            }
        }
    }

    #[test]
    fn isolated_label_becomes_isolated_node() {
        let grid = GridGraph::new(2, 2, Neighborhood::Four);
        let rag = make_region_adjacency_graph(&grid, &NodeMap::from_vec(vec![3, 3, 3, 3])).unwrap();
        assert_eq!(rag.graph.node_count(), 1);
        assert_eq!(rag.graph.edge_count(), 0);
        assert!(rag.graph.has_node(3));
    }

    #[test]
    fn invalid_labels_are_rejected() {
        let grid = GridGraph::new(2, 2, Neighborhood::Four);
        let negative = NodeMap::from_vec(vec![0, 1, -1, 1]);
        assert!(matches!(
            make_region_adjacency_graph(&grid, &negative),
            Err(Error::InvalidLabeling(_))
        ));
        let short = NodeMap::from_vec(vec![0, 1, 1]);
        assert!(matches!(
            make_region_adjacency_graph(&grid, &short),
            Err(Error::InvalidLabeling(_))
        ));
    }

    #[test]
    fn projection_and_relabel() {
        let grid = GridGraph::new(4, 3, Neighborhood::Four);
        let mut clusters = NodeMap::with_bound(10, 0usize);
        clusters[5] = 5;
        clusters[9] = 5;
        let projected = project_to_source(&grid, &labels(), &clusters).unwrap();
        assert_eq!(projected.as_slice(), &[0, 0, 5, 5, 0, 0, 5, 5, 5, 5, 5, 5]);
        let mut pixels = projected.into_vec();
        assert_eq!(relabel_consecutive(&mut pixels), 2);
        assert_eq!(pixels, vec![0, 0, 1, 1, 0, 0, 1, 1, 1, 1, 1, 1]);
        let too_small = NodeMap::with_bound(6, 0usize);
        assert!(project_to_source(&grid, &labels(), &too_small).is_err());
    }
}
