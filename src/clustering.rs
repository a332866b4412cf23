//! Agglomerative clustering of a region adjacency graph.
//!
//! The cheapest edge (by combined boundary and region dissimilarity) is contracted repeatedly
//! until the requested number of regions is left. Edge priorities are kept in a binary heap with
//! lazy deletion: every recomputation of an edge bumps its generation stamp and older heap entries
//! are skipped when popped.
use crate::common::{ClusteringOptions, Error};
use crate::disjoint_set::DisjointSet;
use crate::features::{BoundaryStats, RegionStats};
use crate::graph::{EdgeId, Graph, NodeId};
use crate::property_map::{EdgeMap, NodeMap};
use log::{debug, trace};
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// One contraction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MergeRecord {
    /// Contracted edge.
    pub edge: EdgeId,
    /// Representative of the merged region (the smaller of the two representatives).
    pub kept: NodeId,
    /// Representative which stopped being one.
    pub absorbed: NodeId,
    /// Dissimilarity of the contracted edge.
    pub dissimilarity: f64,
    /// Number of regions after this merge.
    pub region_count: usize,
}

/// Why the clustering stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// `min_region_count` regions are left.
    RegionCount,
    /// No mergeable edge is left (every connected component is a single region).
    QueueExhausted,
    /// The cheapest merge exceeds `max_merge_dissimilarity`.
    MaxDissimilarity,
}

// Ordered by dissimilarity, then edge id (ties go to the lower id).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct QueueEntry {
    dissimilarity: OrderedFloat<f64>,
    edge: EdgeId,
    stamp: u64,
}

/// State of a running clustering.
///
/// ```rust
/// use rag_segmentation::clustering::HierarchicalClustering;
/// use rag_segmentation::common::ClusteringConfig;
/// use rag_segmentation::grid_graph::{GridGraph, Neighborhood};
/// use rag_segmentation::property_map::{EdgeMap, NodeMap};
///
/// let graph = GridGraph::new(2, 2, Neighborhood::Four);
/// let weights = EdgeMap::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
/// let lengths = EdgeMap::new(&graph, 1);
/// let features = NodeMap::new(&graph, vec![0.0]);
/// let sizes = NodeMap::new(&graph, 1);
/// let options = ClusteringConfig::default().validate().unwrap();
/// let mut clustering =
///     HierarchicalClustering::new(&graph, &weights, &lengths, &features, &sizes, options)
///         .unwrap();
/// clustering.run();
/// assert_eq!(clustering.region_count(), 1);
/// assert!(clustering.cluster_labels().as_slice().iter().all(|l| *l == 0));
/// ```
pub struct HierarchicalClustering<'g, G: Graph> {
    graph: &'g G,
    options: ClusteringOptions,
    sets: DisjointSet,
    regions: NodeMap<RegionStats>,
    boundaries: EdgeMap<BoundaryStats>,
    alive: EdgeMap<bool>,
    stamps: EdgeMap<u64>,
    // neighbor representative -> connecting edge, indexed by representative
    adjacency: Vec<FxHashMap<NodeId, EdgeId>>,
    queue: BinaryHeap<Reverse<QueueEntry>>,
    region_count: usize,
    history: Vec<MergeRecord>,
    stop_reason: Option<StopReason>,
}

fn check_len(what: &str, expected: usize, actual: usize) -> Result<(), Error> {
    if actual < expected {
        return Err(Error::dimension_mismatch(
            format!("{what} with at least {expected} entries"),
            format!("{actual} entries"),
        ));
    }
    Ok(())
}

impl<'g, G: Graph> HierarchicalClustering<'g, G> {
    /// Validate the inputs and set up the initial queue. The maps are copied, the caller's maps
    /// are never modified.
    pub fn new(
        graph: &'g G,
        edge_weight: &EdgeMap<f64>,
        edge_length: &EdgeMap<usize>,
        node_feature: &NodeMap<Vec<f64>>,
        node_size: &NodeMap<usize>,
        options: ClusteringOptions,
    ) -> Result<Self, Error> {
        if graph.node_count() == 0 {
            return Err(Error::EmptyGraph);
        }
        check_len("edge weight map", graph.edge_bound(), edge_weight.len())?;
        check_len("edge length map", graph.edge_bound(), edge_length.len())?;
        check_len("node feature map", graph.node_bound(), node_feature.len())?;
        check_len("node size map", graph.node_bound(), node_size.len())?;
        let mut nodes = graph.nodes();
        let first = nodes.next().map_or(0, |n| node_feature[n].len());
        if let Some(node) = nodes.find(|n| node_feature[*n].len() != first) {
            return Err(Error::dimension_mismatch(
                format!("feature of length {first} for node {node}"),
                format!("length {}", node_feature[node].len()),
            ));
        }

        let node_bound = graph.node_bound();
        let edge_bound = graph.edge_bound();
        let mut clustering = Self {
            graph,
            options,
            sets: DisjointSet::new(node_bound),
            regions: NodeMap::from_vec(
                (0..node_bound)
                    .map(|n| RegionStats::new(node_size[n], node_feature[n].clone()))
                    .collect(),
            ),
            boundaries: EdgeMap::from_vec(
                (0..edge_bound)
                    .map(|e| BoundaryStats {
                        length: edge_length[e],
                        weight: edge_weight[e],
                    })
                    .collect(),
            ),
            alive: EdgeMap::with_bound(edge_bound, false),
            stamps: EdgeMap::with_bound(edge_bound, 0),
            adjacency: vec![FxHashMap::default(); node_bound],
            queue: BinaryHeap::with_capacity(graph.edge_count()),
            region_count: graph.node_count(),
            history: Vec::new(),
            stop_reason: None,
        };
        for edge in graph.edges() {
            let (u, v) = graph.endpoints(edge);
            if u == v {
                continue;
            }
            clustering.alive[edge] = true;
            if let Some(existing) = clustering.adjacency[u].get(&v).copied() {
                clustering.fold_parallel(u, v, existing, edge);
            } else {
                clustering.adjacency[u].insert(v, edge);
                clustering.adjacency[v].insert(u, edge);
            }
        }
        for edge in graph.edges() {
            if clustering.alive[edge] {
                let (u, v) = graph.endpoints(edge);
                clustering.push(edge, u, v);
            }
        }
        debug!(
            "clustering {} regions with {} edges down to {}",
            clustering.region_count,
            clustering.queue.len(),
            options.min_region_count()
        );
        Ok(clustering)
    }

    /// Dissimilarity of the edge between regions `a` and `b` (representatives).
    ///
    /// `((1 - β) * weight + β * distance(feature_a, feature_b)) * size_factor`, where the size
    /// factor is `(|a| |b| / (|a| + |b|))^wardness`. With non-zero wardness an empty region has no
    /// defined size factor and the result is NaN. Edges of empty regions are never queued.
    pub fn dissimilarity(&self, edge: EdgeId, a: NodeId, b: NodeId) -> f64 {
        let beta = self.options.node_feature_importance();
        let wardness = self.options.size_importance();
        let (ra, rb) = (&self.regions[a], &self.regions[b]);
        let node_distance = if beta > 0.0 {
            self.options
                .node_feature_metric()
                .distance(&ra.mean, &rb.mean)
        } else {
            0.0
        };
        let combined = (1.0 - beta) * self.boundaries[edge].weight + beta * node_distance;
        if wardness == 0.0 {
            return combined;
        }
        if ra.count == 0 || rb.count == 0 {
            return f64::NAN;
        }
        let (sa, sb) = (ra.count as f64, rb.count as f64);
        combined * (sa * sb / (sa + sb)).powf(wardness)
    }

    fn push(&mut self, edge: EdgeId, a: NodeId, b: NodeId) {
        self.stamps[edge] += 1;
        // empty regions are never merged, the stamp bump above already invalidated older entries
        if self.regions[a].count == 0 || self.regions[b].count == 0 {
            return;
        }
        let dissimilarity = self.dissimilarity(edge, a, b);
        if dissimilarity.is_nan() {
            return;
        }
        self.queue.push(Reverse(QueueEntry {
            dissimilarity: OrderedFloat(dissimilarity),
            edge,
            stamp: self.stamps[edge],
        }));
    }

    // `kept_edge` and `other` both connect regions `a` and `b`; the lower id survives.
    fn fold_parallel(&mut self, a: NodeId, b: NodeId, kept_edge: EdgeId, other: EdgeId) {
        let (survivor, dropped) = if kept_edge < other {
            (kept_edge, other)
        } else {
            (other, kept_edge)
        };
        self.boundaries[survivor] = self.boundaries[survivor].merge(&self.boundaries[dropped]);
        self.alive[dropped] = false;
        self.stamps[dropped] += 1;
        self.adjacency[a].insert(b, survivor);
        self.adjacency[b].insert(a, survivor);
    }

    fn is_finished(&mut self) -> bool {
        if self.region_count <= self.options.min_region_count() {
            self.stop_reason = Some(StopReason::RegionCount);
        }
        self.stop_reason.is_some()
    }

    /// Contract the cheapest edge. Returns `None` once a stopping criterion is met.
    pub fn contract_next(&mut self) -> Option<MergeRecord> {
        if self.is_finished() {
            return None;
        }
        while let Some(Reverse(entry)) = self.queue.pop() {
            let edge = entry.edge;
            if !self.alive[edge] || entry.stamp != self.stamps[edge] {
                continue;
            }
            let (u, v) = self.graph.endpoints(edge);
            let a = self.sets.representative(u);
            let b = self.sets.representative(v);
            debug_assert_ne!(a, b, "live edge {edge} inside region {a}");
            if let Some(max) = self.options.max_merge_dissimilarity() {
                if entry.dissimilarity.0 > max {
                    self.queue.push(Reverse(entry));
                    self.stop_reason = Some(StopReason::MaxDissimilarity);
                    return None;
                }
            }
            let record = self.merge_regions(edge, a, b, entry.dissimilarity.0);
            trace!(
                "merged {} into {} over edge {} (d={}), {} regions left",
                record.absorbed,
                record.kept,
                record.edge,
                record.dissimilarity,
                record.region_count
            );
            self.history.push(record);
            return Some(record);
        }
        self.stop_reason = Some(StopReason::QueueExhausted);
        None
    }

    fn merge_regions(
        &mut self,
        edge: EdgeId,
        a: NodeId,
        b: NodeId,
        dissimilarity: f64,
    ) -> MergeRecord {
        let kept = self.sets.merge(a, b);
        let absorbed = if kept == a { b } else { a };
        debug_assert_eq!(kept, a.min(b));

        let absorbed_stats = std::mem::take(&mut self.regions[absorbed]);
        self.regions[kept].merge_from(&absorbed_stats);
        self.alive[edge] = false;

        let absorbed_neighbors = std::mem::take(&mut self.adjacency[absorbed]);
        self.adjacency[kept].remove(&absorbed);
        for (neighbor, neighbor_edge) in absorbed_neighbors {
            if neighbor == kept {
                continue;
            }
            self.adjacency[neighbor].remove(&absorbed);
            match self.adjacency[kept].get(&neighbor).copied() {
                Some(existing) => {
                    self.fold_parallel(kept, neighbor, existing, neighbor_edge);
                }
                None => {
                    self.adjacency[kept].insert(neighbor, neighbor_edge);
                    self.adjacency[neighbor].insert(kept, neighbor_edge);
                }
            }
        }
        let incident: Vec<(NodeId, EdgeId)> =
            self.adjacency[kept].iter().map(|(n, e)| (*n, *e)).collect();
        for (neighbor, incident_edge) in incident {
            self.push(incident_edge, kept, neighbor);
        }
        self.region_count -= 1;
        MergeRecord {
            edge,
            kept,
            absorbed,
            dissimilarity,
            region_count: self.region_count,
        }
    }

    /// Contract until a stopping criterion is met.
    pub fn run(&mut self) -> StopReason {
        while self.contract_next().is_some() {}
        let reason = self.stop_reason.unwrap_or(StopReason::QueueExhausted);
        debug!(
            "clustering stopped ({:?}) after {} merges, {} regions left",
            reason,
            self.history.len(),
            self.region_count
        );
        reason
    }

    pub fn region_count(&self) -> usize {
        self.region_count
    }

    pub fn merge_history(&self) -> &[MergeRecord] {
        &self.history
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Representative (smallest original node id) of the region containing `node`.
    pub fn representative(&mut self, node: NodeId) -> NodeId {
        self.sets.representative(node)
    }

    pub fn node_feature(&self, representative: NodeId) -> &[f64] {
        &self.regions[representative].mean
    }

    pub fn node_size(&self, representative: NodeId) -> usize {
        self.regions[representative].count
    }

    /// Current region of every node, as the id of its representative.
    pub fn cluster_labels(&mut self) -> NodeMap<NodeId> {
        NodeMap::from_vec(
            (0..self.sets.len())
                .map(|n| self.sets.representative(n))
                .collect(),
        )
    }
}

/// Cluster the graph and return the representative of every node.
pub fn hierarchical_clustering<G: Graph>(
    graph: &G,
    edge_weight: &EdgeMap<f64>,
    edge_length: &EdgeMap<usize>,
    node_feature: &NodeMap<Vec<f64>>,
    node_size: &NodeMap<usize>,
    options: ClusteringOptions,
) -> Result<NodeMap<NodeId>, Error> {
    let mut clustering = HierarchicalClustering::new(
        graph,
        edge_weight,
        edge_length,
        node_feature,
        node_size,
        options,
    )?;
    clustering.run();
    Ok(clustering.cluster_labels())
}
