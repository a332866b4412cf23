use crate::arrays::{Array2D, FeatureImage};
use crate::clustering::{HierarchicalClustering, MergeRecord, StopReason};
use crate::common::{ClusteringOptions, Error};
use crate::features::{aggregate_edges, aggregate_nodes};
use crate::graph::{Graph, NodeId};
use crate::grid_graph::{GridGraph, Neighborhood};
use crate::property_map::NodeMap;
use crate::rag::{make_region_adjacency_graph, project_to_source};
use log::debug;

/// Result of [`segment()`].
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// For every pixel the id of its final region. Ids are superpixel labels (the smallest label
    /// merged into the region), not consecutive; see [`crate::rag::relabel_consecutive()`].
    pub labels: Array2D<NodeId>,
    /// Region of every superpixel label.
    pub cluster_labels: NodeMap<NodeId>,
    pub region_count: usize,
    pub merges: Vec<MergeRecord>,
    pub stop_reason: StopReason,
}

/// Merge superpixels of an image.
///
/// `labels` is the oversegmentation (e.g. watershed or SLIC output), `features` the per-pixel
/// features averaged per region (e.g. Lab color) and `edge_indicator` a per-pixel boundary
/// strength (e.g. gradient magnitude), interpolated between neighboring pixels.
pub fn segment(
    labels: &Array2D<i64>,
    features: &FeatureImage,
    edge_indicator: &Array2D<f32>,
    neighborhood: Neighborhood,
    options: ClusteringOptions,
) -> Result<Segmentation, Error> {
    if edge_indicator.width != labels.width || edge_indicator.height != labels.height {
        return Err(Error::dimension_mismatch(
            format!("{}x{} edge indicator", labels.width, labels.height),
            format!("{}x{} edge indicator", edge_indicator.width, edge_indicator.height),
        ));
    }
    let (node_mean, node_count) = aggregate_nodes(labels, features)?;
    let grid = GridGraph::new(labels.width, labels.height, neighborhood);
    let label_map = NodeMap::from(labels);
    let rag = make_region_adjacency_graph(&grid, &label_map)?;
    let (edge_weight, edge_length) = aggregate_edges(
        &rag.graph,
        &rag.affiliated_edges,
        &grid,
        &NodeMap::from(edge_indicator),
    )?;
    let mut clustering = HierarchicalClustering::new(
        &rag.graph,
        &edge_weight,
        &edge_length,
        &node_mean,
        &node_count,
        options,
    )?;
    let stop_reason = clustering.run();
    let cluster_labels = clustering.cluster_labels();
    let projected = project_to_source(&grid, &label_map, &cluster_labels)?;
    debug!(
        "segmented {}x{} image: {} superpixels -> {} regions",
        labels.width,
        labels.height,
        rag.graph.node_count(),
        clustering.region_count()
    );
    Ok(Segmentation {
        labels: Array2D::from_slice(projected.as_slice(), labels.width, labels.height)?,
        cluster_labels,
        region_count: clustering.region_count(),
        merges: clustering.merge_history().to_vec(),
        stop_reason,
    })
}
