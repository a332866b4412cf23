//! Region and boundary statistics for the region adjacency graph.
//!
//! Node statistics are per-label pixel counts and mean feature vectors, edge statistics are the
//! boundary length (number of affiliated source edges) and the mean edge indicator along it. Both
//! keep enough information to be merged exactly without going back to the pixels.
use crate::arrays::{Array2D, FeatureImage};
use crate::common::{split_length_to_ranges, Error};
use crate::graph::{EdgeId, Graph};
use crate::property_map::{EdgeMap, NodeMap};
use log::debug;
use multiversion::multiversion;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::ops::Range;

/// Rows accumulated by one rayon task in [`aggregate_nodes()`]. Fixed, so the summation order (and
/// the result) does not depend on the number of threads.
const ROWS_PER_TASK: usize = 32;

/// Pixel count and mean feature of a region.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct RegionStats {
    pub count: usize,
    pub mean: Vec<f64>,
}

impl RegionStats {
    pub fn new(count: usize, mean: Vec<f64>) -> Self {
        Self { count, mean }
    }

    /// Statistics of the union of two disjoint regions.
    ///
    /// The mean is the count-weighted mean of both means. For two empty regions it's the plain
    /// average, so the result doesn't depend on the order of arguments either way.
    pub fn merge(&self, other: &RegionStats) -> RegionStats {
        let mut merged = self.clone();
        merged.merge_from(other);
        merged
    }

    pub fn merge_from(&mut self, other: &RegionStats) {
        debug_assert_eq!(self.mean.len(), other.mean.len());
        let total = self.count + other.count;
        if total == 0 {
            for (m, o) in self.mean.iter_mut().zip(&other.mean) {
                *m = 0.5 * (*m + *o);
            }
            return;
        }
        let (w_self, w_other) = (self.count as f64, other.count as f64);
        for (m, o) in self.mean.iter_mut().zip(&other.mean) {
            *m = (*m * w_self + *o * w_other) / total as f64;
        }
        self.count = total;
    }
}

/// Length and mean weight of a region boundary.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct BoundaryStats {
    pub length: usize,
    pub weight: f64,
}

impl BoundaryStats {
    /// Statistics of two boundaries joined together, mean weighted by length.
    pub fn merge(&self, other: &BoundaryStats) -> BoundaryStats {
        let length = self.length + other.length;
        let weight = if length == 0 {
            0.5 * (self.weight + other.weight)
        } else {
            (self.weight * self.length as f64 + other.weight * other.length as f64) / length as f64
        };
        BoundaryStats { length, weight }
    }
}

/// Scalar per source edge, the mean of the per-pixel value at its two endpoints (linear
/// interpolation in the middle between the pixels).
pub fn edge_indicator_from_pixels<G: Graph + Sync>(
    source: &G,
    pixel_scalar: &NodeMap<f32>,
) -> Result<EdgeMap<f32>, Error> {
    if pixel_scalar.len() != source.node_bound() {
        return Err(Error::dimension_mismatch(
            format!("{} node values", source.node_bound()),
            format!("{} node values", pixel_scalar.len()),
        ));
    }
    let edges: Vec<EdgeId> = source.edges().collect();
    let values: Vec<f32> = edges
        .par_iter()
        .map(|e| {
            let (u, v) = source.endpoints(*e);
            0.5 * (pixel_scalar[u] + pixel_scalar[v])
        })
        .collect();
    let mut indicator = EdgeMap::new(source, 0.0f32);
    for (edge, value) in edges.into_iter().zip(values) {
        indicator[edge] = value;
    }
    Ok(indicator)
}

/// Mean of `source_edge_scalar` over the affiliated source edges of every RAG edge (`edge_weight`)
/// and the number of those edges (`edge_length`).
pub fn aggregate_edge_features<G: Graph + Sync>(
    rag: &G,
    affiliated_edges: &EdgeMap<Vec<EdgeId>>,
    source_edge_scalar: &EdgeMap<f32>,
) -> Result<(EdgeMap<f64>, EdgeMap<usize>), Error> {
    if affiliated_edges.len() != rag.edge_bound() {
        return Err(Error::dimension_mismatch(
            format!("{} affiliation lists", rag.edge_bound()),
            format!("{} affiliation lists", affiliated_edges.len()),
        ));
    }
    if let Some(edge) = affiliated_edges
        .as_slice()
        .iter()
        .flatten()
        .find(|e| **e >= source_edge_scalar.len())
    {
        return Err(Error::dimension_mismatch(
            format!("edge scalar for source edge {edge}"),
            format!("{} edge values", source_edge_scalar.len()),
        ));
    }
    let edges: Vec<EdgeId> = rag.edges().collect();
    let stats: Vec<BoundaryStats> = edges
        .par_iter()
        .map(|e| {
            let boundary = &affiliated_edges[*e];
            let sum: f64 = boundary
                .iter()
                .map(|s| source_edge_scalar[*s] as f64)
                .sum();
            BoundaryStats {
                length: boundary.len(),
                weight: if boundary.is_empty() {
                    0.0
                } else {
                    sum / boundary.len() as f64
                },
            }
        })
        .collect();
    let mut edge_weight = EdgeMap::new(rag, 0.0f64);
    let mut edge_length = EdgeMap::new(rag, 0usize);
    for (edge, s) in edges.into_iter().zip(stats) {
        edge_weight[edge] = s.weight;
        edge_length[edge] = s.length;
    }
    Ok((edge_weight, edge_length))
}

/// [`edge_indicator_from_pixels()`] followed by [`aggregate_edge_features()`].
pub fn aggregate_edges<R: Graph + Sync, G: Graph + Sync>(
    rag: &R,
    affiliated_edges: &EdgeMap<Vec<EdgeId>>,
    source: &G,
    pixel_scalar: &NodeMap<f32>,
) -> Result<(EdgeMap<f64>, EdgeMap<usize>), Error> {
    let indicator = edge_indicator_from_pixels(source, pixel_scalar)?;
    aggregate_edge_features(rag, affiliated_edges, &indicator)
}

#[multiversion(targets = "simd")]
fn accumulate_rows(
    slots: &[usize],
    features: &[f32],
    channels: usize,
    sums: &mut [f64],
    counts: &mut [usize],
) {
    for (slot, pixel) in slots.iter().zip(features.chunks_exact(channels)) {
        let slot = *slot;
        counts[slot] += 1;
        let acc = &mut sums[slot * channels..(slot + 1) * channels];
        for (a, f) in acc.iter_mut().zip(pixel) {
            *a += *f as f64;
        }
    }
}

/// Sums of the labels seen by one task, compacted to the labels actually present.
struct PartialSums {
    labels: Vec<usize>,
    sums: Vec<f64>,
    counts: Vec<usize>,
}

impl PartialSums {
    fn accumulate(labels: &Array2D<i64>, features: &FeatureImage, rows: Range<usize>) -> Self {
        let channels = features.channels;
        let mut slot_of: FxHashMap<usize, usize> = FxHashMap::default();
        let mut partial = PartialSums {
            labels: Vec::new(),
            sums: Vec::new(),
            counts: Vec::new(),
        };
        let mut slots = vec![0usize; labels.width];
        for row in rows {
            for (slot, label) in slots.iter_mut().zip(labels.get_row(row)) {
                let label = *label as usize;
                *slot = *slot_of.entry(label).or_insert_with(|| {
                    partial.labels.push(label);
                    partial.counts.push(0);
                    partial.sums.resize(partial.sums.len() + channels, 0.0);
                    partial.labels.len() - 1
                });
            }
            accumulate_rows(
                &slots,
                features.get_row(row),
                channels,
                &mut partial.sums,
                &mut partial.counts,
            );
        }
        partial
    }
}

/// Mean feature vector (`node_mean`) and pixel count (`node_count`) of every label.
///
/// Maps are indexed by label value and sized `max_label + 1`; labels not present in the image get
/// count 0 and a zero mean.
pub fn aggregate_nodes(
    labels: &Array2D<i64>,
    features: &FeatureImage,
) -> Result<(NodeMap<Vec<f64>>, NodeMap<usize>), Error> {
    if labels.width != features.width || labels.height != features.height {
        return Err(Error::dimension_mismatch(
            format!("{}x{} features", labels.width, labels.height),
            format!("{}x{} features", features.width, features.height),
        ));
    }
    if let Some(i) = labels.as_slice().iter().position(|l| *l < 0) {
        let (x, y) = labels.get_x_y_index(i);
        return Err(Error::InvalidLabeling(format!(
            "pixel ({x}, {y}) has negative label {}",
            labels.as_slice()[i]
        )));
    }
    let channels = features.channels;
    let bound = labels
        .as_slice()
        .iter()
        .max()
        .map_or(0, |max| *max as usize + 1);
    let num_tasks = labels.height.div_ceil(ROWS_PER_TASK).max(1);
    let partials: Vec<PartialSums> = split_length_to_ranges(labels.height, num_tasks)
        .into_par_iter()
        .map(|rows| PartialSums::accumulate(labels, features, rows))
        .collect();
    // partials are added in row order, independent of how rayon scheduled them
    let mut means: Vec<Vec<f64>> = vec![Vec::new(); bound];
    let mut counts = vec![0usize; bound];
    for partial in partials {
        for (slot, label) in partial.labels.iter().enumerate() {
            let sum = &partial.sums[slot * channels..(slot + 1) * channels];
            let acc = &mut means[*label];
            if acc.is_empty() {
                acc.resize(channels, 0.0);
            }
            acc.iter_mut().zip(sum).for_each(|(a, s)| *a += *s);
            counts[*label] += partial.counts[slot];
        }
    }
    for (mean, count) in means.iter_mut().zip(&counts) {
        if *count == 0 {
            *mean = vec![0.0; channels];
        } else {
            mean.iter_mut().for_each(|m| *m /= *count as f64);
        }
    }
    debug!(
        "aggregated {} pixels into {} labels ({} channels)",
        labels.len(),
        counts.iter().filter(|c| **c > 0).count(),
        channels
    );
    Ok((NodeMap::from_vec(means), NodeMap::from_vec(counts)))
}

/// [`aggregate_nodes()`] packed as [`RegionStats`].
pub fn aggregate_node_stats(
    labels: &Array2D<i64>,
    features: &FeatureImage,
) -> Result<NodeMap<RegionStats>, Error> {
    let (means, counts) = aggregate_nodes(labels, features)?;
    Ok(NodeMap::from_vec(
        means
            .into_vec()
            .into_iter()
            .zip(counts.into_vec())
            .map(|(mean, count)| RegionStats::new(count, mean))
            .collect(),
    ))
}
