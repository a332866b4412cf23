//! Hierarchical merging of superpixels in Rust.
//!
//! This crate turns an oversegmentation (superpixels from watershed, SLIC, ...) into a small number
//! of regions. A region adjacency graph (RAG) is built over the superpixels, every region gets its
//! pixel count and mean feature vector and every boundary its length and mean edge indicator. Then
//! the least dissimilar boundary is contracted over and over until the requested number of regions
//! is left.
//!
//! The dissimilarity of a boundary between regions _a_ and _b_ is
//!
//! _((1 - β) * weight + β * distance(mean_a, mean_b)) * (|a| |b| / (|a| + |b|))^wardness_
//!
//! where β and wardness come from [`common::ClusteringConfig`]. Ties are broken by the lower edge
//! id, so the result is the same on every run and platform.
//!
//! Producing the superpixels, color conversion and computing the edge indicator (gradient
//! magnitude or similar) is not part of this crate.
//!
//! The whole pipeline over image-shaped arrays:
//!
//! ```rust
//! use rag_segmentation::arrays::{Array2D, FeatureImage};
//! use rag_segmentation::common::ClusteringConfig;
//! use rag_segmentation::grid_graph::Neighborhood;
//! use rag_segmentation::pipeline::segment;
//!
//! fn main() {
//!     // four 2x2 superpixels
//!     let labels = Array2D::from_fn(4, 4, |x, y| (x / 2 + 2 * (y / 2)) as i64);
//!     // left half dark, right half bright
//!     let rgb: Vec<u8> = (0..16)
//!         .flat_map(|i| if i % 4 < 2 { [10; 3] } else { [200; 3] })
//!         .collect();
//!     let features = FeatureImage::from_u8(&rgb, 4, 4, 3).unwrap();
//!     // strong edge between the two halves
//!     let edge_indicator =
//!         Array2D::from_fn(4, 4, |x, _| if x == 1 || x == 2 { 1.0 } else { 0.0 });
//!     let options = ClusteringConfig {
//!         min_region_count: 2,
//!         node_feature_importance: 0.5,
//!         ..ClusteringConfig::default()
//!     }
//!     .validate()
//!     .unwrap();
//!     let result =
//!         segment(&labels, &features, &edge_indicator, Neighborhood::Four, options).unwrap();
//!     assert_eq!(result.region_count, 2);
//!     assert_eq!(result.labels[(0, 3)], 0);
//!     assert_eq!(result.labels[(3, 3)], 1);
//! }
//! ```
//!
//! For other graphs use [`rag::make_region_adjacency_graph()`], the functions in [`features`] and
//! [`clustering::hierarchical_clustering()`] directly; they work with anything implementing
//! [`graph::Graph`].
//!
//! The clustering itself is sequential. Interpolation of the edge indicator and accumulation of
//! region statistics run on rayon and don't depend on the number of threads.
//!

pub mod adjacency_graph;
pub mod arrays;
pub mod clustering;
pub mod common;
pub mod disjoint_set;
pub mod features;
pub mod graph;
pub mod grid_graph;
pub mod pipeline;
pub mod property_map;
pub mod rag;
