use serde::{Deserialize, Serialize};
use std::ops::Range;
use thiserror::Error;

/// Errors reported by graph construction, aggregation and clustering.
///
/// All of them are input validation failures detected before any work is done, so there is
/// nothing to retry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The label map does not cover the source graph or contains a negative label.
    #[error("invalid labeling: {0}")]
    InvalidLabeling(String),
    /// Shapes (or lengths) of two inputs which must agree are different.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },
    /// Clustering parameter out of its allowed range.
    #[error("invalid option `{name}`: {reason}")]
    InvalidOptions { name: &'static str, reason: String },
    /// Clustering was requested on a graph without nodes.
    #[error("graph has no nodes")]
    EmptyGraph,
}

impl Error {
    pub(crate) fn dimension_mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        Error::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Signature of user supplied node feature distances.
pub type FeatureDistanceFn = fn(&[f64], &[f64]) -> f64;

/// Distance used between the mean feature vectors of two regions.
///
/// For color features in Lab space `L2` is the usual choice. `ChiSquared` and `Hellinger` are meant
/// for histogram-like features (non-negative, ideally normalized).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum NodeFeatureMetric {
    /// Euclidean distance ([wikipedia](https://en.wikipedia.org/wiki/Euclidean_distance)).
    L2,
    /// Squared Euclidean distance, no square root.
    SquaredL2,
    /// Manhattan distance ([wikipedia](https://en.wikipedia.org/wiki/Taxicab_geometry)).
    L1,
    /// Symmetric chi-squared distance: _0.5 * sum((a - b)^2 / (a + b))_, bins where _a + b_ is
    /// zero are skipped.
    ChiSquared,
    /// Hellinger distance: _sqrt(0.5 * sum((sqrt(a) - sqrt(b))^2))_. Negative entries are clamped
    /// to zero.
    Hellinger,
    /// User supplied distance. Can't be serialized.
    #[serde(skip)]
    Custom(FeatureDistanceFn),
}

impl NodeFeatureMetric {
    /// Distance between two feature vectors. Only the common prefix is compared when lengths
    /// differ.
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            NodeFeatureMetric::L2 => squared_l2(a, b).sqrt(),
            NodeFeatureMetric::SquaredL2 => squared_l2(a, b),
            NodeFeatureMetric::L1 => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
            NodeFeatureMetric::ChiSquared => {
                0.5 * a
                    .iter()
                    .zip(b)
                    .filter(|(x, y)| *x + *y != 0.0)
                    .map(|(x, y)| (x - y) * (x - y) / (x + y))
                    .sum::<f64>()
            }
            NodeFeatureMetric::Hellinger => {
                let sum: f64 = a
                    .iter()
                    .zip(b)
                    .map(|(x, y)| {
                        let d = x.max(0.0).sqrt() - y.max(0.0).sqrt();
                        d * d
                    })
                    .sum();
                (0.5 * sum).sqrt()
            }
            NodeFeatureMetric::Custom(f) => f(a, b),
        }
    }
}

#[inline(always)]
fn squared_l2(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Plain clustering configuration.
///
/// Fields can be changed freely; the values are checked only when the config is turned into
/// [`ClusteringOptions`] using [`ClusteringConfig::validate()`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Merging stops when this many regions are left. At least 1.
    pub min_region_count: usize,
    /// Weight (β) of the node feature distance against the edge weight, from 0 to 1.
    ///
    /// 0 means only the edge weights (boundary strength) are used, 1 means only the distance
    /// between mean node features.
    pub node_feature_importance: f64,
    /// Wardness, from 0 to 1. The dissimilarity is multiplied by
    /// _(size_a * size_b / (size_a + size_b))^wardness_ so higher values make merging of two
    /// large regions more expensive.
    pub size_importance: f64,
    /// Distance between mean node features.
    pub node_feature_metric: NodeFeatureMetric,
    /// Merging stops early once the cheapest remaining merge is more dissimilar than this.
    pub max_merge_dissimilarity: Option<f64>,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            min_region_count: 1,
            node_feature_importance: 0.0,
            size_importance: 0.0,
            node_feature_metric: NodeFeatureMetric::L2,
            max_merge_dissimilarity: None,
        }
    }
}

impl ClusteringConfig {
    pub fn validate(self) -> Result<ClusteringOptions, Error> {
        if self.min_region_count < 1 {
            return Err(Error::InvalidOptions {
                name: "min_region_count",
                reason: "must be at least 1".to_string(),
            });
        }
        check_unit_interval("node_feature_importance", self.node_feature_importance)?;
        check_unit_interval("size_importance", self.size_importance)?;
        if let Some(max) = self.max_merge_dissimilarity {
            if max.is_nan() {
                return Err(Error::InvalidOptions {
                    name: "max_merge_dissimilarity",
                    reason: "must not be NaN".to_string(),
                });
            }
        }
        Ok(ClusteringOptions { config: self })
    }
}

fn check_unit_interval(name: &'static str, value: f64) -> Result<(), Error> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidOptions {
            name,
            reason: format!("{value} is outside of [0, 1]"),
        })
    }
}

/// Validated, immutable clustering options.
///
/// ```rust
/// use rag_segmentation::common::ClusteringConfig;
///
/// let options = ClusteringConfig {
///     min_region_count: 20,
///     node_feature_importance: 0.5,
///     ..ClusteringConfig::default()
/// }
/// .validate()
/// .unwrap();
/// assert_eq!(options.min_region_count(), 20);
/// ```
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(try_from = "ClusteringConfig", into = "ClusteringConfig")]
pub struct ClusteringOptions {
    config: ClusteringConfig,
}

impl Default for ClusteringOptions {
    fn default() -> Self {
        Self {
            config: ClusteringConfig::default(),
        }
    }
}

impl TryFrom<ClusteringConfig> for ClusteringOptions {
    type Error = Error;
    fn try_from(config: ClusteringConfig) -> Result<Self, Self::Error> {
        config.validate()
    }
}

impl From<ClusteringOptions> for ClusteringConfig {
    fn from(options: ClusteringOptions) -> Self {
        options.config
    }
}

impl ClusteringOptions {
    pub fn min_region_count(&self) -> usize {
        self.config.min_region_count
    }
    pub fn node_feature_importance(&self) -> f64 {
        self.config.node_feature_importance
    }
    pub fn size_importance(&self) -> f64 {
        self.config.size_importance
    }
    pub fn node_feature_metric(&self) -> NodeFeatureMetric {
        self.config.node_feature_metric
    }
    pub fn max_merge_dissimilarity(&self) -> Option<f64> {
        self.config.max_merge_dissimilarity
    }
}

pub(crate) fn split_length_to_ranges(length: usize, splits: usize) -> Vec<Range<usize>> {
    let chunk_size = length / splits;
    let rem = length % splits;
    (0..splits)
        .scan((rem, 0usize), |(r, acc), _split| {
            let mut size = chunk_size;
            if *r > 0 {
                *r -= 1;
                size += 1;
            }
            let out = (*acc, *acc + size);
            *acc += size;
            Some(out.0..out.1)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        split_length_to_ranges, ClusteringConfig, ClusteringOptions, Error, NodeFeatureMetric,
    };

    #[test]
    fn default_options_are_valid() {
        let options = ClusteringConfig::default().validate().unwrap();
        assert_eq!(options.min_region_count(), 1);
        assert_eq!(options.node_feature_importance(), 0.0);
        assert_eq!(options.size_importance(), 0.0);
        assert!(options.max_merge_dissimilarity().is_none());
    }

    #[test]
    fn out_of_range_options_are_rejected() {
        let zero_regions = ClusteringConfig {
            min_region_count: 0,
            ..ClusteringConfig::default()
        };
        assert!(matches!(
            zero_regions.validate(),
            Err(Error::InvalidOptions {
                name: "min_region_count",
                ..
            })
        ));
        for beta in [-0.1, 1.5, f64::NAN] {
            let config = ClusteringConfig {
                node_feature_importance: beta,
                ..ClusteringConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(Error::InvalidOptions {
                    name: "node_feature_importance",
                    ..
                })
            ));
        }
        let wardness = ClusteringConfig {
            size_importance: 2.0,
            ..ClusteringConfig::default()
        };
        assert!(wardness.validate().is_err());
        let nan_threshold = ClusteringConfig {
            max_merge_dissimilarity: Some(f64::NAN),
            ..ClusteringConfig::default()
        };
        assert!(nan_threshold.validate().is_err());
    }

    #[test]
    fn options_deserialize_with_validation() {
        let json = r#"{
            "min_region_count": 5,
            "node_feature_importance": 0.25,
            "node_feature_metric": "L1"
        }"#;
        let options: ClusteringOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.min_region_count(), 5);
        assert_eq!(options.node_feature_importance(), 0.25);
        assert!(matches!(options.node_feature_metric(), NodeFeatureMetric::L1));
        let invalid = serde_json::from_str::<ClusteringOptions>(r#"{"size_importance": 3.0}"#);
        assert!(invalid.is_err());
    }

    #[test]
    fn metrics() {
        let a = [1.0, 2.0, 0.0];
        let b = [4.0, 6.0, 0.0];
        assert_eq!(NodeFeatureMetric::L2.distance(&a, &b), 5.0);
        assert_eq!(NodeFeatureMetric::SquaredL2.distance(&a, &b), 25.0);
        assert_eq!(NodeFeatureMetric::L1.distance(&a, &b), 7.0);
        let chi = NodeFeatureMetric::ChiSquared.distance(&a, &b);
        assert!((chi - 0.5 * (9.0 / 5.0 + 16.0 / 8.0)).abs() < 1e-12);
        let h = NodeFeatureMetric::Hellinger.distance(&[1.0, 0.0], &[0.0, 1.0]);
        assert!((h - 1.0).abs() < 1e-12);
        fn max_diff(a: &[f64], b: &[f64]) -> f64 {
            a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
        }
        assert_eq!(NodeFeatureMetric::Custom(max_diff).distance(&a, &b), 4.0);
    }

    #[test]
    fn split_ranges_cover_length() {
        let ranges = split_length_to_ranges(10, 3);
        assert_eq!(ranges, vec![0..4, 4..7, 7..10]);
    }
}
