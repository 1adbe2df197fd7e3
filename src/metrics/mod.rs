// src/metrics/mod.rs
//! Concept-based evaluation of node importance explanations.

pub mod auc;
pub mod distance;
pub mod explainer_metric;
pub mod histogram;
pub mod normalize;

pub use auc::{trapezoid_auc, AucScorer, ScoreTable};
pub use distance::{class_pairs, wasserstein_1d, DistanceAggregator, DistanceTable};
pub use explainer_metric::{ExplainerMetric, ExplainerMetricConfig};
pub use histogram::{Histogram, HistogramBuilder, HistogramTable, PoolHistograms};
pub use normalize::{normalize_node_concepts, normalize_node_importance, PooledConcepts};
