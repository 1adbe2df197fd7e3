// src/lib.rs

//! `graph_explain` explains and evaluates the decisions of graph classifiers
//! trained on tissue graphs (nodes are nuclei, edges their spatial relations).
//!
//! - [`MaskExplainer`] learns edge and node-feature masks that keep a frozen
//!   classifier's prediction while pruning as much of the graph as possible.
//! - [`ExplainerMetric`] scores a collection of node importances against
//!   per-node concepts: how far apart the classes' concept distributions are
//!   over the least important nodes, integrated over the number of kept nodes.

pub mod algorithms;
pub mod core;
pub mod metrics;
pub mod models;
pub mod traits;
pub mod utils;

// Re-export key components for easier use by library consumers
pub use crate::algorithms::{MaskExplainer, MaskExplainerConfig, MaskGranularity};
pub use crate::core::{ExplainError, ExplanationResult, GraphInstance, Result, StepStats, StopReason};
pub use crate::metrics::{ExplainerMetric, ExplainerMetricConfig, ScoreTable};
pub use crate::models::GraphConvClassifier;
pub use crate::traits::GraphClassifier;
