// src/models.rs
use crate::core::{ExplainError, Result};
use crate::traits::GraphClassifier;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// A minimal differentiable graph classifier.
///
/// One propagation step `H = (A + I) X`, a sum readout over nodes and a linear
/// head: `logits = W^T * sum_n H_n + b`, with `W` of shape `F x C`.
#[derive(Debug, Clone)]
pub struct GraphConvClassifier {
    weights: Array2<f64>,
    bias: Array1<f64>,
}

impl GraphConvClassifier {
    pub fn new(weights: Array2<f64>, bias: Array1<f64>) -> Result<Self> {
        if weights.ncols() != bias.len() {
            return Err(ExplainError::ShapeMismatch(format!(
                "Head has {} output columns, but bias has {} entries.",
                weights.ncols(),
                bias.len()
            )));
        }
        if bias.is_empty() {
            return Err(ExplainError::InvalidInput(
                "Classifier needs at least one class.".to_string(),
            ));
        }
        Ok(GraphConvClassifier { weights, bias })
    }

    pub fn num_features(&self) -> usize {
        self.weights.nrows()
    }

    fn check_inputs(&self, adjacency: ArrayView2<f64>, features: ArrayView2<f64>) -> Result<()> {
        if !adjacency.is_square() || adjacency.nrows() != features.nrows() {
            return Err(ExplainError::ShapeMismatch(format!(
                "Adjacency {:?} does not match {} nodes.",
                adjacency.dim(),
                features.nrows()
            )));
        }
        if features.ncols() != self.num_features() {
            return Err(ExplainError::ShapeMismatch(format!(
                "Model expects {} features, got {}.",
                self.num_features(),
                features.ncols()
            )));
        }
        Ok(())
    }
}

impl GraphClassifier for GraphConvClassifier {
    fn num_classes(&self) -> usize {
        self.bias.len()
    }

    fn logits(&self, adjacency: ArrayView2<f64>, features: ArrayView2<f64>) -> Result<Array1<f64>> {
        self.check_inputs(adjacency, features)?;
        // sum_n ((A + I) X)_n == sum_j (colsum_j(A) + 1) X_j
        let in_weight = adjacency.sum_axis(Axis(0)) + 1.0;
        let pooled = in_weight.dot(&features);
        Ok(self.weights.t().dot(&pooled) + &self.bias)
    }

    fn logits_vjp(
        &self,
        adjacency: ArrayView2<f64>,
        features: ArrayView2<f64>,
        upstream: ArrayView1<f64>,
    ) -> Result<(Array2<f64>, Array2<f64>)> {
        self.check_inputs(adjacency, features)?;
        if upstream.len() != self.num_classes() {
            return Err(ExplainError::ShapeMismatch(format!(
                "Upstream gradient has {} entries, but model has {} classes.",
                upstream.len(),
                self.num_classes()
            )));
        }
        let n = features.nrows();
        let v = self.weights.dot(&upstream); // F
        let xv = features.dot(&v); // N
        let in_weight = adjacency.sum_axis(Axis(0)) + 1.0;

        let grad_adj = Array2::from_shape_fn((n, n), |(_, j)| xv[j]);
        let grad_feats = Array2::from_shape_fn(features.raw_dim(), |(j, f)| in_weight[j] * v[f]);
        Ok((grad_adj, grad_feats))
    }
}
