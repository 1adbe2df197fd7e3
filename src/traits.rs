// src/traits.rs
use crate::core::{ExplainError, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Relative step used by the finite-difference fallback of [`GraphClassifier::logits_vjp`].
const FD_STEP: f64 = 1e-5;

/// A frozen graph classifier: maps a single graph (dense adjacency, node features)
/// to per-class logits.
///
/// The explainer only needs gradients of the logits with respect to the
/// adjacency and the features. Models with analytic gradients should override
/// [`GraphClassifier::logits_vjp`]; the default falls back to central finite
/// differences, which costs `2 * (N*N + N*F)` forward passes.
pub trait GraphClassifier {
    fn num_classes(&self) -> usize;

    fn logits(&self, adjacency: ArrayView2<f64>, features: ArrayView2<f64>) -> Result<Array1<f64>>;

    /// Vector-Jacobian product: gradients of `<upstream, logits(adjacency, features)>`
    /// with respect to the adjacency and to the features.
    fn logits_vjp(
        &self,
        adjacency: ArrayView2<f64>,
        features: ArrayView2<f64>,
        upstream: ArrayView1<f64>,
    ) -> Result<(Array2<f64>, Array2<f64>)> {
        if upstream.len() != self.num_classes() {
            return Err(ExplainError::ShapeMismatch(format!(
                "Upstream gradient has {} entries, but model has {} classes.",
                upstream.len(),
                self.num_classes()
            )));
        }

        let projected = |adj: ArrayView2<f64>, feats: ArrayView2<f64>| -> Result<f64> {
            Ok(self.logits(adj, feats)?.dot(&upstream))
        };

        let mut adj = adjacency.to_owned();
        let mut grad_adj = Array2::zeros(adjacency.raw_dim());
        for idx in ndarray::indices(adjacency.raw_dim()) {
            let original = adj[idx];
            let h = FD_STEP * original.abs().max(1.0);
            adj[idx] = original + h;
            let plus = projected(adj.view(), features)?;
            adj[idx] = original - h;
            let minus = projected(adj.view(), features)?;
            adj[idx] = original;
            grad_adj[idx] = (plus - minus) / (2.0 * h);
        }

        let mut feats = features.to_owned();
        let mut grad_feats = Array2::zeros(features.raw_dim());
        for idx in ndarray::indices(features.raw_dim()) {
            let original = feats[idx];
            let h = FD_STEP * original.abs().max(1.0);
            feats[idx] = original + h;
            let plus = projected(adjacency, feats.view())?;
            feats[idx] = original - h;
            let minus = projected(adjacency, feats.view())?;
            feats[idx] = original;
            grad_feats[idx] = (plus - minus) / (2.0 * h);
        }

        Ok((grad_adj, grad_feats))
    }
}

impl<T: GraphClassifier + ?Sized> GraphClassifier for &T {
    fn num_classes(&self) -> usize {
        (**self).num_classes()
    }

    fn logits(&self, adjacency: ArrayView2<f64>, features: ArrayView2<f64>) -> Result<Array1<f64>> {
        (**self).logits(adjacency, features)
    }

    fn logits_vjp(
        &self,
        adjacency: ArrayView2<f64>,
        features: ArrayView2<f64>,
        upstream: ArrayView1<f64>,
    ) -> Result<(Array2<f64>, Array2<f64>)> {
        (**self).logits_vjp(adjacency, features, upstream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    /// logits = [sum(A), sum(X^2)], no analytic gradient.
    struct QuadraticModel;

    impl GraphClassifier for QuadraticModel {
        fn num_classes(&self) -> usize {
            2
        }

        fn logits(&self, adjacency: ArrayView2<f64>, features: ArrayView2<f64>) -> Result<Array1<f64>> {
            Ok(array![adjacency.sum(), features.mapv(|v| v * v).sum()])
        }
    }

    #[test]
    fn finite_difference_vjp_matches_analytic_gradient() -> Result<()> {
        let adj = array![[0.0, 2.0], [2.0, 0.0]];
        let feats = array![[1.0, -3.0], [0.5, 2.0]];
        let upstream = array![0.5, 2.0];

        let (grad_adj, grad_feats) = QuadraticModel.logits_vjp(adj.view(), feats.view(), upstream.view())?;

        for &g in grad_adj.iter() {
            assert_abs_diff_eq!(g, 0.5, epsilon = 1e-6);
        }
        for (g, x) in grad_feats.iter().zip(feats.iter()) {
            assert_abs_diff_eq!(*g, 2.0 * 2.0 * x, epsilon = 1e-4);
        }
        Ok(())
    }

    #[test]
    fn vjp_rejects_wrong_upstream_length() {
        let adj = Array2::zeros((2, 2));
        let feats = Array2::zeros((2, 1));
        let err = QuadraticModel
            .logits_vjp(adj.view(), feats.view(), array![1.0].view())
            .unwrap_err();
        assert!(matches!(err, ExplainError::ShapeMismatch(_)));
    }
}
