// src/algorithms/mask_explainer.rs

use crate::algorithms::optimizer::Adam;
use crate::core::{
    ExplainError, ExplanationResult, GraphInstance, Result, StepStats, StopReason,
};
use crate::traits::GraphClassifier;
use crate::utils::{argmax, sigmoid, softmax};
use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Clamp for mask values inside log terms.
const MASK_EPS: f64 = 1e-12;

/// What a single entry of the feature mask covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskGranularity {
    /// One entry per node, scaling the node's whole feature row.
    Node,
    /// One entry per feature channel, shared across nodes.
    Channel,
}

/// Configuration for the mask-learning explainer.
#[derive(Debug, Clone)]
pub struct MaskExplainerConfig {
    pub num_steps: usize,
    pub learning_rate: f64,
    /// Masked edge weights at or below this value are dropped from the reported explanation.
    pub adj_thresh: f64,
    /// Feature-mask entries at or below this value are dropped from the reported explanation.
    pub node_thresh: f64,
    pub edge_size_coef: f64,
    pub edge_entropy_coef: f64,
    pub feat_size_coef: f64,
    pub feat_entropy_coef: f64,
    /// Mean and standard deviation of the initial (pre-sigmoid) mask parameters.
    pub init_mean: f64,
    pub init_std: f64,
    pub granularity: MaskGranularity,
    pub seed: u64,
}

impl Default for MaskExplainerConfig {
    fn default() -> Self {
        MaskExplainerConfig {
            num_steps: 100,
            learning_rate: 0.01,
            adj_thresh: 0.1,
            node_thresh: 0.1,
            edge_size_coef: 0.005,
            edge_entropy_coef: 1.0,
            feat_size_coef: 1.0,
            feat_entropy_coef: 0.1,
            init_mean: 1.0,
            init_std: 0.1,
            granularity: MaskGranularity::Node,
            seed: 0,
        }
    }
}

impl MaskExplainerConfig {
    pub fn with_num_steps(mut self, num_steps: usize) -> Self {
        self.num_steps = num_steps;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_thresholds(mut self, adj_thresh: f64, node_thresh: f64) -> Self {
        self.adj_thresh = adj_thresh;
        self.node_thresh = node_thresh;
        self
    }

    pub fn with_edge_regularisation(mut self, size_coef: f64, entropy_coef: f64) -> Self {
        self.edge_size_coef = size_coef;
        self.edge_entropy_coef = entropy_coef;
        self
    }

    pub fn with_feature_regularisation(mut self, size_coef: f64, entropy_coef: f64) -> Self {
        self.feat_size_coef = size_coef;
        self.feat_entropy_coef = entropy_coef;
        self
    }

    pub fn with_granularity(mut self, granularity: MaskGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ExplainError::InvalidInput(format!(
                "Learning rate must be positive, got {}.",
                self.learning_rate
            )));
        }
        for (name, value) in [("adj_thresh", self.adj_thresh), ("node_thresh", self.node_thresh)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ExplainError::InvalidInput(format!(
                    "{} must lie in [0, 1], got {}.",
                    name, value
                )));
            }
        }
        let coefs = [
            self.edge_size_coef,
            self.edge_entropy_coef,
            self.feat_size_coef,
            self.feat_entropy_coef,
        ];
        if coefs.iter().any(|c| !(*c >= 0.0 && c.is_finite())) {
            return Err(ExplainError::InvalidInput(
                "Regularisation coefficients must be finite and non-negative.".to_string(),
            ));
        }
        if !(self.init_std >= 0.0 && self.init_std.is_finite() && self.init_mean.is_finite()) {
            return Err(ExplainError::InvalidInput(format!(
                "Invalid mask initialisation N({}, {}).",
                self.init_mean, self.init_std
            )));
        }
        Ok(())
    }
}

/// Explanation retained so far. Replaced wholesale whenever a step preserves the label.
#[derive(Debug, Clone)]
struct Retained {
    masked_adjacency: Array2<f64>,
    masked_features: Array2<f64>,
    node_importance: Array1<f64>,
    probs: Array1<f64>,
    step: Option<usize>,
}

/// Learnable, unconstrained mask parameters. Masks are their sigmoid.
#[derive(Debug, Clone)]
struct MaskParams {
    edge: Array2<f64>,
    feat: Array1<f64>,
}

/// Soft masks and the masked inputs they produce.
struct MaskedInputs {
    edge_mask: Array2<f64>,
    feat_mask: Array1<f64>,
    adjacency: Array2<f64>,
    features: Array2<f64>,
}

/// Learns edge and feature masks that keep a frozen classifier's prediction
/// while removing as much of the graph as possible.
#[derive(Debug)]
pub struct MaskExplainer<M: GraphClassifier> {
    model: M,
    config: MaskExplainerConfig,
}

impl<M: GraphClassifier> MaskExplainer<M> {
    pub fn new(model: M, config: Option<MaskExplainerConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();
        config.validate()?;
        if model.num_classes() == 0 {
            return Err(ExplainError::InvalidInput(
                "Classifier reports zero classes.".to_string(),
            ));
        }
        Ok(MaskExplainer { model, config })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &MaskExplainerConfig {
        &self.config
    }

    /// Explains each graph independently, in order.
    pub fn explain_all(&self, graphs: &[GraphInstance]) -> Result<Vec<ExplanationResult>> {
        graphs.iter().map(|graph| self.explain(graph)).collect()
    }

    pub fn explain(&self, graph: &GraphInstance) -> Result<ExplanationResult> {
        graph.validate()?;
        let num_classes = self.model.num_classes();
        if graph.label >= num_classes {
            return Err(ExplainError::ShapeMismatch(format!(
                "Label {} is out of range for a {}-class model.",
                graph.label, num_classes
            )));
        }
        let adjacency = graph.adjacency.view();
        let features = graph.features.view();

        let init_logits = self.checked_logits(adjacency, features)?;
        let probs_before = softmax(init_logits.view());
        let target = argmax(init_logits.view());
        let init_edges = graph.num_edges();
        let num_nodes = graph.num_nodes();

        let mut params = self.init_params(graph)?;
        let mut edge_opt = Adam::new(self.config.learning_rate, params.edge.raw_dim());
        let mut feat_opt = Adam::new(self.config.learning_rate, params.feat.raw_dim());

        let initial = self.apply_masks(&params, adjacency, features);
        let mut best = Retained {
            masked_adjacency: graph.adjacency.clone(),
            masked_features: graph.features.clone(),
            node_importance: self.node_importance(&initial),
            probs: probs_before.clone(),
            step: None,
        };

        debug!(
            "Nodes {} / {} | Edges {} / {} | Density 1.00 | Label {} (true {})",
            num_nodes, num_nodes, init_edges, init_edges, target, graph.label
        );

        let mut history = Vec::with_capacity(self.config.num_steps);
        let mut stop_reason = StopReason::BudgetExhausted;
        let mut steps_run = 0;

        for step in 0..self.config.num_steps {
            steps_run = step + 1;
            let soft = self.apply_masks(&params, adjacency, features);
            let logits = self.checked_logits(soft.adjacency.view(), soft.features.view())?;
            let probs = softmax(logits.view());
            let loss = self.loss(&soft, &probs, target, adjacency);

            let (kept_adjacency, kept_features) = self.threshold(&soft, features);
            let kept_logits = self.checked_logits(kept_adjacency.view(), kept_features.view())?;
            let kept_probs = softmax(kept_logits.view());
            let predicted_label = argmax(kept_logits.view());

            let kept_edges = kept_adjacency.iter().filter(|&&w| w != 0.0).count();
            let kept_nodes = kept_features
                .rows()
                .into_iter()
                .filter(|row| row.iter().any(|&v| v != 0.0))
                .count();
            let density = if init_edges == 0 {
                1.0
            } else {
                kept_edges as f64 / init_edges as f64
            };
            debug!(
                "Step {} | Nodes {} / {} | Edges {} / {} | Density {:.2} | Loss {:.4} | Label {} | {}",
                step,
                kept_nodes,
                num_nodes,
                kept_edges,
                init_edges,
                density,
                loss,
                predicted_label,
                describe_probs(kept_probs.view(), probs_before.view())
            );
            history.push(StepStats {
                step,
                loss,
                kept_nodes,
                kept_edges,
                density,
                predicted_label,
                probs: kept_probs.clone(),
            });

            if predicted_label != target {
                info!(
                    "Predicted label changed ({} -> {}) at step {}. Early stopping.",
                    target, predicted_label, step
                );
                stop_reason = StopReason::LabelDrift { step };
                break;
            }
            best = Retained {
                masked_adjacency: kept_adjacency,
                masked_features: kept_features,
                node_importance: self.node_importance(&soft),
                probs: kept_probs,
                step: Some(step),
            };

            let (edge_grad, feat_grad) = self.gradients(&params, &soft, &probs, target, adjacency, features)?;
            edge_opt.step(&mut params.edge, &edge_grad)?;
            feat_opt.step(&mut params.feat, &feat_grad)?;
        }

        Ok(ExplanationResult {
            masked_adjacency: best.masked_adjacency,
            masked_features: best.masked_features,
            node_importance: best.node_importance,
            probs_before,
            probs_after: best.probs,
            predicted_label: target,
            best_step: best.step,
            steps_run,
            stop_reason,
            history,
        })
    }

    fn checked_logits(&self, adjacency: ArrayView2<f64>, features: ArrayView2<f64>) -> Result<Array1<f64>> {
        let logits = self.model.logits(adjacency, features)?;
        if logits.len() != self.model.num_classes() {
            return Err(ExplainError::ShapeMismatch(format!(
                "Model returned {} logits for {} classes.",
                logits.len(),
                self.model.num_classes()
            )));
        }
        if logits.iter().any(|v| !v.is_finite()) {
            return Err(ExplainError::Model("Model returned non-finite logits.".to_string()));
        }
        Ok(logits)
    }

    fn init_params(&self, graph: &GraphInstance) -> Result<MaskParams> {
        let normal = Normal::new(self.config.init_mean, self.config.init_std)
            .map_err(|e| ExplainError::InvalidInput(format!("Mask initialisation failed: {}", e)))?;
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let n = graph.num_nodes();
        let edge = Array2::from_shape_simple_fn((n, n), || normal.sample(&mut rng));
        let feat_len = match self.config.granularity {
            MaskGranularity::Node => n,
            MaskGranularity::Channel => graph.num_features(),
        };
        let feat = Array1::from_shape_simple_fn(feat_len, || normal.sample(&mut rng));
        Ok(MaskParams { edge, feat })
    }

    fn apply_masks(
        &self,
        params: &MaskParams,
        adjacency: ArrayView2<f64>,
        features: ArrayView2<f64>,
    ) -> MaskedInputs {
        let edge_mask = params.edge.mapv(sigmoid);
        let feat_mask = params.feat.mapv(sigmoid);
        let masked_adjacency = &adjacency * &edge_mask;
        let masked_features = match self.config.granularity {
            MaskGranularity::Node => &features * &feat_mask.view().insert_axis(Axis(1)),
            MaskGranularity::Channel => &features * &feat_mask.view().insert_axis(Axis(0)),
        };
        MaskedInputs {
            edge_mask,
            feat_mask,
            adjacency: masked_adjacency,
            features: masked_features,
        }
    }

    /// Hard-thresholded copy of the current masks, used only for reporting and the
    /// early-stop check. Kept edges stay scaled by their mask, kept features are unscaled.
    fn threshold(&self, soft: &MaskedInputs, features: ArrayView2<f64>) -> (Array2<f64>, Array2<f64>) {
        let adj_thresh = self.config.adj_thresh;
        let node_thresh = self.config.node_thresh;
        let kept_adjacency = soft.adjacency.mapv(|w| if w > adj_thresh { w } else { 0.0 });
        let keep = soft.feat_mask.mapv(|m| if m > node_thresh { 1.0 } else { 0.0 });
        let kept_features = match self.config.granularity {
            MaskGranularity::Node => &features * &keep.view().insert_axis(Axis(1)),
            MaskGranularity::Channel => &features * &keep.view().insert_axis(Axis(0)),
        };
        (kept_adjacency, kept_features)
    }

    fn node_importance(&self, soft: &MaskedInputs) -> Array1<f64> {
        match self.config.granularity {
            MaskGranularity::Node => soft.feat_mask.clone(),
            MaskGranularity::Channel => soft.features.mapv(f64::abs).sum_axis(Axis(1)),
        }
    }

    /// Cross-entropy toward `target` plus size and entropy penalties on both masks.
    fn loss(&self, soft: &MaskedInputs, probs: &Array1<f64>, target: usize, adjacency: ArrayView2<f64>) -> f64 {
        let fidelity = -probs[target].max(MASK_EPS).ln();

        let edge_values: Vec<f64> = soft
            .edge_mask
            .iter()
            .zip(adjacency.iter())
            .filter(|&(_, &w)| w != 0.0)
            .map(|(&m, _)| m)
            .collect();
        let edge_size = self.config.edge_size_coef * edge_values.iter().sum::<f64>();
        let edge_entropy = self.config.edge_entropy_coef * mean(edge_values.iter().map(|&m| binary_entropy(m)));

        let feat_size = self.config.feat_size_coef * mean(soft.feat_mask.iter().cloned());
        let feat_entropy = self.config.feat_entropy_coef * mean(soft.feat_mask.iter().map(|&m| binary_entropy(m)));

        fidelity + edge_size + edge_entropy + feat_size + feat_entropy
    }

    /// Gradients of [`Self::loss`] with respect to the unconstrained mask parameters.
    fn gradients(
        &self,
        params: &MaskParams,
        soft: &MaskedInputs,
        probs: &Array1<f64>,
        target: usize,
        adjacency: ArrayView2<f64>,
        features: ArrayView2<f64>,
    ) -> Result<(Array2<f64>, Array1<f64>)> {
        let mut upstream = probs.clone();
        upstream[target] -= 1.0;
        let (grad_adj, grad_feats) =
            self.model
                .logits_vjp(soft.adjacency.view(), soft.features.view(), upstream.view())?;
        if grad_adj.dim() != adjacency.dim() || grad_feats.dim() != features.dim() {
            return Err(ExplainError::ShapeMismatch(
                "Model gradients do not match the input shapes.".to_string(),
            ));
        }

        let num_edges = adjacency.iter().filter(|&&w| w != 0.0).count().max(1) as f64;
        let edge_size = self.config.edge_size_coef;
        let edge_entropy = self.config.edge_entropy_coef / num_edges;
        let mut edge_grad: Array2<f64> = Array2::zeros(params.edge.raw_dim());
        Zip::from(&mut edge_grad)
            .and(&grad_adj)
            .and(adjacency)
            .and(&soft.edge_mask)
            .for_each(|out, &g, &w, &m| {
                if w != 0.0 {
                    let d_mask = g * w + edge_size + edge_entropy * binary_entropy_grad(m);
                    *out = d_mask * m * (1.0 - m);
                }
            });

        // d loss / d feat_mask from the fidelity term
        let weighted = &grad_feats * &features;
        let fidelity_grad = match self.config.granularity {
            MaskGranularity::Node => weighted.sum_axis(Axis(1)),
            MaskGranularity::Channel => weighted.sum_axis(Axis(0)),
        };
        let len = soft.feat_mask.len().max(1) as f64;
        let feat_size = self.config.feat_size_coef / len;
        let feat_entropy = self.config.feat_entropy_coef / len;
        let mut feat_grad: Array1<f64> = Array1::zeros(params.feat.raw_dim());
        Zip::from(&mut feat_grad)
            .and(&fidelity_grad)
            .and(&soft.feat_mask)
            .for_each(|out, &g, &m| {
                let d_mask = g + feat_size + feat_entropy * binary_entropy_grad(m);
                *out = d_mask * m * (1.0 - m);
            });

        Ok((edge_grad, feat_grad))
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn binary_entropy(m: f64) -> f64 {
    let m = m.clamp(MASK_EPS, 1.0 - MASK_EPS);
    -m * m.ln() - (1.0 - m) * (1.0 - m).ln()
}

/// d/dm of [`binary_entropy`].
fn binary_entropy_grad(m: f64) -> f64 {
    let m = m.clamp(MASK_EPS, 1.0 - MASK_EPS);
    ((1.0 - m) / m).ln()
}

fn describe_probs(after: ArrayView1<f64>, before: ArrayView1<f64>) -> String {
    after
        .iter()
        .zip(before.iter())
        .enumerate()
        .map(|(i, (a, b))| format!("class {} {:.2} / {:.2}", i, a, b))
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GraphConvClassifier;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    /// Node 0 alone drives class 0; nodes 1..3 push class 1.
    fn star_graph() -> GraphInstance {
        let adjacency = array![
            [0.0, 1.0, 0.0, 0.0],
            [1.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
        ];
        let features = array![[5.0, 0.0], [0.0, 1.0], [0.0, 1.0], [0.0, 1.0]];
        GraphInstance::new(adjacency, features, 0).unwrap()
    }

    fn identity_model() -> GraphConvClassifier {
        GraphConvClassifier::new(array![[1.0, 0.0], [0.0, 1.0]], array![0.0, 0.0]).unwrap()
    }

    fn config(num_steps: usize) -> MaskExplainerConfig {
        MaskExplainerConfig::default()
            .with_num_steps(num_steps)
            .with_learning_rate(0.1)
    }

    #[test]
    fn probs_before_is_unmasked_softmax_for_any_budget() -> Result<()> {
        let graph = star_graph();
        let model = identity_model();
        let expected = softmax(model.logits(graph.adjacency.view(), graph.features.view())?.view());
        for steps in [0, 1, 5, 50] {
            let explainer = MaskExplainer::new(&model, Some(config(steps)))?;
            let result = explainer.explain(&graph)?;
            for (a, b) in result.probs_before.iter().zip(expected.iter()) {
                assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn zero_steps_returns_unmasked_graph() -> Result<()> {
        let graph = star_graph();
        let explainer = MaskExplainer::new(identity_model(), Some(config(0)))?;
        let result = explainer.explain(&graph)?;
        assert!(result.is_unreduced());
        assert_eq!(result.steps_run, 0);
        assert_eq!(result.stop_reason, StopReason::BudgetExhausted);
        assert_eq!(result.masked_adjacency, graph.adjacency);
        assert_eq!(result.masked_features, graph.features);
        assert_eq!(result.node_importance.len(), graph.num_nodes());
        Ok(())
    }

    #[test]
    fn optimisation_prunes_distractor_nodes_and_keeps_label() -> Result<()> {
        let graph = star_graph();
        let model = identity_model();
        let explainer = MaskExplainer::new(&model, Some(config(200)))?;
        let result = explainer.explain(&graph)?;

        assert_eq!(result.predicted_label, 0);
        assert_eq!(result.stop_reason, StopReason::BudgetExhausted);
        assert_eq!(result.best_step, Some(199));
        assert_eq!(result.history.len(), 200);

        // node 0 is kept, the class-1 nodes are pruned
        assert!(result.masked_features.row(0).iter().any(|&v| v != 0.0));
        // kept features are not scaled by the soft mask
        assert_eq!(result.masked_features.row(0), graph.features.row(0));
        assert!(result.node_importance[0] < 1.0);
        for n in 1..4 {
            assert!(result.masked_features.row(n).iter().all(|&v| v == 0.0));
            assert!(result.node_importance[0] > result.node_importance[n]);
        }
        assert_eq!(result.kept_nodes(), 1);
        Ok(())
    }

    #[test]
    fn size_penalty_alone_prunes_edges_into_distractors() -> Result<()> {
        let graph = star_graph();
        let cfg = config(200).with_edge_regularisation(0.005, 0.0);
        let result = MaskExplainer::new(identity_model(), Some(cfg))?.explain(&graph)?;

        // only the edge feeding node 0 survives
        assert!(result.masked_adjacency[[1, 0]] > 0.0);
        assert_eq!(result.masked_adjacency[[0, 1]], 0.0);
        assert_eq!(result.masked_adjacency[[1, 2]], 0.0);
        assert_eq!(result.masked_adjacency[[2, 1]], 0.0);
        assert_eq!(result.kept_edges(), 1);
        let last = result.history.last().unwrap();
        assert_abs_diff_eq!(last.density, 0.25, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn returned_explanation_preserves_predicted_label() -> Result<()> {
        let graph = star_graph();
        let model = identity_model();
        for steps in [1, 10, 100] {
            let explainer = MaskExplainer::new(&model, Some(config(steps)))?;
            let result = explainer.explain(&graph)?;
            let logits = model.logits(result.masked_adjacency.view(), result.masked_features.view())?;
            assert_eq!(argmax(logits.view()), result.predicted_label);
            let after = softmax(logits.view());
            for (a, b) in after.iter().zip(result.probs_after.iter()) {
                assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn drift_at_first_step_keeps_unmasked_state() -> Result<()> {
        let graph = star_graph();
        // An empty explanation falls back to the bias, which favours class 1.
        let model = GraphConvClassifier::new(array![[1.0, 0.0], [0.0, 1.0]], array![0.0, 1.0])?;
        let cfg = config(20).with_thresholds(1.0, 1.0);
        let result = MaskExplainer::new(&model, Some(cfg))?.explain(&graph)?;

        assert_eq!(result.stop_reason, StopReason::LabelDrift { step: 0 });
        assert!(result.is_unreduced());
        assert_eq!(result.steps_run, 1);
        assert_eq!(result.history.len(), 1);
        assert_eq!(result.history[0].predicted_label, 1);
        assert_eq!(result.masked_adjacency, graph.adjacency);
        assert_eq!(result.masked_features, graph.features);
        assert_eq!(result.probs_after, result.probs_before);
        Ok(())
    }

    #[test]
    fn channel_granularity_yields_per_node_importance() -> Result<()> {
        let graph = star_graph();
        let cfg = config(30).with_granularity(MaskGranularity::Channel);
        let result = MaskExplainer::new(identity_model(), Some(cfg))?.explain(&graph)?;
        assert_eq!(result.node_importance.len(), graph.num_nodes());
        assert!(result.node_importance.iter().all(|v| *v >= 0.0));
        let logits = identity_model().logits(result.masked_adjacency.view(), result.masked_features.view())?;
        assert_eq!(argmax(logits.view()), result.predicted_label);
        Ok(())
    }

    #[test]
    fn runs_are_reproducible_per_seed() -> Result<()> {
        let graph = star_graph();
        let model = identity_model();
        let a = MaskExplainer::new(&model, Some(config(15).with_seed(7)))?.explain(&graph)?;
        let b = MaskExplainer::new(&model, Some(config(15).with_seed(7)))?.explain(&graph)?;
        assert_eq!(a.node_importance, b.node_importance);
        assert_eq!(a.masked_adjacency, b.masked_adjacency);
        Ok(())
    }

    #[test]
    fn rejects_label_outside_model_classes() {
        let mut graph = star_graph();
        graph.label = 5;
        let err = MaskExplainer::new(identity_model(), None)
            .unwrap()
            .explain(&graph)
            .unwrap_err();
        assert!(matches!(err, ExplainError::ShapeMismatch(_)));
    }

    #[test]
    fn rejects_model_feature_mismatch() {
        let graph = GraphInstance::new(Array2::zeros((2, 2)), Array2::ones((2, 3)), 0).unwrap();
        let err = MaskExplainer::new(identity_model(), None)
            .unwrap()
            .explain(&graph)
            .unwrap_err();
        assert!(matches!(err, ExplainError::ShapeMismatch(_)));
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = MaskExplainerConfig::default().with_thresholds(1.5, 0.1);
        assert!(matches!(
            MaskExplainer::new(identity_model(), Some(cfg)),
            Err(ExplainError::InvalidInput(_))
        ));
        let cfg = MaskExplainerConfig::default().with_learning_rate(0.0);
        assert!(MaskExplainer::new(identity_model(), Some(cfg)).is_err());
    }

    #[test]
    fn explain_all_runs_each_graph() -> Result<()> {
        let graphs = vec![star_graph(), star_graph()];
        let results = MaskExplainer::new(identity_model(), Some(config(3)))?.explain_all(&graphs)?;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].node_importance, results[1].node_importance);
        Ok(())
    }
}
