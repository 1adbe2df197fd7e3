// src/core/data.rs
use crate::core::{ExplainError, Result};
use ndarray::{Array1, Array2};
use std::fmt;

/// Dense node-feature matrix, one row per node.
pub type Features = Array2<f64>;

/// Dense adjacency matrix of non-negative edge weights.
pub type Adjacency = Array2<f64>;

/// A single graph to be explained: dense adjacency, node features and its class label.
#[derive(Debug, Clone)]
pub struct GraphInstance {
    pub adjacency: Adjacency,
    pub features: Features,
    pub label: usize,
}

impl GraphInstance {
    pub fn new(adjacency: Adjacency, features: Features, label: usize) -> Result<Self> {
        let graph = GraphInstance {
            adjacency,
            features,
            label,
        };
        graph.validate()?;
        Ok(graph)
    }

    /// Checks that the adjacency is square, matches the node count of the
    /// features and carries no negative weights.
    pub fn validate(&self) -> Result<()> {
        let (rows, cols) = self.adjacency.dim();
        if rows != cols {
            return Err(ExplainError::ShapeMismatch(format!(
                "Adjacency must be square, got {}x{}.",
                rows, cols
            )));
        }
        if rows != self.features.nrows() {
            return Err(ExplainError::ShapeMismatch(format!(
                "Adjacency has {} nodes, but features have {} rows.",
                rows,
                self.features.nrows()
            )));
        }
        if self.adjacency.iter().any(|&w| w < 0.0 || w.is_nan()) {
            return Err(ExplainError::InvalidDomain(
                "Adjacency weights must be non-negative.".to_string(),
            ));
        }
        Ok(())
    }

    pub fn num_nodes(&self) -> usize {
        self.features.nrows()
    }

    pub fn num_features(&self) -> usize {
        self.features.ncols()
    }

    /// Number of non-zero adjacency entries.
    pub fn num_edges(&self) -> usize {
        self.adjacency.iter().filter(|&&w| w != 0.0).count()
    }
}

/// Why an optimisation run finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// All configured steps ran without the thresholded explanation changing the label.
    BudgetExhausted,
    /// The thresholded explanation at `step` changed the predicted label.
    LabelDrift { step: usize },
}

/// Progress of a single optimisation step, evaluated on the thresholded masks.
#[derive(Debug, Clone)]
pub struct StepStats {
    pub step: usize,
    pub loss: f64,
    pub kept_nodes: usize,
    pub kept_edges: usize,
    /// Kept edges over edges of the unmasked graph.
    pub density: f64,
    pub predicted_label: usize,
    pub probs: Array1<f64>,
}

/// Output of one mask-learning run.
#[derive(Debug, Clone)]
pub struct ExplanationResult {
    /// Adjacency with entries below the edge threshold zeroed, scaled by the learned edge mask.
    pub masked_adjacency: Adjacency,
    /// Features with masked-out nodes (or channels) zeroed. Kept rows (or channels) hold
    /// the raw feature values; unlike the adjacency, they are not scaled by the soft mask.
    pub masked_features: Features,
    /// One importance score per node.
    pub node_importance: Array1<f64>,
    /// Class probabilities of the classifier on the unmasked graph.
    pub probs_before: Array1<f64>,
    /// Class probabilities on the retained explanation.
    pub probs_after: Array1<f64>,
    /// The label the explanation preserves (the classifier's own prediction).
    pub predicted_label: usize,
    /// Step that produced the retained explanation; `None` means the unmasked input.
    pub best_step: Option<usize>,
    pub steps_run: usize,
    pub stop_reason: StopReason,
    pub history: Vec<StepStats>,
}

impl ExplanationResult {
    /// True when no masked step ever preserved the label.
    pub fn is_unreduced(&self) -> bool {
        self.best_step.is_none()
    }

    pub fn kept_edges(&self) -> usize {
        self.masked_adjacency.iter().filter(|&&w| w != 0.0).count()
    }

    pub fn kept_nodes(&self) -> usize {
        self.masked_features
            .rows()
            .into_iter()
            .filter(|row| row.iter().any(|&v| v != 0.0))
            .count()
    }
}

impl fmt::Display for ExplanationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Explanation:")?;
        writeln!(f, "  Predicted Label:  {}", self.predicted_label)?;
        match self.best_step {
            Some(step) => writeln!(f, "  Best Step:        {} / {}", step, self.steps_run)?,
            None => writeln!(f, "  Best Step:        none (unmasked) / {}", self.steps_run)?,
        }
        writeln!(f, "  Stop Reason:      {:?}", self.stop_reason)?;
        writeln!(
            f,
            "  Nodes Kept:       {} / {}",
            self.kept_nodes(),
            self.masked_features.nrows()
        )?;
        writeln!(f, "  Edges Kept:       {}", self.kept_edges())?;
        writeln!(f, "  Probabilities (after / before):")?;
        for (i, (after, before)) in self
            .probs_after
            .iter()
            .zip(self.probs_before.iter())
            .enumerate()
        {
            writeln!(f, "    Class {}: {:.4} / {:.4}", i, after, before)?;
        }
        Ok(())
    }
}
