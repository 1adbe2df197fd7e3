// src/metrics/explainer_metric.rs
use crate::core::{ExplainError, Result};
use crate::metrics::auc::{AucScorer, ScoreTable};
use crate::metrics::distance::{class_pairs, DistanceAggregator};
use crate::metrics::histogram::{HistogramBuilder, DEFAULT_NUM_BINS};
use crate::metrics::normalize::{normalize_node_concepts, normalize_node_importance};
use log::debug;
use ndarray::{Array1, Array2};

/// Configuration for the concept-based explanation metric.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainerMetricConfig {
    /// Numbers of nodes retained per sample; strictly increasing.
    pub keep_numbers: Vec<usize>,
    pub classes: Vec<usize>,
    pub num_bins: usize,
}

impl Default for ExplainerMetricConfig {
    fn default() -> Self {
        ExplainerMetricConfig {
            keep_numbers: (1..=10).map(|i| 5 * i).collect(),
            classes: vec![0, 1, 2],
            num_bins: DEFAULT_NUM_BINS,
        }
    }
}

impl ExplainerMetricConfig {
    /// Parses comma-separated lists, e.g. `("5,10,15", "0,1,2")`.
    pub fn from_lists(keep_numbers: &str, classes: &str) -> Result<Self> {
        Ok(ExplainerMetricConfig {
            keep_numbers: parse_list(keep_numbers)?,
            classes: parse_list(classes)?,
            ..Default::default()
        })
    }

    pub fn with_num_bins(mut self, num_bins: usize) -> Self {
        self.num_bins = num_bins;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.keep_numbers.len() < 2 {
            return Err(ExplainError::InvalidDomain(format!(
                "At least 2 keep numbers are needed, got {:?}.",
                self.keep_numbers
            )));
        }
        if self.keep_numbers.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ExplainError::InvalidDomain(format!(
                "Keep numbers must be strictly increasing: {:?}",
                self.keep_numbers
            )));
        }
        if self.keep_numbers[0] == 0 {
            return Err(ExplainError::InvalidDomain("Keep numbers must be positive.".to_string()));
        }
        if class_pairs(&self.classes).is_empty() {
            return Err(ExplainError::InvalidDomain(format!(
                "At least 2 distinct classes are needed, got {:?}.",
                self.classes
            )));
        }
        if self.num_bins == 0 {
            return Err(ExplainError::InvalidInput("Histogram needs at least one bin.".to_string()));
        }
        Ok(())
    }
}

fn parse_list(text: &str) -> Result<Vec<usize>> {
    text.split(',')
        .map(|item| {
            item.trim()
                .parse::<usize>()
                .map_err(|e| ExplainError::InvalidInput(format!("Cannot parse '{}' in '{}': {}", item, text, e)))
        })
        .collect()
}

/// Scores how well an explainer's node rankings separate classes in concept space.
///
/// Pipeline: normalise importances (per sample) and concepts (globally), build
/// per-class concept histograms over the `k` least important nodes, take the
/// Wasserstein distance for every class pair, and integrate over `k`.
#[derive(Debug, Clone)]
pub struct ExplainerMetric {
    config: ExplainerMetricConfig,
    classes: Vec<usize>,
    class_pairs: Vec<(usize, usize)>,
    builder: HistogramBuilder,
}

impl ExplainerMetric {
    pub fn new(config: Option<ExplainerMetricConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();
        config.validate()?;
        let mut classes = config.classes.clone();
        classes.sort_unstable();
        classes.dedup();
        let class_pairs = class_pairs(&classes);
        let builder = HistogramBuilder::new(config.num_bins)?;
        Ok(ExplainerMetric {
            config,
            classes,
            class_pairs,
            builder,
        })
    }

    pub fn config(&self) -> &ExplainerMetricConfig {
        &self.config
    }

    /// Class pairs in output order.
    pub fn class_pairs(&self) -> &[(usize, usize)] {
        &self.class_pairs
    }

    pub fn process(
        &self,
        importances: &[Array1<f64>],
        concepts: &[Array2<f64>],
        labels: &[usize],
    ) -> Result<ScoreTable> {
        if concepts.is_empty() {
            return Err(ExplainError::InvalidInput("No samples to score.".to_string()));
        }
        if importances.len() != concepts.len() || labels.len() != concepts.len() {
            return Err(ExplainError::ShapeMismatch(format!(
                "Got {} importance vectors, {} concept matrices and {} labels.",
                importances.len(),
                concepts.len(),
                labels.len()
            )));
        }
        let n_concepts = concepts[0].ncols();

        let importances = normalize_node_importance(importances);
        let pooled = normalize_node_concepts(concepts)?;
        let samples = pooled.samples();
        debug!(
            "{} samples | {} nodes | {} concepts | {} class pairs",
            samples.len(),
            pooled.values().nrows(),
            n_concepts,
            self.class_pairs.len()
        );

        let histograms = self.builder.build(
            &importances,
            &samples,
            labels,
            &self.config.keep_numbers,
            &self.classes,
        )?;
        let distances = DistanceAggregator.aggregate(
            &histograms,
            &self.config.keep_numbers,
            &self.class_pairs,
            n_concepts,
        )?;
        AucScorer.score(&distances, &self.config.keep_numbers)
    }
}
