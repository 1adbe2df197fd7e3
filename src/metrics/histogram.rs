// src/metrics/histogram.rs
use crate::core::{ExplainError, Result};
use crate::utils::min_max;
use log::{debug, warn};
use ndarray::{concatenate, Array1, ArrayView1, ArrayView2, Axis};
use std::collections::BTreeMap;

pub const DEFAULT_NUM_BINS: usize = 100;

/// A 1-D density histogram over equal-width bins.
///
/// A zero-range input yields a *degenerate* histogram: a single zero-width bin
/// at the observed value holding unit mass.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    edges: Array1<f64>,
    density: Array1<f64>,
}

impl Histogram {
    /// Builds a histogram, falling back to a degenerate one when all values are equal.
    pub fn new(values: ArrayView1<f64>, num_bins: usize) -> Result<Self> {
        match Self::try_new(values, num_bins) {
            Err(ExplainError::DegenerateHistogram(msg)) => {
                warn!("{}; using a single-value histogram", msg);
                Ok(Self::degenerate(values[0]))
            }
            other => other,
        }
    }

    /// Builds a histogram, reporting [`ExplainError::DegenerateHistogram`] on zero-range input.
    pub fn try_new(values: ArrayView1<f64>, num_bins: usize) -> Result<Self> {
        if num_bins == 0 {
            return Err(ExplainError::InvalidInput("Histogram needs at least one bin.".to_string()));
        }
        if values.is_empty() {
            return Err(ExplainError::InvalidDomain(
                "Cannot build a histogram from no values.".to_string(),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ExplainError::InvalidInput(
                "Histogram values must be finite.".to_string(),
            ));
        }
        let (lo, hi) = min_max(values);
        if hi == lo {
            return Err(ExplainError::DegenerateHistogram(format!(
                "all {} values equal {}",
                values.len(),
                lo
            )));
        }

        let width = (hi - lo) / num_bins as f64;
        let mut counts = Array1::<f64>::zeros(num_bins);
        for &v in values.iter() {
            // the last bin is closed on the right
            let bin = (((v - lo) / width).floor() as usize).min(num_bins - 1);
            counts[bin] += 1.0;
        }
        let density = counts / (values.len() as f64 * width);
        Ok(Histogram {
            edges: Array1::linspace(lo, hi, num_bins + 1),
            density,
        })
    }

    pub fn degenerate(value: f64) -> Self {
        Histogram {
            edges: Array1::from_elem(2, value),
            density: Array1::ones(1),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.edges[0] == self.edges[self.edges.len() - 1]
    }

    pub fn num_bins(&self) -> usize {
        self.density.len()
    }

    pub fn edges(&self) -> ArrayView1<'_, f64> {
        self.edges.view()
    }

    pub fn density(&self) -> ArrayView1<'_, f64> {
        self.density.view()
    }

    pub fn bin_centers(&self) -> Array1<f64> {
        self.edges
            .windows(2)
            .into_iter()
            .map(|w| 0.5 * (w[0] + w[1]))
            .collect()
    }

    /// Probability mass per bin; sums to one.
    pub fn bin_masses(&self) -> Array1<f64> {
        if self.is_degenerate() {
            return self.density.clone();
        }
        let widths: Array1<f64> = self.edges.windows(2).into_iter().map(|w| w[1] - w[0]).collect();
        &self.density * &widths
    }
}

/// Histograms of one pool (one truncation size, one class), one per concept.
#[derive(Debug, Clone)]
pub struct PoolHistograms {
    /// Number of node rows pooled across the class's samples.
    pub pool_size: usize,
    pub histograms: Vec<Histogram>,
}

/// Histograms indexed by (truncation size, class, concept). Immutable once built.
#[derive(Debug, Clone)]
pub struct HistogramTable {
    pools: BTreeMap<(usize, usize), PoolHistograms>,
    n_concepts: usize,
}

impl HistogramTable {
    pub fn get(&self, k: usize, class: usize, concept: usize) -> Option<&Histogram> {
        self.pools.get(&(k, class))?.histograms.get(concept)
    }

    pub fn pool(&self, k: usize, class: usize) -> Option<&PoolHistograms> {
        self.pools.get(&(k, class))
    }

    pub fn n_concepts(&self) -> usize {
        self.n_concepts
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

/// Pools the concept values of each sample's *k least important* nodes per
/// class and bins every concept into a density histogram.
#[derive(Debug, Clone)]
pub struct HistogramBuilder {
    num_bins: usize,
}

impl Default for HistogramBuilder {
    fn default() -> Self {
        HistogramBuilder {
            num_bins: DEFAULT_NUM_BINS,
        }
    }
}

impl HistogramBuilder {
    pub fn new(num_bins: usize) -> Result<Self> {
        if num_bins == 0 {
            return Err(ExplainError::InvalidInput("Histogram needs at least one bin.".to_string()));
        }
        Ok(HistogramBuilder { num_bins })
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    pub fn build(
        &self,
        importances: &[Array1<f64>],
        concepts: &[ArrayView2<f64>],
        labels: &[usize],
        keep_numbers: &[usize],
        classes: &[usize],
    ) -> Result<HistogramTable> {
        if importances.len() != concepts.len() || importances.len() != labels.len() {
            return Err(ExplainError::ShapeMismatch(format!(
                "Got {} importance vectors, {} concept matrices and {} labels.",
                importances.len(),
                concepts.len(),
                labels.len()
            )));
        }
        let n_concepts = concepts.first().map(|c| c.ncols()).unwrap_or(0);
        for (i, (importance, concept)) in importances.iter().zip(concepts.iter()).enumerate() {
            if importance.len() != concept.nrows() {
                return Err(ExplainError::ShapeMismatch(format!(
                    "Sample {} has {} importance scores but {} concept rows.",
                    i,
                    importance.len(),
                    concept.nrows()
                )));
            }
            if concept.ncols() != n_concepts {
                return Err(ExplainError::ShapeMismatch(format!(
                    "Sample {} has {} concepts, expected {}.",
                    i,
                    concept.ncols(),
                    n_concepts
                )));
            }
        }
        if keep_numbers.iter().any(|&k| k == 0) {
            return Err(ExplainError::InvalidDomain("Keep numbers must be positive.".to_string()));
        }

        // node order is fixed per sample, independent of k
        let orders: Vec<Vec<usize>> = importances.iter().map(|s| ascending_order(s.view())).collect();

        let mut pools = BTreeMap::new();
        for &k in keep_numbers {
            for &class in classes {
                let members: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == class).collect();
                if members.is_empty() {
                    return Err(ExplainError::InvalidDomain(format!(
                        "No samples with class {}.",
                        class
                    )));
                }

                // fewer than k nodes: every node is kept
                let kept: Vec<_> = members
                    .iter()
                    .map(|&i| {
                        let take = k.min(orders[i].len());
                        concepts[i].select(Axis(0), &orders[i][..take])
                    })
                    .collect();
                let views: Vec<ArrayView2<f64>> = kept.iter().map(|c| c.view()).collect();
                let pool = concatenate(Axis(0), &views)?;
                if pool.nrows() == 0 {
                    return Err(ExplainError::InvalidDomain(format!(
                        "Class {} has no nodes to pool at k = {}.",
                        class, k
                    )));
                }

                let histograms = pool
                    .columns()
                    .into_iter()
                    .map(|column| Histogram::new(column, self.num_bins))
                    .collect::<Result<Vec<_>>>()?;
                debug!(
                    "k = {} | class {} | {} samples | {} pooled nodes",
                    k,
                    class,
                    members.len(),
                    pool.nrows()
                );
                pools.insert(
                    (k, class),
                    PoolHistograms {
                        pool_size: pool.nrows(),
                        histograms,
                    },
                );
            }
        }

        Ok(HistogramTable { pools, n_concepts })
    }
}

/// Node indices sorted by ascending importance; ties keep node order, NaNs sort last.
pub fn ascending_order(importance: ArrayView1<f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..importance.len()).collect();
    order.sort_by(|&a, &b| {
        let (x, y) = (importance[a], importance[b]);
        match (x.is_nan(), y.is_nan()) {
            (false, false) => x.total_cmp(&y),
            (nan_x, nan_y) => nan_x.cmp(&nan_y),
        }
    });
    order
}
