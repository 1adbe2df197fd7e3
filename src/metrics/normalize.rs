// src/metrics/normalize.rs
use crate::core::{ExplainError, Result};
use crate::utils::min_max_scale;
use ndarray::{concatenate, s, Array1, Array2, ArrayView2, Axis};

/// Min-max normalises each sample's node importance independently.
pub fn normalize_node_importance(importances: &[Array1<f64>]) -> Vec<Array1<f64>> {
    importances.iter().map(|x| min_max_scale(x.view())).collect()
}

/// Concept matrices of all samples stacked row-wise and normalised per concept,
/// with prefix-sum offsets to recover each sample's rows.
#[derive(Debug, Clone)]
pub struct PooledConcepts {
    values: Array2<f64>,
    /// `offsets[i]..offsets[i + 1]` are the rows of sample `i`.
    offsets: Vec<usize>,
}

impl PooledConcepts {
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn num_samples(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn num_concepts(&self) -> usize {
        self.values.ncols()
    }

    pub fn sample(&self, index: usize) -> Option<ArrayView2<'_, f64>> {
        if index >= self.num_samples() {
            return None;
        }
        let (start, end) = (self.offsets[index], self.offsets[index + 1]);
        Some(self.values.slice(s![start..end, ..]))
    }

    pub fn samples(&self) -> Vec<ArrayView2<'_, f64>> {
        self.offsets
            .windows(2)
            .map(|w| self.values.slice(s![w[0]..w[1], ..]))
            .collect()
    }

    pub fn into_samples(self) -> Vec<Array2<f64>> {
        self.samples().into_iter().map(|v| v.to_owned()).collect()
    }
}

/// Min-max normalises each concept column over the nodes of *all* samples,
/// so concept values stay comparable across samples.
pub fn normalize_node_concepts(concepts: &[Array2<f64>]) -> Result<PooledConcepts> {
    let n_concepts = match concepts.first() {
        Some(first) => first.ncols(),
        None => {
            return Ok(PooledConcepts {
                values: Array2::zeros((0, 0)),
                offsets: vec![0],
            })
        }
    };
    if let Some((i, bad)) = concepts.iter().enumerate().find(|(_, c)| c.ncols() != n_concepts) {
        return Err(ExplainError::ShapeMismatch(format!(
            "Sample {} has {} concepts, expected {}.",
            i,
            bad.ncols(),
            n_concepts
        )));
    }

    let mut offsets = Vec::with_capacity(concepts.len() + 1);
    offsets.push(0);
    for c in concepts {
        offsets.push(offsets[offsets.len() - 1] + c.nrows());
    }

    let views: Vec<ArrayView2<f64>> = concepts.iter().map(|c| c.view()).collect();
    let mut values = concatenate(Axis(0), &views)?;
    for mut column in values.columns_mut() {
        let scaled = min_max_scale(column.view());
        column.assign(&scaled);
    }

    Ok(PooledConcepts { values, offsets })
}
