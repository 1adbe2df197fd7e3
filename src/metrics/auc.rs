// src/metrics/auc.rs
use crate::core::{ExplainError, Result};
use crate::metrics::distance::DistanceTable;
use ndarray::{Array2, ArrayView1, ArrayView2};
use std::fmt;

/// Trapezoidal area under `y(x)`. `x` must hold at least two strictly increasing values.
pub fn trapezoid_auc(x: &[f64], y: ArrayView1<f64>) -> Result<f64> {
    if x.len() != y.len() {
        return Err(ExplainError::ShapeMismatch(format!(
            "{} x values but {} y values.",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(ExplainError::InvalidDomain(format!(
            "At least 2 points are needed to compute an area under curve, got {}.",
            x.len()
        )));
    }
    if x.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(ExplainError::InvalidDomain(format!(
            "x values must be strictly increasing: {:?}",
            x
        )));
    }
    let area = x
        .windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum::<f64>();
    Ok(area)
}

/// One AUC per (class pair, concept). Final metric output.
#[derive(Debug, Clone)]
pub struct ScoreTable {
    class_pairs: Vec<(usize, usize)>,
    values: Array2<f64>,
}

impl ScoreTable {
    pub fn class_pairs(&self) -> &[(usize, usize)] {
        &self.class_pairs
    }

    pub fn n_concepts(&self) -> usize {
        self.values.ncols()
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn get(&self, pair_index: usize, concept: usize) -> Option<f64> {
        self.values.get((pair_index, concept)).copied()
    }

    /// Score for an unordered class pair, in either order.
    pub fn get_pair(&self, a: usize, b: usize, concept: usize) -> Option<f64> {
        let key = (a.min(b), a.max(b));
        let index = self.class_pairs.iter().position(|&p| p == key)?;
        self.get(index, concept)
    }
}

impl fmt::Display for ScoreTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Concept AUC scores:")?;
        for (pair_index, (a, b)) in self.class_pairs.iter().enumerate() {
            write!(f, "  Classes ({}, {}):", a, b)?;
            for concept in 0..self.n_concepts() {
                write!(f, " {:.4}", self.values[[pair_index, concept]])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Integrates each distance-vs-k curve into a single score.
#[derive(Debug, Clone, Default)]
pub struct AucScorer;

impl AucScorer {
    pub fn score(&self, distances: &DistanceTable, keep_numbers: &[usize]) -> Result<ScoreTable> {
        if keep_numbers != distances.keep_numbers() {
            return Err(ExplainError::ShapeMismatch(format!(
                "Keep numbers {:?} do not match the distance table's {:?}.",
                keep_numbers,
                distances.keep_numbers()
            )));
        }
        let x: Vec<f64> = keep_numbers.iter().map(|&k| k as f64).collect();
        let n_pairs = distances.class_pairs().len();
        let mut values = Array2::zeros((n_pairs, distances.n_concepts()));
        for pair_index in 0..n_pairs {
            for concept in 0..distances.n_concepts() {
                values[[pair_index, concept]] = trapezoid_auc(&x, distances.curve(pair_index, concept))?;
            }
        }
        Ok(ScoreTable {
            class_pairs: distances.class_pairs().to_vec(),
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::{array, Array3};

    #[test]
    fn trapezoid_uses_x_values_not_indices() -> Result<()> {
        let auc = trapezoid_auc(&[5.0, 10.0, 20.0], array![1.0, 3.0, 3.0].view())?;
        assert_abs_diff_eq!(auc, 5.0 * 2.0 + 10.0 * 3.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn non_increasing_x_is_invalid_domain() {
        for x in [vec![5.0, 5.0], vec![10.0, 5.0], vec![5.0]] {
            let y = ndarray::Array1::zeros(x.len());
            assert!(matches!(trapezoid_auc(&x, y.view()), Err(ExplainError::InvalidDomain(_))));
        }
    }

    fn table(scale: f64) -> Result<DistanceTable> {
        let values = Array3::from_shape_fn((3, 2, 2), |(k, p, c)| scale * (0.1 * k as f64 + p as f64 + 0.5 * c as f64));
        DistanceTable::from_parts(vec![5, 10, 15], vec![(0, 1), (1, 2)], values)
    }

    #[test]
    fn scores_scale_linearly_with_distances() -> Result<()> {
        let base = AucScorer.score(&table(1.0)?, &[5, 10, 15])?;
        let scaled = AucScorer.score(&table(3.5)?, &[5, 10, 15])?;
        for (b, s) in base.values().iter().zip(scaled.values().iter()) {
            assert_relative_eq!(*s, 3.5 * b, max_relative = 1e-12);
        }
        // pair 0, concept 0: y = 0, 0.1, 0.2
        assert_abs_diff_eq!(base.get(0, 0).unwrap(), 5.0 * 0.05 + 5.0 * 0.15, epsilon = 1e-12);
        assert_eq!(base.get_pair(2, 1, 1), base.get(1, 1));
        Ok(())
    }

    #[test]
    fn rejects_mismatched_keep_numbers() -> Result<()> {
        let err = AucScorer.score(&table(1.0)?, &[5, 10]).unwrap_err();
        assert!(matches!(err, ExplainError::ShapeMismatch(_)));
        Ok(())
    }

    #[test]
    fn display_lists_every_pair() -> Result<()> {
        let text = AucScorer.score(&table(1.0)?, &[5, 10, 15])?.to_string();
        assert!(text.contains("Classes (0, 1):"));
        assert!(text.contains("Classes (1, 2):"));
        Ok(())
    }
}
