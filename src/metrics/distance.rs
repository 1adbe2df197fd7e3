// src/metrics/distance.rs
use crate::core::{ExplainError, Result};
use crate::metrics::histogram::{Histogram, HistogramTable};
use ndarray::{Array3, ArrayView1, ArrayView3, s};

/// All unordered pairs `(a, b)` with `a < b` over the sorted, de-duplicated
/// class set, in combinatorial order: `[0, 1, 2]` gives `(0,1), (0,2), (1,2)`.
pub fn class_pairs(classes: &[usize]) -> Vec<(usize, usize)> {
    let mut sorted = classes.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    let mut pairs = Vec::with_capacity(sorted.len() * sorted.len().saturating_sub(1) / 2);
    for (i, &a) in sorted.iter().enumerate() {
        for &b in &sorted[i + 1..] {
            pairs.push((a, b));
        }
    }
    pairs
}

/// First Wasserstein distance between two weighted 1-D distributions:
/// the integral of `|F_u(x) - F_v(x)|` over the merged support.
pub fn wasserstein_1d(
    u_values: ArrayView1<f64>,
    u_weights: ArrayView1<f64>,
    v_values: ArrayView1<f64>,
    v_weights: ArrayView1<f64>,
) -> Result<f64> {
    let u = weighted_sorted(u_values, u_weights)?;
    let v = weighted_sorted(v_values, v_weights)?;

    let mut support: Vec<f64> = u.iter().chain(v.iter()).map(|&(x, _)| x).collect();
    support.sort_by(f64::total_cmp);

    let (mut iu, mut iv) = (0, 0);
    let (mut cdf_u, mut cdf_v) = (0.0, 0.0);
    let mut distance = 0.0;
    for window in support.windows(2) {
        let x = window[0];
        while iu < u.len() && u[iu].0 <= x {
            cdf_u += u[iu].1;
            iu += 1;
        }
        while iv < v.len() && v[iv].0 <= x {
            cdf_v += v[iv].1;
            iv += 1;
        }
        distance += (cdf_u - cdf_v).abs() * (window[1] - x);
    }
    Ok(distance)
}

/// `(value, normalised weight)` pairs sorted by value.
fn weighted_sorted(values: ArrayView1<f64>, weights: ArrayView1<f64>) -> Result<Vec<(f64, f64)>> {
    if values.len() != weights.len() {
        return Err(ExplainError::ShapeMismatch(format!(
            "{} values but {} weights.",
            values.len(),
            weights.len()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ExplainError::InvalidInput("Distribution values must be finite.".to_string()));
    }
    if weights.iter().any(|w| !(*w >= 0.0 && w.is_finite())) {
        return Err(ExplainError::InvalidInput(
            "Distribution weights must be finite and non-negative.".to_string(),
        ));
    }
    let total = weights.sum();
    if total <= 0.0 {
        return Err(ExplainError::InvalidInput(
            "Distribution weights sum to zero.".to_string(),
        ));
    }
    let mut pairs: Vec<(f64, f64)> = values
        .iter()
        .zip(weights.iter())
        .map(|(&x, &w)| (x, w / total))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(pairs)
}

impl Histogram {
    /// Wasserstein distance between the two histograms, with each bin's mass at its centre.
    pub fn wasserstein(&self, other: &Histogram) -> Result<f64> {
        let (u_values, u_weights) = (self.bin_centers(), self.bin_masses());
        let (v_values, v_weights) = (other.bin_centers(), other.bin_masses());
        wasserstein_1d(u_values.view(), u_weights.view(), v_values.view(), v_weights.view())
    }
}

/// Pairwise class distances indexed by (truncation index, class-pair index, concept).
#[derive(Debug, Clone)]
pub struct DistanceTable {
    keep_numbers: Vec<usize>,
    class_pairs: Vec<(usize, usize)>,
    values: Array3<f64>,
}

impl DistanceTable {
    pub fn from_parts(
        keep_numbers: Vec<usize>,
        class_pairs: Vec<(usize, usize)>,
        values: Array3<f64>,
    ) -> Result<Self> {
        let expected = (keep_numbers.len(), class_pairs.len(), values.dim().2);
        if values.dim() != expected {
            return Err(ExplainError::ShapeMismatch(format!(
                "Distance values have shape {:?}, expected {:?}.",
                values.dim(),
                expected
            )));
        }
        Ok(DistanceTable {
            keep_numbers,
            class_pairs,
            values,
        })
    }

    pub fn keep_numbers(&self) -> &[usize] {
        &self.keep_numbers
    }

    pub fn class_pairs(&self) -> &[(usize, usize)] {
        &self.class_pairs
    }

    pub fn n_concepts(&self) -> usize {
        self.values.dim().2
    }

    pub fn values(&self) -> ArrayView3<'_, f64> {
        self.values.view()
    }

    pub fn get(&self, k_index: usize, pair_index: usize, concept: usize) -> Option<f64> {
        self.values.get((k_index, pair_index, concept)).copied()
    }

    /// Distances across all truncation sizes for one (class pair, concept).
    pub fn curve(&self, pair_index: usize, concept: usize) -> ArrayView1<'_, f64> {
        self.values.slice(s![.., pair_index, concept])
    }
}

/// Computes histogram distances for every truncation size, class pair and concept.
#[derive(Debug, Clone, Default)]
pub struct DistanceAggregator;

impl DistanceAggregator {
    pub fn aggregate(
        &self,
        histograms: &HistogramTable,
        keep_numbers: &[usize],
        class_pairs: &[(usize, usize)],
        n_concepts: usize,
    ) -> Result<DistanceTable> {
        let mut values = Array3::zeros((keep_numbers.len(), class_pairs.len(), n_concepts));
        for (k_index, &k) in keep_numbers.iter().enumerate() {
            for (pair_index, &(tx, ty)) in class_pairs.iter().enumerate() {
                for concept in 0..n_concepts {
                    let hx = lookup(histograms, k, tx, concept)?;
                    let hy = lookup(histograms, k, ty, concept)?;
                    values[[k_index, pair_index, concept]] = hx.wasserstein(hy)?;
                }
            }
        }
        DistanceTable::from_parts(keep_numbers.to_vec(), class_pairs.to_vec(), values)
    }
}

fn lookup(table: &HistogramTable, k: usize, class: usize, concept: usize) -> Result<&Histogram> {
    table.get(k, class, concept).ok_or_else(|| {
        ExplainError::InvalidDomain(format!(
            "No histogram for k = {}, class {}, concept {}.",
            k, class, concept
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::histogram::HistogramBuilder;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1, Array2};

    #[test]
    fn class_pairs_follow_combinatorial_order() {
        assert_eq!(class_pairs(&[2, 0, 1]), vec![(0, 1), (0, 2), (1, 2)]);
        assert_eq!(class_pairs(&[3, 1, 3]), vec![(1, 3)]);
        assert!(class_pairs(&[4]).is_empty());
    }

    #[test]
    fn wasserstein_of_point_masses_is_their_gap() -> Result<()> {
        let d = wasserstein_1d(array![1.0].view(), array![1.0].view(), array![4.0].view(), array![2.0].view())?;
        assert_abs_diff_eq!(d, 3.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn wasserstein_matches_sample_based_values() -> Result<()> {
        // equal-weight samples: mean absolute gap between sorted samples
        let u = array![0.0, 1.0, 3.0];
        let v = array![5.0, 6.0, 8.0];
        let w = Array1::ones(3);
        let d = wasserstein_1d(u.view(), w.view(), v.view(), w.view())?;
        assert_abs_diff_eq!(d, 5.0, epsilon = 1e-12);

        let d = wasserstein_1d(array![0.0, 1.0].view(), array![3.0, 1.0].view(), array![0.0, 1.0].view(), array![1.0, 1.0].view())?;
        assert_abs_diff_eq!(d, 0.25, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn wasserstein_rejects_bad_weights() {
        let err = wasserstein_1d(array![0.0].view(), array![0.0].view(), array![1.0].view(), array![1.0].view())
            .unwrap_err();
        assert!(matches!(err, ExplainError::InvalidInput(_)));
        let err = wasserstein_1d(array![0.0, 1.0].view(), array![1.0].view(), array![1.0].view(), array![1.0].view())
            .unwrap_err();
        assert!(matches!(err, ExplainError::ShapeMismatch(_)));
    }

    #[test]
    fn histogram_distance_handles_degenerate_bins() -> Result<()> {
        let point = Histogram::degenerate(0.2);
        let spread = Histogram::try_new(array![0.0, 1.0].view(), 2)?;
        // masses 0.5 at 0.25 and 0.5 at 0.75
        assert_abs_diff_eq!(point.wasserstein(&spread)?, 0.5 * 0.05 + 0.5 * 0.55, epsilon = 1e-12);
        assert_eq!(point.wasserstein(&point)?, 0.0);
        Ok(())
    }

    fn three_class_table() -> Result<HistogramTable> {
        let importances: Vec<Array1<f64>> = (0..6).map(|s| Array1::linspace(0.0, 1.0, 8 + s)).collect();
        let concepts: Vec<Array2<f64>> = (0..6)
            .map(|s| Array2::from_shape_fn((8 + s, 2), |(i, c)| (s / 2) as f64 + 0.1 * i as f64 + c as f64))
            .collect();
        let views: Vec<_> = concepts.iter().map(|c| c.view()).collect();
        HistogramBuilder::new(10)?.build(&importances, &views, &[0, 0, 1, 1, 2, 2], &[3, 6], &[0, 1, 2])
    }

    #[test]
    fn distances_are_symmetric_and_zero_on_the_diagonal() -> Result<()> {
        let table = three_class_table()?;
        let aggregator = DistanceAggregator;
        let forward = aggregator.aggregate(&table, &[3, 6], &[(0, 1), (0, 2), (1, 2)], 2)?;
        let swapped = aggregator.aggregate(&table, &[3, 6], &[(1, 0), (2, 0), (2, 1)], 2)?;
        let diagonal = aggregator.aggregate(&table, &[3, 6], &[(0, 0), (1, 1), (2, 2)], 2)?;

        assert_eq!(forward.values(), swapped.values());
        assert!(diagonal.values().iter().all(|&d| d == 0.0));
        assert!(forward.values().iter().all(|&d| d > 0.0));
        // classes are shifted by one unit each
        assert!(forward.get(0, 1, 0).unwrap() > forward.get(0, 0, 0).unwrap());
        assert_eq!(forward.curve(2, 1).len(), 2);
        Ok(())
    }

    #[test]
    fn missing_histogram_is_invalid_domain() -> Result<()> {
        let table = three_class_table()?;
        let err = DistanceAggregator.aggregate(&table, &[4], &[(0, 1)], 2).unwrap_err();
        assert!(matches!(err, ExplainError::InvalidDomain(_)));
        Ok(())
    }
}
