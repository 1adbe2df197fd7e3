// src/utils.rs
//! Small numeric helpers shared by the explainer and the metric pipeline.

use ndarray::{Array1, ArrayView1};

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Numerically stable softmax.
pub fn softmax(logits: ArrayView1<f64>) -> Array1<f64> {
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exp = logits.mapv(|v| (v - max).exp());
    let total = exp.sum();
    exp / total
}

/// Index of the largest entry; the first one wins on ties.
pub fn argmax(values: ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Linearly rescales `values` so the minimum maps to 0 and the maximum to 1.
/// A constant input maps to all zeros.
pub fn min_max_scale(values: ArrayView1<f64>) -> Array1<f64> {
    let (lo, hi) = min_max(values);
    let range = hi - lo;
    if range == 0.0 || !range.is_finite() {
        return values.mapv(|v| v - lo);
    }
    values.mapv(|v| (v - lo) / range)
}

/// `(min, max)` of a non-empty view; `(0, 0)` when empty.
pub fn min_max(values: ArrayView1<f64>) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}
