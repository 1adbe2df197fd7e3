// src/algorithms/optimizer.rs
use crate::core::{ExplainError, Result};
use ndarray::{Array, Dimension, Zip};

/// Adam optimiser over a single dense parameter tensor.
#[derive(Debug, Clone)]
pub struct Adam<D: Dimension> {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    m: Array<f64, D>,
    v: Array<f64, D>,
    t: i32,
}

impl<D: Dimension> Adam<D> {
    pub fn new(learning_rate: f64, shape: D) -> Self {
        Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            m: Array::zeros(shape.clone()),
            v: Array::zeros(shape),
            t: 0,
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn steps(&self) -> i32 {
        self.t
    }

    pub fn step(&mut self, params: &mut Array<f64, D>, grads: &Array<f64, D>) -> Result<()> {
        if params.shape() != self.m.shape() || grads.shape() != self.m.shape() {
            return Err(ExplainError::ShapeMismatch(format!(
                "Adam state has shape {:?}, got params {:?} and grads {:?}.",
                self.m.shape(),
                params.shape(),
                grads.shape()
            )));
        }
        self.t += 1;
        let (beta1, beta2, eps, lr) = (self.beta1, self.beta2, self.epsilon, self.learning_rate);
        let bias1 = 1.0 - beta1.powi(self.t);
        let bias2 = 1.0 - beta2.powi(self.t);

        Zip::from(params)
            .and(grads)
            .and(&mut self.m)
            .and(&mut self.v)
            .for_each(|p, &g, m, v| {
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;
                let m_hat = *m / bias1;
                let v_hat = *v / bias2;
                *p -= lr * m_hat / (v_hat.sqrt() + eps);
            });
        Ok(())
    }
}
