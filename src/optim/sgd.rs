//! Stochastic Gradient Descent optimizer

use super::{Optimizer, OptimizerState, StateSlot};
use crate::{Error, Result, Tensor};
use ndarray::Array1;

/// SGD optimizer with optional momentum
pub struct SGD {
    lr: f32,
    momentum: f32,
    step_count: u64,
    velocities: Vec<Option<Array1<f32>>>,
}

impl SGD {
    /// Create a new SGD optimizer
    pub fn new(lr: f32, momentum: f32) -> Self {
        Self {
            lr,
            momentum,
            step_count: 0,
            velocities: Vec::new(),
        }
    }

    /// Initialize velocities if needed
    fn ensure_velocities(&mut self, params: &[Tensor]) {
        if self.velocities.is_empty() {
            self.velocities = params.iter().map(|_| None).collect();
        }
    }
}

impl Optimizer for SGD {
    fn step(&mut self, params: &mut [Tensor]) {
        self.ensure_velocities(params);
        self.step_count += 1;

        for (i, param) in params.iter_mut().enumerate() {
            if let Some(grad) = param.grad() {
                if self.momentum > 0.0 {
                    // v = momentum * v - lr * grad
                    let velocity = if let Some(v) = &self.velocities[i] {
                        v * self.momentum - &grad * self.lr
                    } else {
                        &grad * (-self.lr)
                    };

                    *param.data_mut() = param.data() + &velocity;
                    self.velocities[i] = Some(velocity);
                } else {
                    // Simple SGD: param -= lr * grad
                    *param.data_mut() = param.data() - &(&grad * self.lr);
                }
            }
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn state(&self) -> OptimizerState {
        OptimizerState {
            name: "sgd".to_string(),
            lr: self.lr,
            step_count: self.step_count,
            slots: vec![StateSlot {
                name: "velocity".to_string(),
                buffers: self
                    .velocities
                    .iter()
                    .map(|v| v.as_ref().map(|a| a.to_vec()))
                    .collect(),
            }],
        }
    }

    fn load_state(&mut self, state: &OptimizerState) -> Result<()> {
        if state.name != "sgd" {
            return Err(Error::Serialization(format!(
                "optimizer state is '{}', expected 'sgd'",
                state.name
            )));
        }
        self.lr = state.lr;
        self.step_count = state.step_count;
        self.velocities = state
            .slot("velocity")
            .map(|slot| {
                slot.buffers
                    .iter()
                    .map(|b| b.as_ref().map(|v| Array1::from(v.clone())))
                    .collect()
            })
            .unwrap_or_default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sgd_step_moves_against_gradient() {
        let mut params = vec![Tensor::from_vec(vec![1.0, -1.0])];
        params[0].accumulate_grad(Array1::from(vec![0.5, -0.5]));

        let mut opt = SGD::new(0.1, 0.0);
        opt.step(&mut params);

        assert!((params[0].data()[0] - 0.95).abs() < 1e-6);
        assert!((params[0].data()[1] + 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_sgd_momentum_accumulates() {
        let mut params = vec![Tensor::from_vec(vec![0.0])];
        let mut opt = SGD::new(0.1, 0.9);

        params[0].accumulate_grad(Array1::from(vec![1.0]));
        opt.step(&mut params);
        let first = params[0].data()[0];

        opt.zero_grad(&mut params);
        params[0].accumulate_grad(Array1::from(vec![1.0]));
        opt.step(&mut params);
        let second_delta = params[0].data()[0] - first;

        // With momentum the second step is larger than the first
        assert!(second_delta.abs() > first.abs());
    }

    #[test]
    fn test_sgd_state_round_trip() {
        let mut params = vec![Tensor::from_vec(vec![1.0, 2.0])];
        let mut opt = SGD::new(0.05, 0.9);
        params[0].accumulate_grad(Array1::from(vec![0.1, 0.2]));
        opt.step(&mut params);

        let state = opt.state();
        let mut restored = SGD::new(0.0, 0.9);
        restored.load_state(&state).unwrap();

        assert_eq!(restored.state(), state);
    }

    #[test]
    fn test_sgd_rejects_foreign_state() {
        let state = OptimizerState {
            name: "adam".to_string(),
            lr: 0.1,
            step_count: 0,
            slots: vec![],
        };
        let mut opt = SGD::new(0.1, 0.0);
        assert!(opt.load_state(&state).is_err());
    }
}
