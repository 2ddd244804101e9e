//! Adam optimizer

use super::{Optimizer, OptimizerState, StateSlot};
use crate::{Error, Result, Tensor};
use ndarray::Array1;

/// Adam optimizer (Adaptive Moment Estimation)
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    t: u64,
    m: Vec<Option<Array1<f32>>>, // First moment
    v: Vec<Option<Array1<f32>>>, // Second moment
}

impl Adam {
    /// Create a new Adam optimizer
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            lr,
            beta1,
            beta2,
            epsilon,
            t: 0,
            m: Vec::new(),
            v: Vec::new(),
        }
    }

    /// Create Adam with default parameters
    pub fn default_params(lr: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8)
    }

    /// Initialize moments if needed
    fn ensure_moments(&mut self, params: &[Tensor]) {
        if self.m.is_empty() {
            self.m = params.iter().map(|_| None).collect();
            self.v = params.iter().map(|_| None).collect();
        }
    }

    fn slot_to_buffers(slot: Option<&StateSlot>) -> Vec<Option<Array1<f32>>> {
        slot.map(|s| {
            s.buffers
                .iter()
                .map(|b| b.as_ref().map(|v| Array1::from(v.clone())))
                .collect()
        })
        .unwrap_or_default()
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [Tensor]) {
        self.ensure_moments(params);
        self.t += 1;

        // Bias correction factors
        let lr_t = self.lr
            * ((1.0 - self.beta2.powi(self.t as i32)).sqrt()
                / (1.0 - self.beta1.powi(self.t as i32)));

        for (i, param) in params.iter_mut().enumerate() {
            if let Some(grad) = param.grad() {
                // m_t = β1 * m_{t-1} + (1 - β1) * g
                let m_t = if let Some(m) = &self.m[i] {
                    m * self.beta1 + &grad * (1.0 - self.beta1)
                } else {
                    &grad * (1.0 - self.beta1)
                };

                // v_t = β2 * v_{t-1} + (1 - β2) * g²
                let grad_sq = &grad * &grad;
                let v_t = if let Some(v) = &self.v[i] {
                    v * self.beta2 + &grad_sq * (1.0 - self.beta2)
                } else {
                    &grad_sq * (1.0 - self.beta2)
                };

                // θ_t = θ_{t-1} - lr_t * m_t / (√v_t + ε)
                let update = &m_t / &(v_t.mapv(f32::sqrt) + self.epsilon) * lr_t;
                *param.data_mut() = param.data() - &update;

                self.m[i] = Some(m_t);
                self.v[i] = Some(v_t);
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
        let buffers = |slot: &[Option<Array1<f32>>]| {
            slot.iter()
                .map(|b| b.as_ref().map(|a| a.to_vec()))
                .collect()
        };
        OptimizerState {
            name: "adam".to_string(),
            lr: self.lr,
            step_count: self.t,
            slots: vec![
                StateSlot {
                    name: "m".to_string(),
                    buffers: buffers(&self.m),
                },
                StateSlot {
                    name: "v".to_string(),
                    buffers: buffers(&self.v),
                },
            ],
        }
    }

    fn load_state(&mut self, state: &OptimizerState) -> Result<()> {
        if state.name != "adam" {
            return Err(Error::Serialization(format!(
                "optimizer state is '{}', expected 'adam'",
                state.name
            )));
        }
        self.lr = state.lr;
        self.t = state.step_count;
        self.m = Self::slot_to_buffers(state.slot("m"));
        self.v = Self::slot_to_buffers(state.slot("v"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adam_quadratic_convergence() {
        // f(x) = x², gradient 2x; Adam should converge toward zero
        let mut params = vec![Tensor::from_vec(vec![5.0, -3.0, 2.0])];
        let mut opt = Adam::default_params(0.1);

        for _ in 0..200 {
            opt.zero_grad(&mut params);
            let grad = params[0].data() * 2.0;
            params[0].accumulate_grad(grad);
            opt.step(&mut params);
        }

        for &x in params[0].data() {
            assert!(x.abs() < 0.1, "did not converge: {x}");
        }
    }

    #[test]
    fn test_adam_state_round_trip() {
        let mut params = vec![Tensor::from_vec(vec![1.0, 2.0, 3.0])];
        let mut opt = Adam::default_params(0.01);

        for _ in 0..3 {
            opt.zero_grad(&mut params);
            params[0].accumulate_grad(Array1::from(vec![0.1, 0.2, 0.3]));
            opt.step(&mut params);
        }

        let state = opt.state();
        assert_eq!(state.step_count, 3);

        let mut restored = Adam::default_params(0.5);
        restored.load_state(&state).unwrap();
        assert_eq!(restored.state(), state);
    }

    #[test]
    fn test_restored_adam_continues_identically() {
        let grads = [
            vec![0.3, -0.1],
            vec![0.2, 0.4],
            vec![-0.5, 0.1],
            vec![0.05, -0.2],
        ];

        let run = |resume_at: Option<usize>| {
            let mut params = vec![Tensor::from_vec(vec![1.0, -1.0])];
            let mut opt = Adam::default_params(0.05);
            let mut saved = None;
            for (i, g) in grads.iter().enumerate() {
                if Some(i) == resume_at {
                    saved = Some((opt.state(), params[0].data().to_vec()));
                }
                opt.zero_grad(&mut params);
                params[0].accumulate_grad(Array1::from(g.clone()));
                opt.step(&mut params);
            }
            (params[0].data().to_vec(), saved)
        };

        let (straight, saved) = run(Some(2));
        let (state, data) = saved.unwrap();

        // Replay the tail from the snapshot
        let mut params = vec![Tensor::from_vec(data)];
        let mut opt = Adam::default_params(0.0);
        opt.load_state(&state).unwrap();
        for g in &grads[2..] {
            opt.zero_grad(&mut params);
            params[0].accumulate_grad(Array1::from(g.clone()));
            opt.step(&mut params);
        }

        for (a, b) in straight.iter().zip(params[0].data().iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
