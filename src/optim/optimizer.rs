//! Optimizer trait

use crate::{Result, Tensor};
use serde::{Deserialize, Serialize};

/// Trait for optimization algorithms
///
/// Optimizers update a flat list of parameter tensors in place and expose
/// their internal buffers as a serializable [`OptimizerState`] so that a
/// checkpoint restores the update rule exactly where it left off.
pub trait Optimizer {
    /// Perform a single optimization step
    fn step(&mut self, params: &mut [Tensor]);

    /// Zero out all gradients
    fn zero_grad(&mut self, params: &mut [Tensor]) {
        for param in params {
            param.zero_grad();
        }
    }

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);

    /// Snapshot internal state for checkpointing
    fn state(&self) -> OptimizerState;

    /// Restore internal state from a checkpoint
    fn load_state(&mut self, state: &OptimizerState) -> Result<()>;
}

/// Named group of per-parameter buffers (velocities, moments)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSlot {
    /// Slot name ("velocity", "m", "v")
    pub name: String,

    /// One buffer per parameter tensor; `None` when not yet initialized
    pub buffers: Vec<Option<Vec<f32>>>,
}

/// Serializable optimizer state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerState {
    /// Optimizer name ("sgd" or "adam")
    pub name: String,

    /// Learning rate at snapshot time
    pub lr: f32,

    /// Number of steps taken
    pub step_count: u64,

    /// Buffer slots
    pub slots: Vec<StateSlot>,
}

impl Optimizer for Box<dyn Optimizer> {
    fn step(&mut self, params: &mut [Tensor]) {
        (**self).step(params);
    }

    fn zero_grad(&mut self, params: &mut [Tensor]) {
        (**self).zero_grad(params);
    }

    fn lr(&self) -> f32 {
        (**self).lr()
    }

    fn set_lr(&mut self, lr: f32) {
        (**self).set_lr(lr)
    }

    fn state(&self) -> OptimizerState {
        (**self).state()
    }

    fn load_state(&mut self, state: &OptimizerState) -> Result<()> {
        (**self).load_state(state)
    }
}

impl OptimizerState {
    /// Look up a slot by name
    pub fn slot(&self, name: &str) -> Option<&StateSlot> {
        self.slots.iter().find(|s| s.name == name)
    }
}
