//! Optimizers for training

mod adam;
mod optimizer;
mod sgd;

pub use adam::Adam;
pub use optimizer::{Optimizer, OptimizerState, StateSlot};
pub use sgd::SGD;
