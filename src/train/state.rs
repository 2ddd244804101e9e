//! Progress bookkeeping carried across epochs and checkpoints

use serde::{Deserialize, Serialize};

/// Per-epoch metrics, appended to the run history in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    pub epoch: usize,
    pub train_loss: f32,
    pub train_acc: f32,
    pub val_loss: f32,
    pub val_acc: f32,
}

/// Mutable training progress
///
/// `epoch` counts completed epochs, one-based. A fresh run starts at
/// zero; a resumed run continues from the checkpointed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    pub epoch: usize,
    pub best_val_acc: f32,
    pub history: Vec<EpochRecord>,
}

impl TrainingState {
    pub fn new() -> Self {
        Self {
            epoch: 0,
            best_val_acc: 0.0,
            history: Vec::new(),
        }
    }

    /// Record a finished epoch and report whether it set a new best
    /// validation accuracy. Ties do not count as improvements.
    pub fn record(&mut self, record: EpochRecord) -> bool {
        self.epoch = record.epoch;
        let improved = record.val_acc > self.best_val_acc;
        if improved {
            self.best_val_acc = record.val_acc;
        }
        self.history.push(record);
        improved
    }
}

impl Default for TrainingState {
    fn default() -> Self {
        Self::new()
    }
}
