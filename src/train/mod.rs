//! Training loop, checkpointing, and run configuration

mod checkpoint;
mod config;
mod loss;
mod state;
mod trainer;

pub use checkpoint::{load_checkpoint, save_checkpoint, Checkpoint};
pub use config::TrainConfig;
pub use loss::softmax_cross_entropy;
pub use state::{EpochRecord, TrainingState};
pub use trainer::{TrainReport, Trainer};
