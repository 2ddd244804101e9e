//! Checkpoint serialization
//!
//! A checkpoint bundles model parameters, optimizer state, and training
//! progress into one JSON document so a run restored from it continues
//! exactly where the saved run left off.

use crate::model::ModelState;
use crate::optim::OptimizerState;
use crate::train::state::TrainingState;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub model: ModelState,
    pub optimizer: OptimizerState,
    pub training: TrainingState,
}

pub fn save_checkpoint(checkpoint: &Checkpoint, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, checkpoint).map_err(|e| Error::Serialization(e.to_string()))
}

pub fn load_checkpoint(path: &Path) -> Result<Checkpoint> {
    if !path.exists() {
        return Err(Error::MissingCheckpoint(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(|e| Error::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Model, TinyConvNet};
    use crate::optim::{Adam, Optimizer};
    use crate::train::state::{EpochRecord, TrainingState};
    use tempfile::tempdir;

    fn sample_checkpoint() -> Checkpoint {
        let model = TinyConvNet::new(3, 2, 7);
        let opt = Adam::default_params(1e-3);
        let mut training = TrainingState::new();
        training.record(EpochRecord {
            epoch: 1,
            train_loss: 0.9,
            train_acc: 0.55,
            val_loss: 0.8,
            val_acc: 0.60,
        });
        Checkpoint {
            model: model.state(),
            optimizer: opt.state(),
            training,
        }
    }

    #[test]
    fn test_round_trip_preserves_every_field() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("checkpoint.json");
        let checkpoint = sample_checkpoint();

        save_checkpoint(&checkpoint, &path).unwrap();
        let restored = load_checkpoint(&path).unwrap();
        assert_eq!(restored, checkpoint);
    }

    #[test]
    fn test_missing_path_is_a_distinct_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(
            load_checkpoint(&path),
            Err(Error::MissingCheckpoint(p)) if p == path
        ));
    }

    #[test]
    fn test_corrupt_file_reports_serialization_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_checkpoint(&path),
            Err(Error::Serialization(_))
        ));
    }
}
