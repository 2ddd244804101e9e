//! Configuration validation

use super::schema::RunSpec;

/// Validation error type
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid learning rate: {0} (must be > 0.0)")]
    InvalidLearningRate(f32),

    #[error("Invalid batch size: {0} (must be > 0)")]
    InvalidBatchSize(usize),

    #[error("Invalid epochs: {0} (must be > 0)")]
    InvalidEpochs(usize),

    #[error("Invalid image size: {0} (must be > 0)")]
    InvalidImageSize(usize),

    #[error("Invalid class count: {0} (must be >= 2)")]
    InvalidClassCount(usize),

    #[error("Invalid filter count: {0} (must be > 0)")]
    InvalidFilterCount(usize),

    #[error("Invalid plot cadence: {0} (must be > 0)")]
    InvalidVisualizeEvery(usize),

    #[error("Invalid optimizer: {0} (must be one of: adam, sgd)")]
    InvalidOptimizer(String),
}

/// Validate a run specification
///
/// Checks numeric ranges and the optimizer name. Paths are not checked;
/// the output directory is created at run time.
pub fn validate_config(spec: &RunSpec) -> Result<(), ValidationError> {
    if spec.optimizer.lr <= 0.0 {
        return Err(ValidationError::InvalidLearningRate(spec.optimizer.lr));
    }
    if spec.data.batch_size == 0 {
        return Err(ValidationError::InvalidBatchSize(spec.data.batch_size));
    }
    if spec.data.image_size == 0 {
        return Err(ValidationError::InvalidImageSize(spec.data.image_size));
    }
    if spec.training.epochs == 0 {
        return Err(ValidationError::InvalidEpochs(spec.training.epochs));
    }
    if spec.training.visualize_every == 0 {
        return Err(ValidationError::InvalidVisualizeEvery(
            spec.training.visualize_every,
        ));
    }
    if spec.model.classes < 2 {
        return Err(ValidationError::InvalidClassCount(spec.model.classes));
    }
    if spec.model.filters == 0 {
        return Err(ValidationError::InvalidFilterCount(spec.model.filters));
    }
    match spec.optimizer.name.as_str() {
        "adam" | "sgd" => Ok(()),
        other => Err(ValidationError::InvalidOptimizer(other.to_string())),
    }
}
