//! Training orchestration
//!
//! The trainer owns a model, an optimizer, and one bounded retention
//! pool per artifact family. Each epoch it trains, validates, appends a
//! line to the run log, periodically renders saliency and evaluation
//! plots, and checkpoints whenever validation accuracy improves. Plot
//! failures are reported and skipped; training itself never stops for
//! them.

use crate::data::DataSource;
use crate::metrics::{
    accuracy, argmax_rows, classification_report, roc_curve, softmax_rows, ConfusionMatrix,
};
use crate::model::Model;
use crate::optim::Optimizer;
use crate::probe::Probe;
use crate::retain::{artifact_file_name, Retainer};
use crate::saliency;
use crate::train::checkpoint::{load_checkpoint, save_checkpoint, Checkpoint};
use crate::train::config::TrainConfig;
use crate::train::loss::softmax_cross_entropy;
use crate::train::state::{EpochRecord, TrainingState};
use crate::{Error, Result};
use image::{Rgb, RgbImage};
use ndarray::{s, Array2, ArrayD, Ix4};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub state: TrainingState,
    pub checkpoints: Vec<PathBuf>,
    pub confusion_plots: Vec<PathBuf>,
    pub roc_plots: Vec<PathBuf>,
}

struct Validation {
    loss: f32,
    acc: f32,
    logits: Array2<f32>,
    labels: Vec<usize>,
    first_batch: Option<ArrayD<f32>>,
}

pub struct Trainer<M: Model, O: Optimizer> {
    model: M,
    optimizer: O,
    config: TrainConfig,
    state: TrainingState,
    probe: Probe,
    checkpoints: Retainer,
    confusion_plots: Retainer,
    roc_plots: Retainer,
}

impl<M: Model, O: Optimizer> Trainer<M, O> {
    pub fn new(model: M, optimizer: O, config: TrainConfig) -> Result<Self> {
        std::fs::create_dir_all(config.models_dir())?;
        std::fs::create_dir_all(config.plots_dir())?;
        let keep = config.keep_top;
        Ok(Self {
            model,
            optimizer,
            config,
            state: TrainingState::new(),
            probe: Probe::new(),
            checkpoints: Retainer::new(keep),
            confusion_plots: Retainer::new(keep),
            roc_plots: Retainer::new(keep),
        })
    }

    /// Restore a trainer from a checkpoint. Training continues at the
    /// epoch after the checkpointed one, with best accuracy and history
    /// intact.
    pub fn resume(
        mut model: M,
        mut optimizer: O,
        config: TrainConfig,
        checkpoint: &Path,
    ) -> Result<Self> {
        let saved = load_checkpoint(checkpoint)?;
        model.load_state(&saved.model)?;
        optimizer.load_state(&saved.optimizer)?;
        let mut trainer = Self::new(model, optimizer, config)?;
        trainer.state = saved.training;
        Ok(trainer)
    }

    pub fn state(&self) -> &TrainingState {
        &self.state
    }

    pub fn run(
        &mut self,
        train: &mut dyn DataSource,
        val: &mut dyn DataSource,
    ) -> Result<TrainReport> {
        while self.state.epoch < self.config.epochs {
            let epoch = self.state.epoch + 1;

            let (train_loss, train_acc) = self.train_epoch(train)?;
            let validation = self.validate(val)?;

            let record = EpochRecord {
                epoch,
                train_loss,
                train_acc,
                val_loss: validation.loss,
                val_acc: validation.acc,
            };
            let improved = self.state.record(record);
            self.log_epoch(epoch, train_loss, train_acc, &validation)?;

            let curves = self.config.plots_dir().join("training_plot.png");
            if let Err(e) = crate::plot::save_training_curves(&self.state.history, &curves) {
                eprintln!("warning: skipping training curves at epoch {epoch}: {e}");
            }

            if epoch % self.config.visualize_every == 0 {
                if let Err(e) = self.visualize(epoch, &validation) {
                    eprintln!("warning: skipping epoch {epoch} plots: {e}");
                }
            }

            if improved {
                self.save_best(epoch, validation.acc)?;
            }
        }

        Ok(TrainReport {
            state: self.state.clone(),
            checkpoints: self.retained_paths(&self.checkpoints),
            confusion_plots: self.retained_paths(&self.confusion_plots),
            roc_plots: self.retained_paths(&self.roc_plots),
        })
    }

    fn retained_paths(&self, retainer: &Retainer) -> Vec<PathBuf> {
        retainer.entries().iter().map(|a| a.path.clone()).collect()
    }

    fn train_epoch(&mut self, data: &mut dyn DataSource) -> Result<(f32, f32)> {
        let mut loss_sum = 0.0;
        let mut acc_sum = 0.0;
        let mut total = 0usize;

        for batch in data.batches() {
            self.optimizer.zero_grad(self.model.params_mut());
            let logits = self.model.forward(&batch.images)?;
            let (loss, grad) = softmax_cross_entropy(&logits, &batch.labels);
            self.model.backward(&grad)?;
            self.optimizer.step(self.model.params_mut());

            let n = batch.len();
            loss_sum += loss * n as f32;
            acc_sum += accuracy(&logits, &batch.labels) * n as f32;
            total += n;
        }

        if total == 0 {
            return Ok((0.0, 0.0));
        }
        Ok((loss_sum / total as f32, acc_sum / total as f32))
    }

    fn validate(&mut self, data: &mut dyn DataSource) -> Result<Validation> {
        let classes = self.model.num_classes();
        let mut loss_sum = 0.0;
        let mut rows: Vec<f32> = Vec::new();
        let mut labels: Vec<usize> = Vec::new();
        let mut first_batch = None;

        for batch in data.batches() {
            let logits = self.model.forward(&batch.images)?;
            let (loss, _) = softmax_cross_entropy(&logits, &batch.labels);
            loss_sum += loss * batch.len() as f32;
            rows.extend(logits.iter());
            labels.extend_from_slice(&batch.labels);
            if first_batch.is_none() {
                first_batch = Some(batch.images.clone());
            }
        }

        let total = labels.len();
        let logits = Array2::from_shape_vec((total, classes), rows)
            .map_err(|_| Error::ShapeMismatch {
                expected: vec![total, classes],
                got: vec![],
            })?;
        let acc = if total == 0 {
            0.0
        } else {
            accuracy(&logits, &labels)
        };
        Ok(Validation {
            loss: if total == 0 {
                0.0
            } else {
                loss_sum / total as f32
            },
            acc,
            logits,
            labels,
            first_batch,
        })
    }

    fn log_epoch(
        &self,
        epoch: usize,
        train_loss: f32,
        train_acc: f32,
        validation: &Validation,
    ) -> Result<()> {
        let line = format!(
            "Epoch {epoch}/{}, Train Loss: {train_loss:.4}, Train Acc: {train_acc:.4}, Val Loss: {:.4}, Val Acc: {:.4}",
            self.config.epochs, validation.loss, validation.acc
        );
        if !self.config.quiet {
            println!("{line}");
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.config.log_path())?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn save_best(&mut self, epoch: usize, val_acc: f32) -> Result<()> {
        let checkpoint = Checkpoint {
            model: self.model.state(),
            optimizer: self.optimizer.state(),
            training: self.state.clone(),
        };
        let path = self
            .config
            .models_dir()
            .join(artifact_file_name("checkpoint", epoch, val_acc, "json"));
        save_checkpoint(&checkpoint, &path)?;
        self.checkpoints.offer(val_acc, path)?;
        Ok(())
    }

    fn visualize(&mut self, epoch: usize, validation: &Validation) -> Result<()> {
        self.render_saliency(epoch, validation)?;
        self.render_confusion(epoch, validation)?;
        self.render_roc(epoch, validation)?;
        Ok(())
    }

    fn render_saliency(&mut self, epoch: usize, validation: &Validation) -> Result<()> {
        let batch = match &validation.first_batch {
            Some(images) => images,
            None => return Ok(()),
        };
        let images = batch
            .view()
            .into_dimensionality::<Ix4>()
            .map_err(|_| Error::UnsupportedActivationRank { rank: batch.ndim() })?;
        let (batch_len, _, height, width) = images.dim();
        let predictions = argmax_rows(&validation.logits);

        for sample in 0..self.config.saliency_samples.min(batch_len) {
            let input = images
                .slice(s![sample..sample + 1, .., .., ..])
                .to_owned()
                .into_dyn();
            let class = predictions.get(sample).copied().unwrap_or(0);

            let handle = self.probe.attach(&self.model, &self.config.saliency_layer)?;
            let pair = handle.capture(&mut self.model, &input, class)?;
            let heatmap = saliency::compute(&pair)?;
            if heatmap.is_degenerate() {
                eprintln!("warning: degenerate heatmap for sample {sample} at epoch {epoch}");
            }

            let mut base = RgbImage::new(width as u32, height as u32);
            for y in 0..height {
                for x in 0..width {
                    let v = (images[[sample, 0, y, x]].clamp(0.0, 1.0) * 255.0) as u8;
                    base.put_pixel(x as u32, y as u32, Rgb([v, v, v]));
                }
            }
            let blended = saliency::overlay(&base, &heatmap, 0.4);
            let path = self
                .config
                .plots_dir()
                .join(format!("gradcam_epoch_{epoch}_sample_{sample}.png"));
            blended.save(path)?;
        }
        Ok(())
    }

    fn render_confusion(&mut self, epoch: usize, validation: &Validation) -> Result<()> {
        let cm = ConfusionMatrix::from_predictions(
            &argmax_rows(&validation.logits),
            &validation.labels,
            self.model.num_classes(),
        );
        if !self.config.quiet {
            println!("Classification Report:");
            print!("{}", classification_report(&cm));
        }
        let path = self
            .config
            .plots_dir()
            .join(artifact_file_name("confusion", epoch, validation.acc, "png"));
        crate::plot::save_confusion_matrix(&cm, &path)?;
        self.confusion_plots.offer(validation.acc, path)?;
        Ok(())
    }

    /// ROC for the binary "any disease" split: positive means any class
    /// above zero, scored by one minus the healthy-class probability.
    /// Like every artifact family, retention is ranked by validation
    /// accuracy at save time. A single-class validation set is skipped.
    fn render_roc(&mut self, epoch: usize, validation: &Validation) -> Result<()> {
        let labels: Vec<bool> = validation.labels.iter().map(|&l| l > 0).collect();
        let probs = softmax_rows(&validation.logits);
        let scores: Vec<f32> = probs.column(0).iter().map(|&p| 1.0 - p).collect();

        let roc = match roc_curve(&labels, &scores) {
            Ok(roc) => roc,
            Err(Error::InsufficientClassDiversity) => {
                eprintln!("warning: single-class validation set at epoch {epoch}, skipping ROC");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let path = self
            .config
            .plots_dir()
            .join(artifact_file_name("roc", epoch, validation.acc, "png"));
        crate::plot::save_roc_curve(&roc, &path)?;
        self.roc_plots.offer(validation.acc, path)?;
        Ok(())
    }
}
