//! Classification metrics
//!
//! Accuracy over logit rows, a multi-class confusion matrix, and a binary
//! ROC curve with trapezoidal AUC. ROC computation requires both classes
//! to be present; a single-class batch is reported as
//! [`Error::InsufficientClassDiversity`] so the caller can skip the plot
//! and keep training.

use crate::{Error, Result};
use ndarray::Array2;

/// Row-wise softmax over logits
pub fn softmax_rows(logits: &Array2<f32>) -> Array2<f32> {
    let mut probs = logits.clone();
    for mut row in probs.rows_mut() {
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        if sum > 0.0 {
            row.mapv_inplace(|v| v / sum);
        }
    }
    probs
}

/// Predicted class per logit row
pub fn argmax_rows(logits: &Array2<f32>) -> Vec<usize> {
    logits
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(i, _)| i)
                .unwrap_or(0)
        })
        .collect()
}

/// Fraction of rows whose argmax matches the label
pub fn accuracy(logits: &Array2<f32>, labels: &[usize]) -> f32 {
    if labels.is_empty() {
        return 0.0;
    }
    let correct = argmax_rows(logits)
        .iter()
        .zip(labels)
        .filter(|(p, l)| p == l)
        .count();
    correct as f32 / labels.len() as f32
}

/// Confusion matrix for multi-class classification
///
/// Element [i][j] counts samples with true label i predicted as j.
#[derive(Clone, Debug)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<usize>>,
    n_classes: usize,
}

impl ConfusionMatrix {
    /// Build from prediction/label sequences
    pub fn from_predictions(predictions: &[usize], labels: &[usize], n_classes: usize) -> Self {
        let mut matrix = vec![vec![0; n_classes]; n_classes];
        for (&pred, &label) in predictions.iter().zip(labels) {
            if pred < n_classes && label < n_classes {
                matrix[label][pred] += 1;
            }
        }
        Self { matrix, n_classes }
    }

    /// Count at [true_label][predicted_label]
    pub fn get(&self, true_label: usize, predicted_label: usize) -> usize {
        self.matrix[true_label][predicted_label]
    }

    /// Number of classes
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Total sample count
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    /// Samples with true label `class`
    pub fn support(&self, class: usize) -> usize {
        self.matrix[class].iter().sum()
    }

    /// Row-normalized value: fraction of class `i` predicted as `j`
    pub fn normalized(&self, true_label: usize, predicted_label: usize) -> f32 {
        let row: usize = self.support(true_label);
        if row == 0 {
            0.0
        } else {
            self.matrix[true_label][predicted_label] as f32 / row as f32
        }
    }

    /// Precision for a class (TP / predicted positives)
    pub fn precision(&self, class: usize) -> f32 {
        let predicted: usize = (0..self.n_classes).map(|i| self.matrix[i][class]).sum();
        if predicted == 0 {
            0.0
        } else {
            self.matrix[class][class] as f32 / predicted as f32
        }
    }

    /// Recall for a class (TP / actual positives)
    pub fn recall(&self, class: usize) -> f32 {
        let actual = self.support(class);
        if actual == 0 {
            0.0
        } else {
            self.matrix[class][class] as f32 / actual as f32
        }
    }
}

/// Per-class precision/recall/support summary, one line per class
pub fn classification_report(cm: &ConfusionMatrix) -> String {
    let mut report = String::new();
    for class in 0..cm.n_classes() {
        report.push_str(&format!(
            "  class {class}: precision {:.4}, recall {:.4}, support {}\n",
            cm.precision(class),
            cm.recall(class),
            cm.support(class)
        ));
    }
    report
}

/// Binary ROC curve with area under the curve
#[derive(Clone, Debug)]
pub struct RocCurve {
    /// False positive rates, ascending
    pub fpr: Vec<f32>,

    /// True positive rates, aligned with `fpr`
    pub tpr: Vec<f32>,

    /// Trapezoidal area under the curve
    pub auc: f32,
}

/// Compute a binary ROC curve from labels and positive-class scores
///
/// Sweeps thresholds over the sorted scores. Both classes must appear in
/// `labels`.
pub fn roc_curve(labels: &[bool], scores: &[f32]) -> Result<RocCurve> {
    let positives = labels.iter().filter(|&&l| l).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(Error::InsufficientClassDiversity);
    }

    let mut order: Vec<usize> = (0..labels.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let mut tp = 0usize;
    let mut fp = 0usize;

    let mut i = 0;
    while i < order.len() {
        // Consume tied scores together so the curve has one point per threshold
        let threshold = scores[order[i]];
        while i < order.len() && scores[order[i]] == threshold {
            if labels[order[i]] {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        fpr.push(fp as f32 / negatives as f32);
        tpr.push(tp as f32 / positives as f32);
    }

    let mut auc = 0.0;
    for w in 1..fpr.len() {
        auc += (fpr[w] - fpr[w - 1]) * (tpr[w] + tpr[w - 1]) / 2.0;
    }

    Ok(RocCurve { fpr, tpr, auc })
}
