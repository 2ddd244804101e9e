//! Classification loss

use ndarray::Array2;

/// Mean softmax cross-entropy over a batch of logits.
///
/// Returns the scalar loss and the gradient w.r.t. the logits, already
/// divided by the batch size so callers feed it straight into the model
/// backward pass.
pub fn softmax_cross_entropy(logits: &Array2<f32>, labels: &[usize]) -> (f32, Array2<f32>) {
    let (batch, classes) = logits.dim();
    debug_assert_eq!(batch, labels.len());

    let probs = crate::metrics::softmax_rows(logits);
    let mut grad = probs.clone();
    let mut loss = 0.0;
    for (b, &label) in labels.iter().enumerate() {
        let label = label.min(classes - 1);
        loss -= probs[[b, label]].max(1e-12).ln();
        grad[[b, label]] -= 1.0;
    }
    grad.mapv_inplace(|v| v / batch as f32);
    (loss / batch as f32, grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_uniform_logits_give_log_classes() {
        let logits = array![[0.0, 0.0, 0.0]];
        let (loss, _) = softmax_cross_entropy(&logits, &[1]);
        assert_relative_eq!(loss, (3.0f32).ln(), epsilon = 1e-6);
    }

    #[test]
    fn test_confident_correct_prediction_has_low_loss() {
        let logits = array![[10.0, -10.0]];
        let (loss, grad) = softmax_cross_entropy(&logits, &[0]);
        assert!(loss < 1e-3);
        assert!(grad[[0, 0]].abs() < 1e-3);
    }

    #[test]
    fn test_gradient_rows_sum_to_zero() {
        let logits = array![[1.0, 2.0, 0.5], [0.0, -1.0, 3.0]];
        let (_, grad) = softmax_cross_entropy(&logits, &[2, 0]);
        for row in grad.rows() {
            assert_relative_eq!(row.sum(), 0.0, epsilon = 1e-6);
        }
    }
}
