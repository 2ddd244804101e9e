//! Model collaborator traits and the built-in reference classifier
//!
//! The trainer and probe only know the [`Model`] and
//! [`crate::probe::InstrumentedModel`] interfaces. [`TinyConvNet`] is a
//! minimal differentiable classifier carried so the CLI, the saliency
//! pipeline, and the integration tests have a real model with a
//! capturable rank-4 layer: one 3x3 convolution bank, ReLU, global
//! average pooling, and a dense softmax head, with analytic gradients.

use crate::probe::InstrumentedModel;
use crate::{Error, Result, Tensor};
use ndarray::{Array1, Array2, Array4, ArrayD, Ix4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Serializable model parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    /// Architecture tag, checked on restore
    pub architecture: String,

    /// Named flat parameter tensors
    pub tensors: Vec<(String, Vec<f32>)>,
}

/// Trainable model collaborator
///
/// Extends the probe's capture capability with parameter access for the
/// optimizer, an analytic backward pass from logit gradients, and
/// verbatim state serialization for checkpoints.
pub trait Model: InstrumentedModel {
    /// Backpropagate a loss gradient w.r.t. the logits of the last pass
    fn backward(&mut self, grad_logits: &Array2<f32>) -> Result<()>;

    /// Flat parameter tensors for the optimizer
    fn params_mut(&mut self) -> &mut [Tensor];

    /// Number of output classes
    fn num_classes(&self) -> usize;

    /// Snapshot parameters for checkpointing
    fn state(&self) -> ModelState;

    /// Restore parameters from a checkpoint, field for field
    fn load_state(&mut self, state: &ModelState) -> Result<()>;
}

const CONV_LAYER: &str = "conv1";
const KERNEL: usize = 3;

struct ForwardCache {
    input: Array4<f32>,
    pre_activation: Array4<f32>,
    activation: Array4<f32>,
    pooled: Array2<f32>,
}

/// Built-in reference classifier
///
/// Parameter layout: conv weights (filters x 3 x 3, single input
/// channel), conv bias, dense weights (classes x filters), dense bias.
pub struct TinyConvNet {
    filters: usize,
    classes: usize,
    params: Vec<Tensor>,
    cache: Option<ForwardCache>,
    layer_grad: Option<Array4<f32>>,
}

impl TinyConvNet {
    pub fn new(filters: usize, classes: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let conv_scale = (1.0 / (KERNEL * KERNEL) as f32).sqrt();
        let dense_scale = (1.0 / filters as f32).sqrt();

        let mut init = |len: usize, scale: f32| {
            Tensor::from_vec((0..len).map(|_| rng.gen_range(-scale..scale)).collect())
        };

        let params = vec![
            init(filters * KERNEL * KERNEL, conv_scale),
            Tensor::zeros(filters),
            init(classes * filters, dense_scale),
            Tensor::zeros(classes),
        ];

        Self {
            filters,
            classes,
            params,
            cache: None,
            layer_grad: None,
        }
    }

    fn conv_weight(&self, k: usize, dy: usize, dx: usize) -> f32 {
        self.params[0].data()[k * KERNEL * KERNEL + dy * KERNEL + dx]
    }

    fn dense_weight(&self, c: usize, k: usize) -> f32 {
        self.params[2].data()[c * self.filters + k]
    }

    /// Shared backward: accumulates parameter gradients and records the
    /// gradient flowing into the conv layer's output.
    fn backward_impl(&mut self, grad_logits: &Array2<f32>) -> Result<()> {
        let cache = self.cache.as_ref().ok_or(Error::BackwardWithoutForward)?;
        let (batch, _, height, width) = cache.activation.dim();
        if grad_logits.dim() != (batch, self.classes) {
            return Err(Error::ShapeMismatch {
                expected: vec![batch, self.classes],
                got: grad_logits.shape().to_vec(),
            });
        }

        let spatial_len = (height * width) as f32;

        // Dense head gradients
        let mut dense_w_grad = Array1::<f32>::zeros(self.classes * self.filters);
        let mut dense_b_grad = Array1::<f32>::zeros(self.classes);
        for b in 0..batch {
            for c in 0..self.classes {
                let g = grad_logits[[b, c]];
                dense_b_grad[c] += g;
                for k in 0..self.filters {
                    dense_w_grad[c * self.filters + k] += g * cache.pooled[[b, k]];
                }
            }
        }

        // Gradient into the conv activation through GAP and the head
        let mut act_grad = Array4::<f32>::zeros((batch, self.filters, height, width));
        for b in 0..batch {
            for k in 0..self.filters {
                let mut df = 0.0;
                for c in 0..self.classes {
                    df += grad_logits[[b, c]] * self.dense_weight(c, k);
                }
                let per_pixel = df / spatial_len;
                for y in 0..height {
                    for x in 0..width {
                        act_grad[[b, k, y, x]] = per_pixel;
                    }
                }
            }
        }

        // Through ReLU, then into conv weights and bias
        let mut conv_w_grad = Array1::<f32>::zeros(self.filters * KERNEL * KERNEL);
        let mut conv_b_grad = Array1::<f32>::zeros(self.filters);
        let pad = KERNEL / 2;
        for b in 0..batch {
            for k in 0..self.filters {
                for y in 0..height {
                    for x in 0..width {
                        if cache.pre_activation[[b, k, y, x]] <= 0.0 {
                            continue;
                        }
                        let dz = act_grad[[b, k, y, x]];
                        conv_b_grad[k] += dz;
                        for dy in 0..KERNEL {
                            for dx in 0..KERNEL {
                                let sy = y + dy;
                                let sx = x + dx;
                                if sy < pad || sx < pad {
                                    continue;
                                }
                                let (sy, sx) = (sy - pad, sx - pad);
                                if sy < height && sx < width {
                                    conv_w_grad[k * KERNEL * KERNEL + dy * KERNEL + dx] +=
                                        dz * cache.input[[b, 0, sy, sx]];
                                }
                            }
                        }
                    }
                }
            }
        }

        self.params[0].accumulate_grad(conv_w_grad);
        self.params[1].accumulate_grad(conv_b_grad);
        self.params[2].accumulate_grad(dense_w_grad);
        self.params[3].accumulate_grad(dense_b_grad);
        self.layer_grad = Some(act_grad);
        Ok(())
    }
}

impl InstrumentedModel for TinyConvNet {
    fn forward(&mut self, input: &ArrayD<f32>) -> Result<Array2<f32>> {
        let input = input
            .view()
            .into_dimensionality::<Ix4>()
            .map_err(|_| Error::UnsupportedActivationRank { rank: input.ndim() })?
            .to_owned();
        let (batch, channels, height, width) = input.dim();
        if channels != 1 {
            return Err(Error::ShapeMismatch {
                expected: vec![batch, 1, height, width],
                got: input.shape().to_vec(),
            });
        }

        let pad = KERNEL / 2;
        let mut pre_activation = Array4::<f32>::zeros((batch, self.filters, height, width));
        for b in 0..batch {
            for k in 0..self.filters {
                let bias = self.params[1].data()[k];
                for y in 0..height {
                    for x in 0..width {
                        let mut sum = bias;
                        for dy in 0..KERNEL {
                            for dx in 0..KERNEL {
                                let sy = y + dy;
                                let sx = x + dx;
                                if sy < pad || sx < pad {
                                    continue;
                                }
                                let (sy, sx) = (sy - pad, sx - pad);
                                if sy < height && sx < width {
                                    sum += self.conv_weight(k, dy, dx) * input[[b, 0, sy, sx]];
                                }
                            }
                        }
                        pre_activation[[b, k, y, x]] = sum;
                    }
                }
            }
        }

        let activation = pre_activation.mapv(|v| v.max(0.0));

        let spatial_len = (height * width) as f32;
        let mut pooled = Array2::<f32>::zeros((batch, self.filters));
        for b in 0..batch {
            for k in 0..self.filters {
                pooled[[b, k]] = activation
                    .index_axis(ndarray::Axis(0), b)
                    .index_axis(ndarray::Axis(0), k)
                    .sum()
                    / spatial_len;
            }
        }

        let mut logits = Array2::<f32>::zeros((batch, self.classes));
        for b in 0..batch {
            for c in 0..self.classes {
                let mut sum = self.params[3].data()[c];
                for k in 0..self.filters {
                    sum += self.dense_weight(c, k) * pooled[[b, k]];
                }
                logits[[b, c]] = sum;
            }
        }

        self.cache = Some(ForwardCache {
            input,
            pre_activation,
            activation,
            pooled,
        });
        self.layer_grad = None;
        Ok(logits)
    }

    fn backward_class(&mut self, class_index: usize) -> Result<()> {
        let batch = self
            .cache
            .as_ref()
            .ok_or(Error::BackwardWithoutForward)?
            .activation
            .dim()
            .0;
        let mut grad = Array2::<f32>::zeros((batch, self.classes));
        grad[[0, class_index.min(self.classes - 1)]] = 1.0;
        self.backward_impl(&grad)
    }

    fn zero_grad(&mut self) {
        for param in &self.params {
            param.zero_grad();
        }
        self.layer_grad = None;
    }

    fn layer_names(&self) -> Vec<String> {
        vec![CONV_LAYER.to_string()]
    }

    fn layer_output(&self, layer: &str) -> Option<ArrayD<f32>> {
        (layer == CONV_LAYER)
            .then(|| self.cache.as_ref().map(|c| c.activation.clone().into_dyn()))
            .flatten()
    }

    fn layer_output_grad(&self, layer: &str) -> Option<ArrayD<f32>> {
        (layer == CONV_LAYER)
            .then(|| self.layer_grad.as_ref().map(|g| g.clone().into_dyn()))
            .flatten()
    }
}

impl Model for TinyConvNet {
    fn backward(&mut self, grad_logits: &Array2<f32>) -> Result<()> {
        self.backward_impl(grad_logits)
    }

    fn params_mut(&mut self) -> &mut [Tensor] {
        &mut self.params
    }

    fn num_classes(&self) -> usize {
        self.classes
    }

    fn state(&self) -> ModelState {
        let names = ["conv1.weight", "conv1.bias", "head.weight", "head.bias"];
        ModelState {
            architecture: "tiny_conv_net".to_string(),
            tensors: names
                .iter()
                .zip(&self.params)
                .map(|(name, t)| (name.to_string(), t.data().to_vec()))
                .collect(),
        }
    }

    fn load_state(&mut self, state: &ModelState) -> Result<()> {
        if state.architecture != "tiny_conv_net" {
            return Err(Error::Serialization(format!(
                "model state is '{}', expected 'tiny_conv_net'",
                state.architecture
            )));
        }
        if state.tensors.len() != self.params.len() {
            return Err(Error::Serialization(format!(
                "expected {} parameter tensors, got {}",
                self.params.len(),
                state.tensors.len()
            )));
        }
        for ((_, values), param) in state.tensors.iter().zip(&mut self.params) {
            if values.len() != param.len() {
                return Err(Error::ShapeMismatch {
                    expected: vec![param.len()],
                    got: vec![values.len()],
                });
            }
            *param.data_mut() = Array1::from(values.clone());
        }
        Ok(())
    }
}
