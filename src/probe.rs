//! Single-shot activation/gradient capture
//!
//! A [`Probe`] attaches to one named layer of an instrumented model. The
//! resulting [`ProbeHandle`] is valid for exactly one forward/backward
//! cycle: `capture` consumes the handle, drives the cycle, and yields the
//! paired activation and gradient. Pairing tensors across cycles is
//! therefore impossible by construction. While a handle is live the probe
//! refuses to attach again.

use crate::saliency::CapturedPair;
use crate::{Error, Result};
use ndarray::{Array2, ArrayD};
use std::cell::Cell;
use std::rc::Rc;

/// Model capability the probe requires
///
/// Instead of implicit forward/backward interception, the model exposes a
/// named intermediate tensor and its gradient for the current pass as
/// first-class values.
pub trait InstrumentedModel {
    /// Run a forward pass, returning per-class scores (batch, classes)
    fn forward(&mut self, input: &ArrayD<f32>) -> Result<Array2<f32>>;

    /// Backpropagate from the score of one class of the current pass
    fn backward_class(&mut self, class_index: usize) -> Result<()>;

    /// Clear parameter and layer gradients
    fn zero_grad(&mut self);

    /// Names of layers addressable for capture
    fn layer_names(&self) -> Vec<String>;

    /// Output tensor of a named layer for the current pass
    fn layer_output(&self, layer: &str) -> Option<ArrayD<f32>>;

    /// Gradient flowing into a named layer's output for the current pass
    fn layer_output_grad(&self, layer: &str) -> Option<ArrayD<f32>>;
}

/// Attachment point for capture handles
#[derive(Default)]
pub struct Probe {
    attached: Rc<Cell<bool>>,
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach to a named layer, yielding a one-shot handle
    ///
    /// Fails with [`Error::ProbeAlreadyActive`] if a previous handle has
    /// not been released, and [`Error::LayerNotFound`] if the model does
    /// not expose the layer.
    pub fn attach<M: InstrumentedModel>(&self, model: &M, layer: &str) -> Result<ProbeHandle> {
        if self.attached.get() {
            return Err(Error::ProbeAlreadyActive {
                layer: layer.to_string(),
            });
        }
        if !model.layer_names().iter().any(|n| n == layer) {
            return Err(Error::LayerNotFound(layer.to_string()));
        }

        self.attached.set(true);
        Ok(ProbeHandle {
            layer: layer.to_string(),
            attached: Rc::clone(&self.attached),
        })
    }

    /// Whether a handle is currently live
    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }
}

/// One-shot capture handle
///
/// Dropping the handle without capturing releases the probe.
#[derive(Debug)]
pub struct ProbeHandle {
    layer: String,
    attached: Rc<Cell<bool>>,
}

impl ProbeHandle {
    /// Target layer name
    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// Drive one forward/backward cycle and yield the captured pair
    ///
    /// Consumes the handle: the activation and gradient are guaranteed to
    /// come from this single cycle, and the probe detaches on return.
    pub fn capture<M: InstrumentedModel>(
        self,
        model: &mut M,
        input: &ArrayD<f32>,
        class_index: usize,
    ) -> Result<CapturedPair> {
        model.zero_grad();
        model.forward(input)?;
        model.backward_class(class_index)?;

        let activation = model
            .layer_output(&self.layer)
            .ok_or_else(|| Error::LayerNotFound(self.layer.clone()))?;
        let gradient = model
            .layer_output_grad(&self.layer)
            .ok_or_else(|| Error::LayerNotFound(self.layer.clone()))?;

        CapturedPair::from_dyn(&activation, &gradient, class_index)
    }
}

impl Drop for ProbeHandle {
    fn drop(&mut self) {
        self.attached.set(false);
    }
}
