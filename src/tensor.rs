//! Flat parameter tensor with gradient storage
//!
//! Model parameters are held as flat `f32` vectors with an attached
//! gradient cell. Gradients are computed analytically by the model's
//! backward pass and accumulated here; optimizers read them during
//! `step` and clear them with `zero_grad`.

use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Parameter tensor with gradient accumulation
#[derive(Clone)]
pub struct Tensor {
    data: Array1<f32>,
    grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl Tensor {
    /// Create a new tensor with data
    pub fn new(data: Array1<f32>) -> Self {
        Self {
            data,
            grad: Rc::new(RefCell::new(None)),
        }
    }

    /// Create a tensor from a vector
    pub fn from_vec(data: Vec<f32>) -> Self {
        Self::new(Array1::from(data))
    }

    /// Create a tensor filled with zeros
    pub fn zeros(size: usize) -> Self {
        Self::new(Array1::zeros(size))
    }

    /// Get reference to data
    pub fn data(&self) -> &Array1<f32> {
        &self.data
    }

    /// Get mutable reference to data
    pub fn data_mut(&mut self) -> &mut Array1<f32> {
        &mut self.data
    }

    /// Get gradient (if computed)
    pub fn grad(&self) -> Option<Array1<f32>> {
        self.grad.borrow().clone()
    }

    /// Accumulate gradient (for when a parameter contributes multiple times)
    pub fn accumulate_grad(&self, grad: Array1<f32>) {
        let mut grad_ref = self.grad.borrow_mut();
        if let Some(existing) = grad_ref.as_mut() {
            *existing = &*existing + &grad;
        } else {
            *grad_ref = Some(grad);
        }
    }

    /// Zero out gradient
    pub fn zero_grad(&self) {
        *self.grad.borrow_mut() = None;
    }

    /// Get size
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("data", &self.data)
            .field("grad", &self.grad.borrow())
            .finish()
    }
}
