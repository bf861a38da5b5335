use std::fmt::Debug;

use crate::autograd::accumulator::GradAccumulator;
use crate::autograd::hooks::HookRegistry;
use crate::autograd::{GradFn, NodeId};
use crate::buffer::CpuBuffer;
use crate::error::DygraphError;
use crate::types::DType;

/// Internal storage and metadata for a Tensor.
///
/// This struct holds the data buffer, shape and the autograd-related state of
/// one node of the dynamic graph. It is wrapped in `Arc<RwLock<TensorData>>`
/// by the `Tensor` struct to allow shared ownership and interior mutability.
#[derive(Debug)]
pub struct TensorData {
    /// Process-unique identity of the node. Clones of a `Tensor` share it,
    /// `detach()` allocates a new one.
    pub(crate) id: NodeId,
    /// The underlying data buffer holding typed data.
    pub(crate) buffer: CpuBuffer,
    /// The shape (dimensions) of the tensor.
    pub(crate) shape: Vec<usize>,

    // --- Autograd Metadata ---
    /// When true, no gradient is propagated into or through this node.
    pub(crate) stop_gradient: bool,
    /// Persistent gradient store filled by `Tensor::backward`.
    pub(crate) grad: GradAccumulator,
    /// The record that produced this tensor, and which of its outputs it is.
    /// Leaf tensors have `grad_fn = None`.
    pub(crate) grad_fn: Option<GradFn>,
    /// Gradient observers, invoked in registration order.
    pub(crate) hooks: HookRegistry,
}

impl TensorData {
    /// Creates a new leaf `TensorData` from a buffer and a shape.
    ///
    /// # Errors
    /// Returns `DygraphError::TensorCreationError` if the buffer length does not
    /// match the number of elements implied by `shape`.
    pub fn new(buffer: CpuBuffer, shape: Vec<usize>) -> Result<Self, DygraphError> {
        let numel: usize = shape.iter().product();
        let data_len = buffer.len();
        if data_len != numel {
            return Err(DygraphError::TensorCreationError { data_len, shape });
        }
        Ok(TensorData {
            id: NodeId::next(),
            buffer,
            shape,
            stop_gradient: true,
            grad: GradAccumulator::default(),
            grad_fn: None,
            hooks: HookRegistry::default(),
        })
    }

    /// Provides immutable access to the underlying data buffer.
    pub fn buffer(&self) -> &CpuBuffer {
        &self.buffer
    }

    pub fn dtype(&self) -> DType {
        self.buffer.dtype()
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// True when the node was not produced by a recorded operation.
    pub fn is_leaf(&self) -> bool {
        self.grad_fn.is_none()
    }
}
