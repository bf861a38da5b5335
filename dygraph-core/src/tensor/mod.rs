// src/tensor/mod.rs

use crate::autograd::NodeId;
use crate::buffer::CpuBuffer;
use crate::error::DygraphError;
use crate::tensor_data::TensorData;
use crate::types::DType;
use std::sync::{Arc, RwLock, Weak};

mod autograd_methods;
pub mod create;
mod traits;

pub mod broadcast_utils;
pub mod utils;

// Re-export creation functions to make them public
pub use create::{full, full_like, ones, ones_like, uniform, zeros, zeros_like};

/// Represents a multi-dimensional array (tensor) and a node of the dynamic graph.
///
/// `Tensor` uses `Arc<RwLock<TensorData>>` internally to allow for:
/// 1.  **Shared Ownership:** cloning a `Tensor` is cheap and the clone is the
///     *same* graph node (same `NodeId`).
/// 2.  **Interior Mutability:** autograd metadata (`stop_gradient`, the
///     accumulated gradient, hooks) can be modified through a shared handle.
pub struct Tensor {
    pub(crate) data: Arc<RwLock<TensorData>>,
}

impl Tensor {
    /// Creates a new F32 leaf tensor from data and shape.
    pub fn new(data_vec: Vec<f32>, shape: Vec<usize>) -> Result<Self, DygraphError> {
        Self::from_buffer(CpuBuffer::F32(Arc::new(data_vec)), shape)
    }

    /// Creates a new F64 leaf tensor from data and shape.
    pub fn new_f64(data_vec: Vec<f64>, shape: Vec<usize>) -> Result<Self, DygraphError> {
        Self::from_buffer(CpuBuffer::F64(Arc::new(data_vec)), shape)
    }

    /// Creates a 0-dimensional F32 tensor.
    pub fn scalar(value: f32) -> Self {
        Tensor::wrap(TensorData {
            buffer: CpuBuffer::F32(Arc::new(vec![value])),
            ..Self::empty_scalar_data()
        })
    }

    /// Creates a 0-dimensional F64 tensor.
    pub fn scalar_f64(value: f64) -> Self {
        Tensor::wrap(TensorData {
            buffer: CpuBuffer::F64(Arc::new(vec![value])),
            ..Self::empty_scalar_data()
        })
    }

    fn empty_scalar_data() -> TensorData {
        TensorData {
            id: NodeId::next(),
            buffer: CpuBuffer::F32(Arc::new(Vec::new())),
            shape: Vec::new(),
            stop_gradient: true,
            grad: Default::default(),
            grad_fn: None,
            hooks: Default::default(),
        }
    }

    pub(crate) fn from_buffer(buffer: CpuBuffer, shape: Vec<usize>) -> Result<Self, DygraphError> {
        Ok(Tensor::wrap(TensorData::new(buffer, shape)?))
    }

    /// Builds a tensor from kernel output computed in `f64`.
    pub(crate) fn from_f64_as(
        dtype: DType,
        data_vec: Vec<f64>,
        shape: Vec<usize>,
    ) -> Result<Self, DygraphError> {
        Self::from_buffer(CpuBuffer::from_f64(dtype, data_vec), shape)
    }

    fn wrap(tensor_data: TensorData) -> Self {
        Tensor {
            data: Arc::new(RwLock::new(tensor_data)),
        }
    }

    /// Returns the identity of this node in the graph.
    pub fn id(&self) -> NodeId {
        self.read_data().id
    }

    /// Returns the data type (`DType`) of the tensor elements.
    pub fn dtype(&self) -> DType {
        self.read_data().dtype()
    }

    /// Returns a clone of the tensor's shape.
    pub fn shape(&self) -> Vec<usize> {
        self.read_data().shape.clone()
    }

    /// Returns the number of dimensions.
    pub fn rank(&self) -> usize {
        self.read_data().shape.len()
    }

    /// Returns the number of elements in the tensor.
    pub fn numel(&self) -> usize {
        self.read_data().numel()
    }

    /// Acquires a read lock on the tensor's data.
    /// Panics if the RwLock is poisoned.
    pub fn read_data(&self) -> std::sync::RwLockReadGuard<'_, TensorData> {
        self.data.read().expect("RwLock poisoned")
    }

    /// Acquires a write lock on the tensor's data.
    /// Panics if the RwLock is poisoned.
    pub fn write_data(&self) -> std::sync::RwLockWriteGuard<'_, TensorData> {
        self.data.write().expect("RwLock poisoned")
    }

    /// Returns a copy of the data of an F32 tensor.
    pub fn get_f32_data(&self) -> Result<Vec<f32>, DygraphError> {
        let guard = self.read_data();
        Ok(guard.buffer.try_get_f32()?.as_ref().clone())
    }

    /// Returns a copy of the data of an F64 tensor.
    pub fn get_f64_data(&self) -> Result<Vec<f64>, DygraphError> {
        let guard = self.read_data();
        Ok(guard.buffer.try_get_f64()?.as_ref().clone())
    }

    /// Returns the data widened to `f64`, whatever the dtype.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.read_data().buffer.to_f64_vec()
    }

    /// Returns the single value of a one-element tensor.
    pub fn item(&self) -> Result<f64, DygraphError> {
        let guard = self.read_data();
        if guard.numel() != 1 {
            return Err(DygraphError::InvalidArgument(format!(
                "item() requires a tensor with exactly one element, got shape {:?}",
                guard.shape
            )));
        }
        Ok(guard.buffer.to_f64_vec()[0])
    }

    /// True if both handles point at the same node.
    pub fn same_node(&self, other: &Tensor) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Non-owning handle on this node.
    pub(crate) fn downgrade(&self) -> Weak<RwLock<TensorData>> {
        Arc::downgrade(&self.data)
    }

    pub(crate) fn upgrade(weak: &Weak<RwLock<TensorData>>) -> Option<Tensor> {
        weak.upgrade().map(|data| Tensor { data })
    }
}
