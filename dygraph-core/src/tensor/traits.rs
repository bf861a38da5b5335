// src/tensor/traits.rs

use crate::tensor::Tensor;
use std::fmt;
use std::sync::Arc;

impl Clone for Tensor {
    /// Shallow clone: the result is the same graph node, sharing data and
    /// autograd state.
    fn clone(&self) -> Self {
        Tensor {
            data: Arc::clone(&self.data),
        }
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data.try_read() {
            Ok(guard) => write!(
                f,
                "Tensor(id={}, shape={:?}, dtype={:?}, stop_gradient={}, grad_fn={})",
                guard.id.raw(),
                guard.shape,
                guard.dtype(),
                guard.stop_gradient,
                guard
                    .grad_fn
                    .as_ref()
                    .map(|g| g.name())
                    .unwrap_or("None"),
            ),
            Err(_) => write!(f, "Tensor(<locked>)"),
        }
    }
}

impl PartialEq for Tensor {
    /// Value equality: same shape, same dtype and identical elements.
    fn eq(&self, other: &Self) -> bool {
        if self.same_node(other) {
            return true;
        }
        let lhs = self.read_data();
        let rhs = other.read_data();
        lhs.shape == rhs.shape
            && lhs.dtype() == rhs.dtype()
            && lhs.buffer.to_f64_vec() == rhs.buffer.to_f64_vec()
    }
}
