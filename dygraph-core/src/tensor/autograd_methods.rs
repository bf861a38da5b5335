use crate::autograd::engine::run_backward;
use crate::autograd::grad_mode::no_grad;
use crate::autograd::hooks::{GradientHook, HookHandle};
use crate::autograd::GradFn;
use crate::error::DygraphError;
use crate::ops::arithmetic::add_op;
use crate::tensor::Tensor;
use crate::tensor_data::TensorData;
use std::sync::Arc;

impl Tensor {
    /// True when no gradient is propagated into or through this tensor.
    pub fn stop_gradient(&self) -> bool {
        self.read_data().stop_gradient
    }

    /// Sets the `stop_gradient` flag.
    ///
    /// Setting it on a produced tensor cuts every later traversal at this node.
    pub fn set_stop_gradient(&self, stop_gradient: bool) {
        self.write_data().stop_gradient = stop_gradient;
    }

    pub fn is_leaf(&self) -> bool {
        self.read_data().is_leaf()
    }

    pub fn grad_fn(&self) -> Option<GradFn> {
        self.read_data().grad_fn.clone()
    }

    /// Returns a new node sharing this tensor's data but with no history.
    ///
    /// The result is a leaf with `stop_gradient = true` and a fresh `NodeId`.
    pub fn detach(&self) -> Tensor {
        let guard = self.read_data();
        let detached = TensorData {
            id: crate::autograd::NodeId::next(),
            buffer: guard.buffer.clone(),
            shape: guard.shape.clone(),
            stop_gradient: true,
            grad: Default::default(),
            grad_fn: None,
            hooks: Default::default(),
        };
        Tensor {
            data: Arc::new(std::sync::RwLock::new(detached)),
        }
    }

    /// Back-propagates from this tensor into every reachable leaf, seeding with ones.
    ///
    /// Gradients are added to each leaf's persistent store (see `gradient()`).
    pub fn backward(&self, retain_graph: bool) -> Result<(), DygraphError> {
        self.backward_with(None, retain_graph)
    }

    /// Like `backward`, with an explicit seed gradient.
    pub fn backward_with(
        &self,
        grad: Option<&Tensor>,
        retain_graph: bool,
    ) -> Result<(), DygraphError> {
        if self.stop_gradient() {
            return Err(DygraphError::InvalidArgument(
                "backward() called on a tensor with stop_gradient=true".to_string(),
            ));
        }
        run_backward(self, grad, retain_graph)
    }

    /// The gradient accumulated by `backward`, if any.
    pub fn gradient(&self) -> Option<Tensor> {
        self.read_data().grad.value().cloned()
    }

    /// Number of backward passes that deposited into `gradient()` since the last reset.
    pub fn grad_contributions(&self) -> usize {
        self.read_data().grad.contributions()
    }

    pub fn clear_gradient(&self) {
        self.write_data().grad.reset();
    }

    /// Adds `grad` into the persistent store. The sum is never recorded.
    pub(crate) fn accumulate_gradient(&self, grad: Tensor) -> Result<(), DygraphError> {
        let current = self.read_data().grad.value().cloned();
        let updated = match current {
            Some(current) => {
                let _guard = no_grad();
                add_op(&current, &grad)?
            }
            None => grad,
        };
        self.write_data().grad.store(updated);
        Ok(())
    }

    /// Registers an observer called with this node's gradient each time a
    /// traversal finalizes it.
    pub fn register_hook<F>(&self, hook: F) -> HookHandle
    where
        F: Fn(&Tensor) + Send + Sync + 'static,
    {
        let hook: GradientHook = Arc::new(hook);
        let mut guard = self.write_data();
        let id = guard.id;
        guard.hooks.register(id, hook)
    }

    /// Removes a hook. Returns false if the handle belongs to another node or
    /// was already removed.
    pub fn remove_hook(&self, handle: &HookHandle) -> bool {
        let mut guard = self.write_data();
        if handle.node() != guard.id {
            return false;
        }
        guard.hooks.remove(handle)
    }
}

#[cfg(test)]
#[path = "autograd_methods_test.rs"]
mod tests;
