use crate::autograd::NodeId;
use crate::tensor::Tensor;
use std::fmt;
use std::sync::Arc;

/// Observer invoked with the fully accumulated gradient of a node.
pub type GradientHook = Arc<dyn Fn(&Tensor) + Send + Sync>;

/// Returned by `Tensor::register_hook`; removes the hook again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle {
    node: NodeId,
    id: u64,
}

impl HookHandle {
    /// The node the hook is attached to.
    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// Ordered list of hooks attached to one node.
#[derive(Default, Clone)]
pub struct HookRegistry {
    next_id: u64,
    hooks: Vec<(u64, GradientHook)>,
}

impl HookRegistry {
    pub(crate) fn register(&mut self, node: NodeId, hook: GradientHook) -> HookHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.hooks.push((id, hook));
        HookHandle { node, id }
    }

    pub(crate) fn remove(&mut self, handle: &HookHandle) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|(id, _)| *id != handle.id);
        self.hooks.len() != before
    }

    /// Copies the hooks out so they can run without holding the tensor lock.
    pub(crate) fn snapshot(&self) -> Vec<GradientHook> {
        self.hooks.iter().map(|(_, hook)| Arc::clone(hook)).collect()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HookRegistry({} hooks)", self.hooks.len())
    }
}

/// Runs every hook of `node` on `grad`, in registration order.
pub(crate) fn dispatch(node: &Tensor, grad: &Tensor) {
    let hooks = node.read_data().hooks.snapshot();
    for hook in hooks {
        hook(grad);
    }
}
