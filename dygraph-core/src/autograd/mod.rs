//! # Automatic differentiation
//!
//! Operations on tensors that take part in differentiation append an
//! [`OperationRecord`] to an implicit tape. [`grad`] walks the tape backward from
//! a set of outputs to a set of inputs; with `create_graph` the walk is itself
//! recorded, so its results can be differentiated again (double backward).
//! [`Tensor::backward`](crate::tensor::Tensor::backward) runs the same walk into
//! every reachable leaf and accumulates the results there.

pub mod accumulator;
pub mod backward_op;
pub mod engine;
pub mod grad_check;
pub mod grad_mode;
pub mod graph;
pub mod hooks;

pub use backward_op::{
    needs_record, record_operation, BackwardOp, GradFn, Gradient, OperationRecord, OutputMeta,
};
pub use engine::{grad, GradOptions};
pub use grad_mode::{enable_grad, is_grad_enabled, no_grad, GradModeGuard};
pub use graph::NodeId;
pub use hooks::{GradientHook, HookHandle};
