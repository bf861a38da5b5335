//! # Tensor Operations Module (`ops`)
//!
//! Differentiable primitives. Each operation has a `xxx_op` function that runs
//! the forward kernel and, when `needs_record` says so, appends an
//! [`OperationRecord`](crate::autograd::OperationRecord) holding a `XxxBackward`
//! struct that implements [`BackwardOp`](crate::autograd::BackwardOp).
//!
//! Backward rules are written with these same `_op` functions. When the engine
//! runs with `create_graph`, recording is on and the gradient computation lands on
//! the tape like any forward computation, which is what makes higher-order
//! gradients possible.
//!
//! Kernels compute in `f64` and store the result in the dtype of the inputs.
//!
//! ## Key Submodules:
//!
//! - [`arithmetic`]: element-wise arithmetic with broadcasting.
//! - [`activation`]: relu, leaky relu, sigmoid.
//! - [`linalg`]: 2-D matmul and transpose.
//! - [`reduction`]: full sum, mean, and `sum_to` (reduction of broadcast dims).
//! - [`view`]: reshape, expand, split and concat (copying, contiguous).

pub mod activation;
pub mod arithmetic;
pub mod linalg;
pub mod reduction;
pub mod view;

pub(crate) mod utils;

pub use activation::{leaky_relu_op, relu_op, sigmoid_op};
pub use arithmetic::{
    add_op, add_scalar_op, div_op, mul_op, neg_op, pow_scalar_op, scale_op, sub_op,
};
pub use linalg::{matmul_op, transpose_op};
pub use reduction::{mean_op, sum_op, sum_to_op};
pub use view::{concat_op, expand_op, reshape_op, split_op};
