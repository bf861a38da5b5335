//! # Activation Functions
//!
//! - [`relu_op`](relu::relu_op) and [`leaky_relu_op`](relu::leaky_relu_op)
//! - [`sigmoid_op`](sigmoid::sigmoid_op)
//!
//! The piecewise-linear activations differentiate through a constant mask, so
//! their second derivative is zero. Sigmoid recomputes its output from the saved
//! input in backward, which keeps the recorded backward differentiable.

pub mod relu;
pub mod sigmoid;

pub use relu::{leaky_relu_op, relu_op};
pub use sigmoid::sigmoid_op;
