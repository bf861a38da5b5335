//! Dynamic-graph tensors with reverse-mode automatic differentiation,
//! including gradients of gradients.
//!
//! ```no_run
//! use dygraph_core::{grad, GradOptions, Tensor};
//! use dygraph_core::ops::{mul_op, sum_op};
//!
//! let x = Tensor::new_f64(vec![1.0, 2.0], vec![2]).unwrap();
//! x.set_stop_gradient(false);
//! let y = sum_op(&mul_op(&x, &x).unwrap()).unwrap();
//! let dx = grad(&[y], &[x.clone()], GradOptions::new().create_graph(true)).unwrap();
//! let ddx = grad(&[sum_op(dx[0].value().unwrap()).unwrap()], &[x], GradOptions::new()).unwrap();
//! ```

pub mod autograd;
pub mod buffer;
pub mod config;
pub mod error;
pub mod nn;
pub mod ops;
pub mod tensor;
pub mod tensor_data;
pub mod types;
pub mod utils;

pub use autograd::{grad, no_grad, GradOptions, Gradient, NodeId};
pub use config::EngineConfig;
pub use error::DygraphError;
pub use tensor::Tensor;
pub use types::DType;
