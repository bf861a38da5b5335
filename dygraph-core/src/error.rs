use crate::autograd::NodeId;
use crate::types::DType;
use thiserror::Error;

/// Custom error type for the dygraph framework.
#[derive(Error, Debug, PartialEq, Clone)] // PartialEq for easier testing
pub enum DygraphError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("The {argument} argument contains duplicate tensor {node:?}")]
    DuplicateNode { argument: String, node: NodeId },

    #[error("The input at index {index} is not reachable from any output; set allow_unused if this is expected")]
    UnusedInput { index: usize },

    #[error("Shape mismatch: expected {expected:?}, got {actual:?} during operation {operation}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
        operation: String,
    },

    #[error("Trying to run backward through the graph a second time: the saved state of '{operation}' has been released (use retain_graph)")]
    GraphReleased { operation: String },

    #[error("Cannot broadcast shapes: {shape1:?} and {shape2:?}")]
    BroadcastError {
        shape1: Vec<usize>,
        shape2: Vec<usize>,
    },

    #[error("Data type mismatch for operation '{operation}': expected {expected:?}, got {actual:?}")]
    DataTypeMismatch {
        expected: DType,
        actual: DType,
        operation: String,
    },

    #[error("Tensor creation error: data length {data_len} does not match shape {shape:?}")]
    TensorCreationError { data_len: usize, shape: Vec<usize> },

    #[error("Index out of bounds: index {index:?} for shape {shape:?}")]
    IndexOutOfBounds {
        index: Vec<usize>,
        shape: Vec<usize>,
    },

    #[error("Internal error: {0}")]
    InternalError(String),
}
