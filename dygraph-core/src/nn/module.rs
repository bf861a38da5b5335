use crate::error::DygraphError;
use crate::tensor::Tensor;

/// The base trait for neural network modules.
pub trait Module: std::fmt::Debug + Send + Sync {
    /// Performs a forward pass of the module.
    fn forward(&self, input: &Tensor) -> Result<Tensor, DygraphError>;

    /// Learnable tensors of the module, each with `stop_gradient == false`.
    fn parameters(&self) -> Vec<Tensor> {
        self.named_parameters().into_iter().map(|(_, p)| p).collect()
    }

    /// Parameters with names unique within the module (e.g. "weight", "bias").
    fn named_parameters(&self) -> Vec<(String, Tensor)>;
}
