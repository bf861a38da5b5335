use crate::error::DygraphError;
use crate::nn::module::Module;
use crate::ops::arithmetic::add_op;
use crate::ops::linalg::matmul_op;
use crate::tensor::{uniform, Tensor};
use crate::types::DType;
use rand::Rng;

/// Applies an affine transformation to the incoming data: `y = x @ W + b`.
///
/// `W` has shape `[in_features, out_features]` and `b` shape `[out_features]`,
/// both drawn from `U(-1/sqrt(in_features), 1/sqrt(in_features))`.
#[derive(Debug)]
pub struct Linear {
    weight: Tensor,
    bias: Tensor,
    in_features: usize,
    out_features: usize,
}

impl Linear {
    /// Creates a new F32 linear layer.
    pub fn new<R: Rng + ?Sized>(
        in_features: usize,
        out_features: usize,
        rng: &mut R,
    ) -> Result<Self, DygraphError> {
        Self::with_dtype(in_features, out_features, DType::F32, rng)
    }

    pub fn with_dtype<R: Rng + ?Sized>(
        in_features: usize,
        out_features: usize,
        dtype: DType,
        rng: &mut R,
    ) -> Result<Self, DygraphError> {
        if in_features == 0 || out_features == 0 {
            return Err(DygraphError::InvalidArgument(format!(
                "Linear requires non-zero features, got in={} out={}",
                in_features, out_features
            )));
        }
        let bound = 1.0 / (in_features as f64).sqrt();
        let weight = uniform(&[in_features, out_features], -bound, bound, dtype, rng)?;
        let bias = uniform(&[out_features], -bound, bound, dtype, rng)?;
        weight.set_stop_gradient(false);
        bias.set_stop_gradient(false);
        Ok(Linear {
            weight,
            bias,
            in_features,
            out_features,
        })
    }

    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    pub fn bias(&self) -> &Tensor {
        &self.bias
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn out_features(&self) -> usize {
        self.out_features
    }
}

impl Module for Linear {
    fn forward(&self, input: &Tensor) -> Result<Tensor, DygraphError> {
        add_op(&matmul_op(input, &self.weight)?, &self.bias)
    }

    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        vec![
            ("weight".to_string(), self.weight.clone()),
            ("bias".to_string(), self.bias.clone()),
        ]
    }
}

#[cfg(test)]
#[path = "linear_test.rs"]
mod tests;
