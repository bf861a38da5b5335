use crate::error::DygraphError;
use crate::tensor::broadcast_utils::{broadcast_shapes, BroadcastIndexer};
use crate::tensor::utils::index_to_coord;
use crate::tensor::Tensor;
use crate::types::DType;
use num_traits::Float;

/// Snapshot of a tensor's contents, taken under a short read lock.
pub(crate) struct Operand {
    pub(crate) data: Vec<f64>,
    pub(crate) shape: Vec<usize>,
    pub(crate) dtype: DType,
}

impl Operand {
    pub(crate) fn read(tensor: &Tensor) -> Self {
        let guard = tensor.read_data();
        Operand {
            data: guard.buffer.to_f64_vec(),
            shape: guard.shape.clone(),
            dtype: guard.dtype(),
        }
    }
}

pub(crate) fn check_same_dtype(a: DType, b: DType, operation: &str) -> Result<(), DygraphError> {
    if a != b {
        return Err(DygraphError::DataTypeMismatch {
            expected: a,
            actual: b,
            operation: operation.to_string(),
        });
    }
    Ok(())
}

/// Applies `f` element-wise; the result has the input's shape and dtype.
pub(crate) fn unary_map<F>(input: &Tensor, f: F) -> Result<Tensor, DygraphError>
where
    F: Fn(f64) -> f64,
{
    let x = Operand::read(input);
    let data = x.data.into_iter().map(f).collect();
    Tensor::from_f64_as(x.dtype, data, x.shape)
}

/// Applies `f` element-wise over the broadcast of `a` and `b`.
pub(crate) fn binary_map<F>(
    a: &Tensor,
    b: &Tensor,
    operation: &str,
    f: F,
) -> Result<Tensor, DygraphError>
where
    F: Fn(f64, f64) -> f64,
{
    let lhs = Operand::read(a);
    let rhs = Operand::read(b);
    check_same_dtype(lhs.dtype, rhs.dtype, operation)?;

    if lhs.shape == rhs.shape {
        let data = lhs.data.iter().zip(&rhs.data).map(|(&x, &y)| f(x, y)).collect();
        return Tensor::from_f64_as(lhs.dtype, data, lhs.shape);
    }

    let output_shape = broadcast_shapes(&lhs.shape, &rhs.shape)?;
    let numel: usize = output_shape.iter().product();
    let lhs_index = BroadcastIndexer::new(&lhs.shape, output_shape.len());
    let rhs_index = BroadcastIndexer::new(&rhs.shape, output_shape.len());
    let data = (0..numel)
        .map(|i| {
            let coord = index_to_coord(i, &output_shape);
            f(lhs.data[lhs_index.index(&coord)], rhs.data[rhs_index.index(&coord)])
        })
        .collect();
    Tensor::from_f64_as(lhs.dtype, data, output_shape)
}

/// Numerically stable logistic function.
pub(crate) fn sigmoid<T: Float>(x: T) -> T {
    if x >= T::zero() {
        T::one() / (T::one() + (-x).exp())
    } else {
        let e = x.exp();
        e / (T::one() + e)
    }
}
