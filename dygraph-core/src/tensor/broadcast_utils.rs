use crate::error::DygraphError;
use crate::ops::reduction::sum_to_op;
use crate::tensor::utils::calculate_strides;
use crate::tensor::Tensor;
use std::cmp::max;

/// Determines the output shape resulting from broadcasting two input shapes.
///
/// Follows NumPy broadcasting rules: shapes are aligned on the right, missing
/// leading dimensions count as 1, and each pair of dimensions must be equal or
/// contain a 1.
pub fn broadcast_shapes(shape_a: &[usize], shape_b: &[usize]) -> Result<Vec<usize>, DygraphError> {
    let rank_a = shape_a.len();
    let rank_b = shape_b.len();
    let max_rank = max(rank_a, rank_b);
    let mut result_shape = vec![0; max_rank];

    for i in 0..max_rank {
        let dim_a = if i < rank_a { shape_a[rank_a - 1 - i] } else { 1 };
        let dim_b = if i < rank_b { shape_b[rank_b - 1 - i] } else { 1 };

        result_shape[max_rank - 1 - i] = if dim_a == dim_b || dim_b == 1 {
            dim_a
        } else if dim_a == 1 {
            dim_b
        } else {
            return Err(DygraphError::BroadcastError {
                shape1: shape_a.to_vec(),
                shape2: shape_b.to_vec(),
            });
        };
    }
    Ok(result_shape)
}

/// True if `from` can be broadcast to exactly `to`.
pub fn can_broadcast_to(from: &[usize], to: &[usize]) -> bool {
    matches!(broadcast_shapes(from, to), Ok(shape) if shape == to)
}

/// Maps coordinates of a broadcast result onto the linear index of an input
/// of shape `input_shape` (aligned on the right, size-1 dims pinned to 0).
pub(crate) struct BroadcastIndexer {
    input_shape: Vec<usize>,
    input_strides: Vec<usize>,
    rank_diff: usize,
}

impl BroadcastIndexer {
    pub(crate) fn new(input_shape: &[usize], output_rank: usize) -> Self {
        BroadcastIndexer {
            input_shape: input_shape.to_vec(),
            input_strides: calculate_strides(input_shape),
            rank_diff: output_rank - input_shape.len(),
        }
    }

    pub(crate) fn index(&self, output_coord: &[usize]) -> usize {
        let mut offset = 0;
        let dims = self.input_shape.iter().zip(&self.input_strides);
        for (dim, (&size, &stride)) in dims.enumerate() {
            if size != 1 {
                offset += output_coord[self.rank_diff + dim] * stride;
            }
        }
        offset
    }
}

impl Tensor {
    /// Reduces the tensor (typically a gradient) to `target_shape` by summing
    /// along broadcast dimensions. Returns `self` when the shape already matches.
    pub fn reduce_to_shape(&self, target_shape: &[usize]) -> Result<Tensor, DygraphError> {
        if self.shape() == target_shape {
            return Ok(self.clone());
        }
        sum_to_op(self, target_shape)
    }
}
