use crate::autograd::{needs_record, record_operation, BackwardOp, Gradient};
use crate::error::DygraphError;
use crate::ops::utils::{check_same_dtype, Operand};
use crate::tensor::Tensor;

/// Backward of `split`: the pieces' gradients are joined back together.
///
/// This is the multi-output case of the record protocol; the engine hands over
/// zeros for pieces that received no gradient.
#[derive(Debug)]
struct SplitBackward;

impl BackwardOp for SplitBackward {
    fn backward(&self, grad_outputs: &[Tensor]) -> Result<Vec<Gradient>, DygraphError> {
        Ok(vec![concat_op(grad_outputs)?.into()])
    }
}

#[derive(Debug)]
struct ConcatBackward {
    sizes: Vec<usize>,
}

impl BackwardOp for ConcatBackward {
    fn backward(&self, grad_outputs: &[Tensor]) -> Result<Vec<Gradient>, DygraphError> {
        Ok(split_op(&grad_outputs[0], &self.sizes)?
            .into_iter()
            .map(Gradient::from)
            .collect())
    }
}

/// Splits `input` along dimension 0 into pieces of the given sizes.
///
/// # Errors
/// `InvalidArgument` for 0-dimensional input, empty `sizes`, or sizes that do
/// not add up to the length of dimension 0.
pub fn split_op(input: &Tensor, sizes: &[usize]) -> Result<Vec<Tensor>, DygraphError> {
    let x = Operand::read(input);
    if x.shape.is_empty() {
        return Err(DygraphError::InvalidArgument(
            "split requires a tensor with at least one dimension".to_string(),
        ));
    }
    if sizes.is_empty() || sizes.iter().sum::<usize>() != x.shape[0] {
        return Err(DygraphError::InvalidArgument(format!(
            "split sizes {:?} do not cover dimension 0 of shape {:?}",
            sizes, x.shape
        )));
    }
    let inner: usize = x.shape[1..].iter().product();
    let mut outputs = Vec::with_capacity(sizes.len());
    let mut start = 0;
    for &size in sizes {
        let mut shape = x.shape.clone();
        shape[0] = size;
        let end = start + size * inner;
        outputs.push(Tensor::from_f64_as(x.dtype, x.data[start..end].to_vec(), shape)?);
        start = end;
    }
    if needs_record(&[input]) {
        let output_refs: Vec<&Tensor> = outputs.iter().collect();
        record_operation("split", &[input], &output_refs, SplitBackward);
    }
    Ok(outputs)
}

/// Concatenates tensors along dimension 0.
///
/// # Errors
/// `InvalidArgument` for an empty list or 0-dimensional tensors,
/// `ShapeMismatch` if trailing dimensions differ, `DataTypeMismatch` for mixed dtypes.
pub fn concat_op(inputs: &[Tensor]) -> Result<Tensor, DygraphError> {
    let first = inputs.first().ok_or_else(|| {
        DygraphError::InvalidArgument("concat requires at least one tensor".to_string())
    })?;
    let head = Operand::read(first);
    if head.shape.is_empty() {
        return Err(DygraphError::InvalidArgument(
            "concat requires tensors with at least one dimension".to_string(),
        ));
    }

    let mut data = head.data;
    let mut sizes = vec![head.shape[0]];
    for tensor in &inputs[1..] {
        let x = Operand::read(tensor);
        check_same_dtype(head.dtype, x.dtype, "concat")?;
        if x.shape.is_empty() || x.shape[1..] != head.shape[1..] {
            return Err(DygraphError::ShapeMismatch {
                expected: head.shape.clone(),
                actual: x.shape,
                operation: "concat".to_string(),
            });
        }
        sizes.push(x.shape[0]);
        data.extend(x.data);
    }
    let mut shape = head.shape.clone();
    shape[0] = sizes.iter().sum();
    let output = Tensor::from_f64_as(head.dtype, data, shape)?;

    let input_refs: Vec<&Tensor> = inputs.iter().collect();
    if needs_record(&input_refs) {
        record_operation("concat", &input_refs, &[&output], ConcatBackward { sizes });
    }
    Ok(output)
}

#[cfg(test)]
#[path = "split_test.rs"]
mod tests;
