/// Calculates the contiguous (row-major) strides for a given shape.
///
/// Example:
/// shape = [2, 3] -> strides = [3, 1]
/// shape = [2, 2, 2] -> strides = [4, 2, 1]
pub fn calculate_strides(shape: &[usize]) -> Vec<usize> {
    if shape.is_empty() {
        return vec![];
    }
    let rank = shape.len();
    let mut strides = vec![1; rank];
    for i in (0..rank - 1).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Converts a linear index into multi-dimensional coordinates.
pub fn index_to_coord(index: usize, shape: &[usize]) -> Vec<usize> {
    let mut coord = vec![0; shape.len()];
    let mut remaining = index;
    for dim in (0..shape.len()).rev() {
        let size = shape[dim];
        if size == 0 {
            return vec![0; shape.len()];
        }
        coord[dim] = remaining % size;
        remaining /= size;
    }
    coord
}

#[cfg(test)]
#[path = "utils_test.rs"]
mod tests;
