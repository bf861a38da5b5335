// src/ops/view/mod.rs
//
// Shape-manipulating operations. All of them copy into a new contiguous buffer.

pub mod expand;
pub mod reshape;
pub mod split;

pub use expand::expand_op;
pub use reshape::reshape_op;
pub use split::{concat_op, split_op};
