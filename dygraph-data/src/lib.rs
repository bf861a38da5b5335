//! Datasets feeding dygraph models.
//!
//! Indexed access only: a [`Dataset`] hands out one item per index. Batching
//! and shuffling belong to the caller.

pub mod datasets;
pub mod error;

pub use datasets::{
    Dataset, Flowers, FlowersConfig, FlowersImage, FlowersIndex, ImageBackend, Mode, VecDataset,
};
pub use error::DataError;
