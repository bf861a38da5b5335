pub mod flowers;
pub mod traits;
pub mod vec_dataset;

pub use flowers::{Flowers, FlowersConfig, FlowersImage, FlowersIndex, ImageBackend, Mode};
pub use traits::Dataset;
pub use vec_dataset::VecDataset;
