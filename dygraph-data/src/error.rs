use dygraph_core::DygraphError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or reading a dataset.
#[derive(Error, Debug)]
pub enum DataError {
    #[error(transparent)]
    Core(#[from] DygraphError),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("mode should be 'train', 'valid' or 'test', but got '{0}'")]
    InvalidMode(String),

    #[error("Index {index} out of bounds for dataset of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("No label for sample id {id}")]
    MissingLabel { id: usize },
}
