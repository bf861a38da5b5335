//! Reader for the Oxford 102 Flowers image-classification set.
//!
//! Works on an already extracted archive: `<data_dir>/jpg/image_00001.jpg`, ...
//! The label table and the split partition come from the caller as a
//! [`FlowersIndex`]; fetching and unpacking the archive is out of scope.

use super::traits::Dataset;
use crate::error::DataError;
use dygraph_core::Tensor;
use image::DynamicImage;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Which split to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Train,
    Valid,
    Test,
}

impl FromStr for Mode {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "train" => Ok(Mode::Train),
            "valid" => Ok(Mode::Valid),
            "test" => Ok(Mode::Test),
            _ => Err(DataError::InvalidMode(s.to_string())),
        }
    }
}

/// Representation of the returned images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageBackend {
    /// Decoded `image::DynamicImage`.
    #[default]
    Image,
    /// `[height, width, 3]` f32 tensor of RGB values in `0..=255`.
    Array,
}

#[derive(Debug, Clone)]
pub enum FlowersImage {
    Image(DynamicImage),
    Array(Tensor),
}

impl FlowersImage {
    pub fn as_image(&self) -> Option<&DynamicImage> {
        match self {
            FlowersImage::Image(image) => Some(image),
            FlowersImage::Array(_) => None,
        }
    }

    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            FlowersImage::Array(tensor) => Some(tensor),
            FlowersImage::Image(_) => None,
        }
    }
}

/// Label table and split partition. Ids are 1-based; `labels[id - 1]` is the
/// class of image `id`.
#[derive(Debug, Clone, Default)]
pub struct FlowersIndex {
    pub labels: Vec<i64>,
    pub trnid: Vec<usize>,
    pub valid: Vec<usize>,
    pub tstid: Vec<usize>,
}

impl FlowersIndex {
    /// Ids of a split. The published partition is used with its roles
    /// swapped: the large `tstid` list trains, `trnid` tests.
    pub fn ids(&self, mode: Mode) -> &[usize] {
        match mode {
            Mode::Train => &self.tstid,
            Mode::Valid => &self.valid,
            Mode::Test => &self.trnid,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FlowersConfig {
    pub data_dir: PathBuf,
    pub mode: Mode,
    pub backend: ImageBackend,
}

impl FlowersConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        FlowersConfig {
            data_dir: data_dir.into(),
            mode: Mode::default(),
            backend: ImageBackend::default(),
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_backend(mut self, backend: ImageBackend) -> Self {
        self.backend = backend;
        self
    }
}

type Transform = Arc<dyn Fn(FlowersImage) -> Result<FlowersImage, DataError> + Send + Sync>;

/// One split of the Flowers set. Images are decoded on each `get`.
#[derive(Clone)]
pub struct Flowers {
    config: FlowersConfig,
    labels: Vec<i64>,
    ids: Vec<usize>,
    transform: Option<Transform>,
}

impl Flowers {
    /// # Errors
    /// `DataError::Io` if `<data_dir>/jpg` is not a directory.
    pub fn new(config: FlowersConfig, index: FlowersIndex) -> Result<Self, DataError> {
        let image_dir = config.data_dir.join("jpg");
        if !image_dir.is_dir() {
            let source =
                std::io::Error::new(std::io::ErrorKind::NotFound, "image directory not found");
            return Err(DataError::Io {
                path: image_dir,
                source,
            });
        }
        let ids = index.ids(config.mode).to_vec();
        log::debug!(
            "flowers {:?} split: {} samples from {:?}",
            config.mode,
            ids.len(),
            config.data_dir
        );
        Ok(Flowers {
            config,
            labels: index.labels,
            ids,
            transform: None,
        })
    }

    /// Applies `transform` to every image after decoding.
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(FlowersImage) -> Result<FlowersImage, DataError> + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    pub fn image_path(&self, id: usize) -> PathBuf {
        self.config.data_dir.join("jpg").join(format!("image_{:05}.jpg", id))
    }

    fn load(&self, path: &Path) -> Result<FlowersImage, DataError> {
        let image = image::open(path).map_err(|source| match source {
            image::ImageError::IoError(source) => DataError::Io {
                path: path.to_path_buf(),
                source,
            },
            source => DataError::Image {
                path: path.to_path_buf(),
                source,
            },
        })?;
        match self.config.backend {
            ImageBackend::Image => Ok(FlowersImage::Image(image)),
            ImageBackend::Array => {
                let rgb = image.to_rgb8();
                let (width, height) = rgb.dimensions();
                let data: Vec<f32> = rgb.into_raw().into_iter().map(f32::from).collect();
                let tensor = Tensor::new(data, vec![height as usize, width as usize, 3])?;
                Ok(FlowersImage::Array(tensor))
            }
        }
    }
}

impl Dataset for Flowers {
    type Item = (FlowersImage, [i64; 1]);

    fn get(&self, index: usize) -> Result<Self::Item, DataError> {
        let id = *self.ids.get(index).ok_or(DataError::IndexOutOfBounds {
            index,
            len: self.ids.len(),
        })?;
        let label = id
            .checked_sub(1)
            .and_then(|pos| self.labels.get(pos))
            .copied()
            .ok_or(DataError::MissingLabel { id })?;
        let image = self.load(&self.image_path(id))?;
        let image = match &self.transform {
            Some(transform) => transform(image)?,
            None => image,
        };
        Ok((image, [label]))
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

impl fmt::Debug for Flowers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flowers")
            .field("config", &self.config)
            .field("len", &self.ids.len())
            .field("has_transform", &self.transform.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "flowers_test.rs"]
mod tests;
