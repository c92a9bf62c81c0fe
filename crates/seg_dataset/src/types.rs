//! Core types and error definitions for seg_dataset.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, SegDatasetError>;

#[derive(Debug, Error)]
pub enum SegDatasetError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image decode error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("mask validation failed at {path}: {msg}")]
    Validation { path: PathBuf, msg: String },
    #[error("mask file missing for image {path}")]
    MissingMask { path: PathBuf },
    #[error("{0}")]
    Other(String),
}

/// One decoded image/mask pair.
#[derive(Debug, Clone)]
pub struct SegSample {
    /// Image in CHW layout, normalized to [0, 1].
    pub image_chw: Vec<f32>,
    /// Per-pixel class ids, row-major.
    pub classes: Vec<i64>,
    pub width: u32,
    pub height: u32,
}

/// Paths of an image and its paired mask on disk.
#[derive(Debug, Clone)]
pub struct SampleIndex {
    pub image_path: PathBuf,
    pub mask_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SegDatasetConfig {
    pub shuffle: bool,
    pub seed: Option<u64>,
    /// Drop a trailing batch smaller than the requested batch size.
    pub drop_last: bool,
    /// Mask pixel values must be < num_classes; larger values are rejected
    /// at load time rather than surfacing later as a palette fault.
    pub num_classes: usize,
}

impl Default for SegDatasetConfig {
    fn default() -> Self {
        Self {
            shuffle: true,
            seed: None,
            drop_last: false,
            num_classes: 51,
        }
    }
}
