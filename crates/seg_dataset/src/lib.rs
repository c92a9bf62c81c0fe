//! Dataset loading, splitting, and Burn-compatible batching for the
//! segmentation trainer.
//!
//! This crate provides utilities for:
//! - Pairing image files with their mask files on disk
//! - Train/val splitting with seeded shuffling
//! - Burn-compatible batch iteration over (image, label-grid) pairs

pub mod batch;
pub mod index;
pub mod split;
pub mod types;

pub use batch::{SegBatch, SegBatchIter};
pub use index::{index_pairs, load_sample};
pub use split::split_pairs;
pub use types::{DatasetResult, SampleIndex, SegDatasetConfig, SegDatasetError, SegSample};
