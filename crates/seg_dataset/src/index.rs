//! Indexing and loading image/mask pairs from the filesystem.
//!
//! Images live in one directory, masks in another; a mask is an 8-bit
//! grayscale PNG named after the image's file stem, each pixel holding the
//! class id for that position.

use crate::types::{DatasetResult, SampleIndex, SegDatasetError, SegSample};
use std::fs;
use std::path::Path;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Pair every image under `images_dir` with its mask under `masks_dir`.
/// Entries are sorted by image path so the index is deterministic.
pub fn index_pairs(images_dir: &Path, masks_dir: &Path) -> DatasetResult<Vec<SampleIndex>> {
    let mut pairs = Vec::new();
    let entries = fs::read_dir(images_dir).map_err(|source| SegDatasetError::Io {
        path: images_dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| SegDatasetError::Io {
            path: images_dir.to_path_buf(),
            source,
        })?;
        let image_path = entry.path();
        let ext = image_path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase());
        if !ext.is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str())) {
            continue;
        }
        let stem = image_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| SegDatasetError::Validation {
                path: image_path.clone(),
                msg: "image filename is not valid UTF-8".to_string(),
            })?;
        let mask_path = masks_dir.join(format!("{stem}.png"));
        if !mask_path.exists() {
            return Err(SegDatasetError::MissingMask { path: image_path });
        }
        pairs.push(SampleIndex {
            image_path,
            mask_path,
        });
    }
    pairs.sort_by(|a, b| a.image_path.cmp(&b.image_path));
    Ok(pairs)
}

/// Decode one image/mask pair. The mask must match the image dimensions and
/// every class id must be below `num_classes`.
pub fn load_sample(idx: &SampleIndex, num_classes: usize) -> DatasetResult<SegSample> {
    let img = image::open(&idx.image_path)
        .map_err(|source| SegDatasetError::Image {
            path: idx.image_path.clone(),
            source,
        })?
        .to_rgb8();
    let (width, height) = img.dimensions();

    let mask = image::open(&idx.mask_path)
        .map_err(|source| SegDatasetError::Image {
            path: idx.mask_path.clone(),
            source,
        })?
        .to_luma8();
    let (mask_w, mask_h) = mask.dimensions();
    if (mask_w, mask_h) != (width, height) {
        return Err(SegDatasetError::Validation {
            path: idx.mask_path.clone(),
            msg: format!("mask is {mask_w}x{mask_h}, image is {width}x{height}"),
        });
    }

    // Normalized pixel data in CHW order.
    let mut image_chw = Vec::with_capacity(3 * (width * height) as usize);
    for c in 0..3 {
        for y in 0..height {
            for x in 0..width {
                image_chw.push(img.get_pixel(x, y)[c] as f32 / 255.0);
            }
        }
    }

    let mut classes = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let v = mask.get_pixel(x, y)[0];
            if v as usize >= num_classes {
                return Err(SegDatasetError::Validation {
                    path: idx.mask_path.clone(),
                    msg: format!("class id {v} at ({x}, {y}) out of range 0..{num_classes}"),
                });
            }
            classes.push(v as i64);
        }
    }

    Ok(SegSample {
        image_chw,
        classes,
        width,
        height,
    })
}
