//! Rendering class-id grids to RGB images.

use crate::palette::ClassPalette;
use image::RgbImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("class id {id} outside palette of {num_classes} classes")]
    UnknownClass { id: i64, num_classes: usize },
    #[error("class buffer holds {len} values, expected {expected} for {width}x{height}")]
    BufferSize {
        len: usize,
        expected: usize,
        width: u32,
        height: u32,
    },
}

/// Remap a row-major grid of class ids to an RGB image via the palette.
pub fn mask_to_rgb(
    classes: &[i64],
    width: u32,
    height: u32,
    palette: &ClassPalette,
) -> Result<RgbImage, RenderError> {
    let expected = (width as usize) * (height as usize);
    if classes.len() != expected {
        return Err(RenderError::BufferSize {
            len: classes.len(),
            expected,
            width,
            height,
        });
    }
    let mut img = RgbImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let id = classes[y as usize * width as usize + x as usize];
            let rgb = palette.color(id).ok_or(RenderError::UnknownClass {
                id,
                num_classes: palette.num_classes(),
            })?;
            img.put_pixel(x, y, image::Rgb(rgb));
        }
    }
    Ok(img)
}
