//! vision_core: class palette and mask rendering shared by eval tooling.

pub mod palette;
pub mod render;

pub use palette::ClassPalette;
pub use render::{mask_to_rgb, RenderError};

pub mod prelude {
    pub use crate::palette::ClassPalette;
    pub use crate::render::{mask_to_rgb, RenderError};
}
