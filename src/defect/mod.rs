//! Turning a raw defect image + mask pair into a placeable cut-out.

pub(crate) mod crop;

use image::{GrayImage, Rgba, RgbaImage};

use crate::foundation::{
    core::PixelRect,
    error::{DefectPasteError, DefectPasteResult},
};

pub use crop::{CROP_MARGIN, CropResult, content_bounds, crop_to_content};

/// A defect ready to be placed: color with alpha taken from the mask, the mask
/// itself, both cropped to the defect's padded bounding box.
#[derive(Clone, Debug)]
pub struct DefectCut {
    pub color: RgbaImage,
    pub mask: GrayImage,
    /// Crop applied to the source pair; `None` when the mask had no content
    /// and the cut keeps the full source size.
    pub crop: Option<PixelRect>,
}

/// Keep only the masked pixels of `image`, then crop to their bounding box.
///
/// `mask` is expected to be binarized already. Pixels outside the mask become
/// fully transparent black.
pub fn extract_defect(
    image: &RgbaImage,
    mask: &GrayImage,
    margin: u32,
) -> DefectPasteResult<DefectCut> {
    if image.dimensions() != mask.dimensions() {
        return Err(DefectPasteError::validation(format!(
            "defect image {:?} and mask {:?} must have the same size",
            image.dimensions(),
            mask.dimensions()
        )));
    }

    let masked = RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let m = mask.get_pixel(x, y).0[0];
        if m == 0 {
            return Rgba([0, 0, 0, 0]);
        }
        let [r, g, b, _] = image.get_pixel(x, y).0;
        Rgba([r, g, b, m])
    });

    let CropResult {
        color,
        mask,
        bounds,
    } = crop_to_content(&masked, mask, margin)?;

    if bounds.is_none() {
        tracing::debug!("defect mask has no foreground; keeping full size");
    }

    Ok(DefectCut {
        color,
        mask,
        crop: bounds,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/defect/extract.rs"]
mod tests;
