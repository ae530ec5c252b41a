use image::{GrayImage, RgbaImage, imageops};

use crate::foundation::{
    core::PixelRect,
    error::{DefectPasteError, DefectPasteResult},
};

/// Padding kept around the tight mask bounding box.
pub const CROP_MARGIN: u32 = 5;

/// Mask values at or above this are foreground (`> 0.5`).
const FOREGROUND: u8 = 128;

#[derive(Clone, Debug)]
pub struct CropResult {
    pub color: RgbaImage,
    pub mask: GrayImage,
    /// Box the pair was cropped to, in input coordinates. `None` means the mask
    /// had no foreground and the inputs were returned unchanged.
    pub bounds: Option<PixelRect>,
}

/// Tight bounding box of mask pixels above one half.
pub fn content_bounds(mask: &GrayImage) -> Option<PixelRect> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut any = false;

    for (x, y, px) in mask.enumerate_pixels() {
        if px.0[0] < FOREGROUND {
            continue;
        }
        any = true;
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    any.then(|| PixelRect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

/// Crop a co-registered color/mask pair to the mask's content box grown by
/// `margin` on every side (clamped to the raster).
pub fn crop_to_content(
    color: &RgbaImage,
    mask: &GrayImage,
    margin: u32,
) -> DefectPasteResult<CropResult> {
    if color.dimensions() != mask.dimensions() {
        return Err(DefectPasteError::validation(
            "crop_to_content expects color and mask of the same size",
        ));
    }

    let unchanged = || CropResult {
        color: color.clone(),
        mask: mask.clone(),
        bounds: None,
    };

    if mask.pixels().all(|p| p.0[0] == 0) {
        return Ok(unchanged());
    }
    let Some(tight) = content_bounds(mask) else {
        return Ok(unchanged());
    };

    let x0 = tight.x.saturating_sub(margin);
    let y0 = tight.y.saturating_sub(margin);
    let x1 = tight.right().saturating_add(margin).min(mask.width());
    let y1 = tight.bottom().saturating_add(margin).min(mask.height());
    let bounds = PixelRect::new(x0, y0, x1 - x0, y1 - y0);

    Ok(CropResult {
        color: imageops::crop_imm(color, bounds.x, bounds.y, bounds.width, bounds.height)
            .to_image(),
        mask: imageops::crop_imm(mask, bounds.x, bounds.y, bounds.width, bounds.height)
            .to_image(),
        bounds: Some(bounds),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/defect/crop.rs"]
mod tests;
