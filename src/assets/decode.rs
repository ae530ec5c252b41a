use std::path::Path;

use anyhow::Context;
use image::{GrayImage, RgbImage, RgbaImage};

use crate::foundation::error::{DefectPasteError, DefectPasteResult};

/// Decode an encoded image into opaque RGBA8.
///
/// Any alpha channel in the source is discarded: targets and defect sources are
/// treated as photographs.
pub fn decode_image(bytes: &[u8]) -> DefectPasteResult<RgbaImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgb = dyn_img.to_rgb8();
    Ok(opaque_rgba(&rgb))
}

/// Decode an encoded mask and binarize it: luma `>= threshold` becomes 255, the rest 0.
pub fn decode_mask(bytes: &[u8], threshold: u8) -> DefectPasteResult<GrayImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode mask from memory")?;
    let mut luma = dyn_img.to_luma8();
    binarize_in_place(&mut luma, threshold);
    Ok(luma)
}

/// Read and decode an image file, see [`decode_image`].
pub fn load_image(path: &Path) -> DefectPasteResult<RgbaImage> {
    let bytes = read_bytes(path)?;
    decode_image(&bytes)
        .with_context(|| format!("decode image '{}'", path.display()))
        .map_err(DefectPasteError::from)
}

/// Read and decode a mask file, see [`decode_mask`].
pub fn load_mask(path: &Path, threshold: u8) -> DefectPasteResult<GrayImage> {
    let bytes = read_bytes(path)?;
    decode_mask(&bytes, threshold)
        .with_context(|| format!("decode mask '{}'", path.display()))
        .map_err(DefectPasteError::from)
}

/// Read an RGBA image keeping its alpha channel, as used for paint snapshots.
pub fn load_rgba(path: &Path) -> DefectPasteResult<RgbaImage> {
    let bytes = read_bytes(path)?;
    let dyn_img = image::load_from_memory(&bytes)
        .with_context(|| format!("decode rgba image '{}'", path.display()))?;
    Ok(dyn_img.to_rgba8())
}

pub fn write_png_rgb(path: &Path, img: &RgbImage) -> DefectPasteResult<()> {
    write_png(path, img.as_raw(), img.width(), img.height(), image::ColorType::Rgb8)
}

pub fn write_png_gray(path: &Path, img: &GrayImage) -> DefectPasteResult<()> {
    write_png(path, img.as_raw(), img.width(), img.height(), image::ColorType::L8)
}

pub fn write_png_rgba(path: &Path, img: &RgbaImage) -> DefectPasteResult<()> {
    write_png(path, img.as_raw(), img.width(), img.height(), image::ColorType::Rgba8)
}

pub(crate) fn binarize_in_place(mask: &mut GrayImage, threshold: u8) {
    for px in mask.pixels_mut() {
        px.0[0] = if px.0[0] >= threshold { 255 } else { 0 };
    }
}

pub(crate) fn opaque_rgba(rgb: &RgbImage) -> RgbaImage {
    RgbaImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        image::Rgba([r, g, b, 255])
    })
}

fn read_bytes(path: &Path) -> DefectPasteResult<Vec<u8>> {
    if !path.exists() {
        return Err(DefectPasteError::not_found(format!(
            "'{}' does not exist",
            path.display()
        )));
    }
    std::fs::read(path)
        .with_context(|| format!("read bytes from '{}'", path.display()))
        .map_err(DefectPasteError::from)
}

fn write_png(
    path: &Path,
    data: &[u8],
    width: u32,
    height: u32,
    color: image::ColorType,
) -> DefectPasteResult<()> {
    image::save_buffer_with_format(path, data, width, height, color, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", path.display()))
        .map_err(DefectPasteError::from)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
