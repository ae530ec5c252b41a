//! Flattening a [`Scene`] into a color image and a label mask.

pub mod blend;

use image::{GrayImage, RgbImage};
use rayon::prelude::*;

use crate::{
    foundation::{
        error::{DefectPasteError, DefectPasteResult},
        math::Fnv1a64,
    },
    layer::Layer,
    scene::Scene,
};

/// Output of [`compose`]: both rasters match the background size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Composite {
    pub color: RgbImage,
    pub mask: GrayImage,
}

impl Composite {
    /// Stable 64-bit digest of both rasters.
    pub fn fingerprint(&self) -> u64 {
        let mut h = Fnv1a64::new_default();
        h.write_u32(self.color.width());
        h.write_u32(self.color.height());
        h.write_bytes(self.color.as_raw());
        h.write_bytes(self.mask.as_raw());
        h.finish()
    }
}

/// Flatten the scene: background, then paint at full opacity, then every
/// defect and region in z-order at its own opacity.
///
/// The mask starts empty and takes the per-pixel maximum of every layer's
/// mask. Parts of layers outside the canvas are dropped.
#[tracing::instrument(skip(scene), fields(layers = scene.defects().len() + scene.regions().len()))]
pub fn compose(scene: &Scene) -> DefectPasteResult<Composite> {
    let background = scene
        .background()
        .ok_or_else(|| DefectPasteError::validation("compose requires a background"))?;
    let (w, h) = background.dimensions();
    let row_rgb = w as usize * 3;

    let mut color: Vec<u8> = background
        .as_raw()
        .chunks_exact(4)
        .flat_map(|p| [p[0], p[1], p[2]])
        .collect();
    let mut mask = vec![0u8; w as usize * h as usize];

    let paint = scene.paint();
    if paint.has_content() {
        let paint_px = paint.raster().as_raw();
        let row_rgba = w as usize * 4;
        color
            .par_chunks_mut(row_rgb)
            .zip(paint_px.par_chunks(row_rgba))
            .for_each(|(dst, src)| blend::over_row(dst, src, 1.0));
    }

    for layer in scene.layers() {
        draw_layer(&mut color, &mut mask, w, h, layer);
    }

    let color = RgbImage::from_raw(w, h, color)
        .ok_or_else(|| DefectPasteError::validation("composite color buffer size mismatch"))?;
    let mask = GrayImage::from_raw(w, h, mask)
        .ok_or_else(|| DefectPasteError::validation("composite mask buffer size mismatch"))?;
    Ok(Composite { color, mask })
}

fn draw_layer(color: &mut [u8], mask: &mut [u8], w: u32, h: u32, layer: &Layer) {
    let (ox, oy, lw, lh) = layer.footprint();
    let x0 = ox.max(0);
    let y0 = oy.max(0);
    let x1 = ox.saturating_add(i64::from(lw)).min(i64::from(w));
    let y1 = oy.saturating_add(i64::from(lh)).min(i64::from(h));
    if x1 <= x0 || y1 <= y0 {
        return;
    }

    let (x0, x1) = (x0 as usize, x1 as usize);
    let (y0, y1) = (y0 as usize, y1 as usize);
    let sx0 = (x0 as i64 - ox) as usize;
    let src_color = layer.color().as_raw();
    let src_mask = layer.mask().as_raw();
    let src_stride = lw as usize;
    let opacity = layer.opacity() as f32;

    color
        .par_chunks_mut(w as usize * 3)
        .zip(mask.par_chunks_mut(w as usize))
        .enumerate()
        .skip(y0)
        .take(y1 - y0)
        .for_each(|(y, (color_row, mask_row))| {
            let sy = (y as i64 - oy) as usize;
            let src_start = sy * src_stride + sx0;
            let n = x1 - x0;
            blend::over_row(
                &mut color_row[x0 * 3..x1 * 3],
                &src_color[src_start * 4..(src_start + n) * 4],
                opacity,
            );
            blend::max_row(&mut mask_row[x0..x1], &src_mask[src_start..src_start + n]);
        });
}

#[cfg(test)]
#[path = "../../tests/unit/compose/compose.rs"]
mod tests;
