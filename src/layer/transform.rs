//! Scale + rotate resampling shared by a layer's color raster and its mask.
//!
//! Both channels go through the same filter and the same sampling grid, so a
//! transformed mask stays pixel-aligned with the transformed color data.

use image::{
    GrayImage, ImageBuffer, Luma, Rgba, RgbaImage,
    imageops::{self, FilterType},
};
use rayon::prelude::*;

use crate::foundation::core::{Affine, Point, Vec2};

type PremulImage = ImageBuffer<Rgba<f32>, Vec<f32>>;
type CoverageImage = ImageBuffer<Luma<f32>, Vec<f32>>;

const EPS: f64 = 1e-9;

pub(crate) fn is_identity(scale: f64, rotation_deg: f64) -> bool {
    (scale - 1.0).abs() < EPS && normalized_degrees(rotation_deg) < EPS
}

/// Resample `color` and `mask` by a uniform `scale`, then rotate them by
/// `rotation_deg` (clockwise on screen) about their own center.
///
/// The output is sized to the rotated bounding box. Identity parameters return
/// exact copies.
pub(crate) fn transform_pair(
    color: &RgbaImage,
    mask: &GrayImage,
    scale: f64,
    rotation_deg: f64,
) -> (RgbaImage, GrayImage) {
    if is_identity(scale, rotation_deg) {
        return (color.clone(), mask.clone());
    }

    let mut premul = to_premul(color);
    let mut coverage = to_coverage(mask);

    if (scale - 1.0).abs() >= EPS {
        let w = scaled_extent(color.width(), scale);
        let h = scaled_extent(color.height(), scale);
        premul = imageops::resize(&premul, w, h, FilterType::Triangle);
        coverage = imageops::resize(&coverage, w, h, FilterType::Triangle);
    }

    let theta = normalized_degrees(rotation_deg);
    if theta >= EPS {
        (premul, coverage) = rotate_pair(&premul, &coverage, theta.to_radians());
    }

    (from_premul(&premul), from_coverage(&coverage))
}

pub(crate) fn scaled_extent(extent: u32, scale: f64) -> u32 {
    ((f64::from(extent) * scale).round() as u32).max(1)
}

fn normalized_degrees(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    if 360.0 - r < EPS { 0.0 } else { r }
}

fn rotated_extent(v: f64) -> u32 {
    ((v - 1e-6).ceil() as u32).max(1)
}

fn rotate_pair(
    color: &PremulImage,
    mask: &CoverageImage,
    theta: f64,
) -> (PremulImage, CoverageImage) {
    let (src_w, src_h) = color.dimensions();
    let (sw, sh) = (f64::from(src_w), f64::from(src_h));
    let (sin, cos) = theta.sin_cos();
    let out_w = rotated_extent(sw * cos.abs() + sh * sin.abs());
    let out_h = rotated_extent(sw * sin.abs() + sh * cos.abs());

    let dst_to_src = Affine::translate(Vec2::new(sw / 2.0, sh / 2.0))
        * Affine::rotate(-theta)
        * Affine::translate(Vec2::new(
            -f64::from(out_w) / 2.0,
            -f64::from(out_h) / 2.0,
        ));

    let mut out_color = PremulImage::new(out_w, out_h);
    let mut out_mask = CoverageImage::new(out_w, out_h);
    let color_src: &[f32] = color;
    let mask_src: &[f32] = mask;
    let color_dst: &mut [f32] = &mut out_color;
    let mask_dst: &mut [f32] = &mut out_mask;
    let width = out_w as usize;

    color_dst
        .par_chunks_mut(width * 4)
        .zip(mask_dst.par_chunks_mut(width))
        .enumerate()
        .for_each(|(y, (color_row, mask_row))| {
            for x in 0..width {
                let p = dst_to_src * Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let (sx, sy) = (p.x - 0.5, p.y - 0.5);
                let c = sample_bilinear::<4>(color_src, src_w, src_h, sx, sy);
                color_row[x * 4..x * 4 + 4].copy_from_slice(&c);
                mask_row[x] = sample_bilinear::<1>(mask_src, src_w, src_h, sx, sy)[0];
            }
        });

    (out_color, out_mask)
}

fn sample_bilinear<const N: usize>(data: &[f32], w: u32, h: u32, x: f64, y: f64) -> [f32; N] {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = (x - x0) as f32;
    let fy = (y - y0) as f32;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let fetch = |sx: i64, sy: i64| -> [f32; N] {
        let mut out = [0.0f32; N];
        if sx < 0 || sy < 0 || sx >= i64::from(w) || sy >= i64::from(h) {
            return out;
        }
        let idx = (sy as usize * w as usize + sx as usize) * N;
        out.copy_from_slice(&data[idx..idx + N]);
        out
    };

    let tl = fetch(x0, y0);
    let tr = fetch(x0 + 1, y0);
    let bl = fetch(x0, y0 + 1);
    let br = fetch(x0 + 1, y0 + 1);

    let mut out = [0.0f32; N];
    for c in 0..N {
        let top = tl[c] + (tr[c] - tl[c]) * fx;
        let bot = bl[c] + (br[c] - bl[c]) * fx;
        out[c] = top + (bot - top) * fy;
    }
    out
}

fn to_premul(src: &RgbaImage) -> PremulImage {
    PremulImage::from_fn(src.width(), src.height(), |x, y| {
        let [r, g, b, a] = src.get_pixel(x, y).0;
        let a = f32::from(a) / 255.0;
        Rgba([
            f32::from(r) / 255.0 * a,
            f32::from(g) / 255.0 * a,
            f32::from(b) / 255.0 * a,
            a,
        ])
    })
}

fn from_premul(src: &PremulImage) -> RgbaImage {
    RgbaImage::from_fn(src.width(), src.height(), |x, y| {
        let [r, g, b, a] = src.get_pixel(x, y).0;
        let alpha = quantize(a);
        if alpha == 0 {
            return Rgba([0, 0, 0, 0]);
        }
        Rgba([quantize(r / a), quantize(g / a), quantize(b / a), alpha])
    })
}

fn to_coverage(src: &GrayImage) -> CoverageImage {
    CoverageImage::from_fn(src.width(), src.height(), |x, y| {
        Luma([f32::from(src.get_pixel(x, y).0[0]) / 255.0])
    })
}

fn from_coverage(src: &CoverageImage) -> GrayImage {
    GrayImage::from_fn(src.width(), src.height(), |x, y| {
        Luma([quantize(src.get_pixel(x, y).0[0])])
    })
}

fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
#[path = "../../tests/unit/layer/transform.rs"]
mod tests;
