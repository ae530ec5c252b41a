//! Full-canvas freehand paint raster.

use image::RgbaImage;
use rayon::prelude::*;

use crate::foundation::{
    core::{PixelRect, Point, Rect, Rgb8, check_opacity},
    error::{DefectPasteError, DefectPasteResult},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BrushMode {
    #[default]
    Paint,
    Erase,
}

/// Stroke settings, passed with every paint command.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Brush {
    pub mode: BrushMode,
    /// Diameter in pixels.
    pub size: f64,
    pub opacity: f64,
    pub color: Rgb8,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            mode: BrushMode::Paint,
            size: 10.0,
            opacity: 1.0,
            color: Rgb8::BLACK,
        }
    }
}

impl Brush {
    pub fn validate(&self) -> DefectPasteResult<()> {
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(DefectPasteError::validation(format!(
                "brush size must be finite and > 0, got {}",
                self.size
            )));
        }
        check_opacity(self.opacity)?;
        Ok(())
    }
}

/// Transparent RGBA raster sized to the background, accumulating strokes.
///
/// The layer remembers the union of every rectangle painted into since the
/// last clear, so the content check only scans that area.
#[derive(Clone, Debug)]
pub struct PaintLayer {
    raster: RgbaImage,
    bounds: Option<PixelRect>,
}

impl PaintLayer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            raster: RgbaImage::new(width, height),
            bounds: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    /// Straight-alpha RGBA pixels.
    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    /// Area that may hold painted pixels.
    pub fn bounds(&self) -> Option<PixelRect> {
        self.bounds
    }

    /// Draw a round-capped segment from `from` to `to`.
    ///
    /// Each pixel is blended once with its antialiased coverage, so overlapping
    /// caps inside a single stroke do not darken. Erase clears pixels under the
    /// brush to transparent regardless of the brush opacity. Returns the pixel
    /// rectangle touched, or `None` if the stroke missed the canvas.
    pub fn stroke(
        &mut self,
        from: Point,
        to: Point,
        brush: &Brush,
    ) -> DefectPasteResult<Option<PixelRect>> {
        brush.validate()?;
        for p in [from, to] {
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(DefectPasteError::validation("stroke points must be finite"));
            }
        }

        let radius = brush.size / 2.0;
        let reach = radius + 1.0;
        let area = Rect::new(
            from.x.min(to.x) - reach,
            from.y.min(to.y) - reach,
            from.x.max(to.x) + reach,
            from.y.max(to.y) + reach,
        );
        let Some(touched) = clip_to_raster(area, self.width(), self.height()) else {
            return Ok(None);
        };

        let width = self.width() as usize;
        let seg = Segment::new(from, to);
        let mode = brush.mode;
        let opacity = brush.opacity as f32;
        let [cr, cg, cb] = brush.color.channels();
        let color = [f32::from(cr), f32::from(cg), f32::from(cb)];

        self.raster
            .par_chunks_mut(width * 4)
            .enumerate()
            .skip(touched.y as usize)
            .take(touched.height as usize)
            .for_each(|(y, row)| {
                let cy = y as f64 + 0.5;
                for x in touched.x..touched.right() {
                    let cx = f64::from(x) + 0.5;
                    let coverage = (radius + 0.5 - seg.distance(cx, cy)).clamp(0.0, 1.0) as f32;
                    if coverage <= 0.0 {
                        continue;
                    }
                    let i = x as usize * 4;
                    let px = &mut row[i..i + 4];
                    match mode {
                        BrushMode::Paint => blend_paint(px, color, coverage * opacity),
                        BrushMode::Erase => erase(px, coverage),
                    }
                }
            });

        if mode == BrushMode::Paint {
            self.bounds = Some(match self.bounds {
                Some(b) => b.union(touched),
                None => touched,
            });
        }
        Ok(Some(touched))
    }

    /// Draw a filled circle centered at `at`.
    pub fn stamp(&mut self, at: Point, brush: &Brush) -> DefectPasteResult<Option<PixelRect>> {
        self.stroke(at, at, brush)
    }

    pub fn clear(&mut self) {
        if let Some(b) = self.bounds.take() {
            for y in b.y..b.bottom() {
                for x in b.x..b.right() {
                    self.raster.put_pixel(x, y, image::Rgba([0, 0, 0, 0]));
                }
            }
        }
    }

    /// Whether any pixel has nonzero alpha.
    pub fn has_content(&self) -> bool {
        let Some(b) = self.bounds else {
            return false;
        };
        (b.y..b.bottom()).any(|y| (b.x..b.right()).any(|x| self.raster.get_pixel(x, y).0[3] != 0))
    }

    /// Value copy of the raster, or `None` when nothing is painted.
    pub fn snapshot(&self) -> Option<RgbaImage> {
        self.has_content().then(|| self.raster.clone())
    }

    /// Replace the raster with a previously captured snapshot.
    pub fn install(&mut self, raster: RgbaImage) -> DefectPasteResult<()> {
        if raster.dimensions() != self.raster.dimensions() {
            return Err(DefectPasteError::validation(format!(
                "paint snapshot {:?} does not match canvas {:?}",
                raster.dimensions(),
                self.raster.dimensions()
            )));
        }
        self.bounds = alpha_bounds(&raster);
        self.raster = raster;
        Ok(())
    }
}

struct Segment {
    a: Point,
    d: (f64, f64),
    len_sq: f64,
}

impl Segment {
    fn new(a: Point, b: Point) -> Self {
        let d = (b.x - a.x, b.y - a.y);
        Self {
            a,
            d,
            len_sq: d.0 * d.0 + d.1 * d.1,
        }
    }

    fn distance(&self, x: f64, y: f64) -> f64 {
        let (px, py) = (x - self.a.x, y - self.a.y);
        let t = if self.len_sq > 0.0 {
            ((px * self.d.0 + py * self.d.1) / self.len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (qx, qy) = (px - t * self.d.0, py - t * self.d.1);
        (qx * qx + qy * qy).sqrt()
    }
}

/// Straight-alpha source-over of a solid color with alpha `a`.
fn blend_paint(px: &mut [u8], color: [f32; 3], a: f32) {
    if a <= 0.0 {
        return;
    }
    let da = f32::from(px[3]) / 255.0;
    let out_a = a + da * (1.0 - a);
    for c in 0..3 {
        let v = (color[c] * a + f32::from(px[c]) * da * (1.0 - a)) / out_a;
        px[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    px[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

fn erase(px: &mut [u8], coverage: f32) {
    if coverage >= 1.0 {
        px.copy_from_slice(&[0, 0, 0, 0]);
        return;
    }
    let keep = 1.0 - coverage;
    px[3] = (f32::from(px[3]) * keep).round() as u8;
    if px[3] == 0 {
        px.copy_from_slice(&[0, 0, 0, 0]);
    }
}

fn clip_to_raster(
    area: Rect,
    width: u32,
    height: u32,
) -> Option<PixelRect> {
    let x0 = area.x0.floor().clamp(0.0, f64::from(width)) as u32;
    let y0 = area.y0.floor().clamp(0.0, f64::from(height)) as u32;
    let x1 = area.x1.ceil().clamp(0.0, f64::from(width)) as u32;
    let y1 = area.y1.ceil().clamp(0.0, f64::from(height)) as u32;
    (x1 > x0 && y1 > y0).then(|| PixelRect::new(x0, y0, x1 - x0, y1 - y0))
}

fn alpha_bounds(raster: &RgbaImage) -> Option<PixelRect> {
    let mut out: Option<PixelRect> = None;
    for (x, y, px) in raster.enumerate_pixels() {
        if px.0[3] == 0 {
            continue;
        }
        let p = PixelRect::new(x, y, 1, 1);
        out = Some(out.map_or(p, |b| b.union(p)));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/paint/paint.rs"]
mod tests;
