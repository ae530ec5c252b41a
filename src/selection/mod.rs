//! Cutting regions out of the background with a rectangle or a freehand lasso.

use image::{GrayImage, Luma, Rgba, RgbaImage, imageops};

use crate::{
    foundation::{
        core::{PixelRect, Point, Rect},
        error::{DefectPasteError, DefectPasteResult},
    },
    layer::{RegionKind, RegionSource},
};

/// Selections must be strictly larger than this on both axes.
pub const MIN_SELECTION_EXTENT: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SelectionMode {
    Rectangle,
    Freehand,
}

/// An in-progress drag.
///
/// Rectangle drafts keep the start and the latest point; freehand drafts keep
/// every point in order.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionDraft {
    mode: SelectionMode,
    points: Vec<Point>,
}

impl SelectionDraft {
    pub fn begin(mode: SelectionMode, start: Point) -> Self {
        let points = match mode {
            SelectionMode::Rectangle => vec![start, start],
            SelectionMode::Freehand => vec![start],
        };
        Self { mode, points }
    }

    pub fn update(&mut self, p: Point) {
        match self.mode {
            SelectionMode::Rectangle => self.points[1] = p,
            SelectionMode::Freehand => self.points.push(p),
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Cut the drafted selection out of `background`.
    pub fn extract(
        &self,
        background: &RgbaImage,
        min_extent: u32,
    ) -> DefectPasteResult<RegionCut> {
        match self.mode {
            SelectionMode::Rectangle => {
                let rect = Rect::from_points(self.points[0], self.points[1]);
                extract_rectangle(background, rect, min_extent)
            }
            SelectionMode::Freehand => extract_freehand(background, &self.points, min_extent),
        }
    }
}

/// Pixels and provenance of a cut region.
#[derive(Clone, Debug)]
pub struct RegionCut {
    pub kind: RegionKind,
    pub color: RgbaImage,
    pub mask: GrayImage,
    /// Rectangle on the background the region came from.
    pub origin: PixelRect,
    /// Lasso outline relative to `origin`.
    pub freehand_points: Option<Vec<Point>>,
}

/// Cut an axis-aligned rectangle (canvas coordinates) out of the background.
///
/// The rectangle is clipped to the background first; the mask covers the whole
/// cut.
pub fn extract_rectangle(
    background: &RgbaImage,
    rect: Rect,
    min_extent: u32,
) -> DefectPasteResult<RegionCut> {
    let origin = clip_selection(background, rect, min_extent)?;
    let color = imageops::crop_imm(background, origin.x, origin.y, origin.width, origin.height)
        .to_image();
    let mask = GrayImage::from_pixel(origin.width, origin.height, Luma([255]));
    Ok(RegionCut {
        kind: RegionKind::SelectedRegion,
        color,
        mask,
        origin,
        freehand_points: None,
    })
}

/// Cut the closed polygon through `points` out of the background.
///
/// Pixels inside the polygon's bounding box but outside the polygon are
/// transparent and unmasked.
pub fn extract_freehand(
    background: &RgbaImage,
    points: &[Point],
    min_extent: u32,
) -> DefectPasteResult<RegionCut> {
    if points.len() < 3 {
        return Err(DefectPasteError::selection(format!(
            "freehand selection needs at least 3 points, got {}",
            points.len()
        )));
    }
    if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(DefectPasteError::validation("selection points must be finite"));
    }

    let bounds = points
        .iter()
        .skip(1)
        .fold(Rect::from_points(points[0], points[0]), |r, p| r.union_pt(*p));
    let origin = clip_selection(background, bounds, min_extent)?;

    let (ox, oy) = (f64::from(origin.x), f64::from(origin.y));
    let local: Vec<Point> = points.iter().map(|p| Point::new(p.x - ox, p.y - oy)).collect();
    let (color, mask) = cut_polygon(background, origin, &local);

    Ok(RegionCut {
        kind: RegionKind::FreehandRegion,
        color,
        mask,
        origin,
        freehand_points: Some(local),
    })
}

/// Re-cut a stored region from the current background.
pub fn rebuild_region(
    background: &RgbaImage,
    source: &RegionSource,
) -> DefectPasteResult<RegionCut> {
    let origin = source.origin;
    let full = PixelRect::full(background.width(), background.height());
    if origin.is_empty() || full.intersect(origin) != Some(origin) {
        return Err(DefectPasteError::not_found(format!(
            "region '{}' origin {origin:?} lies outside the {}x{} background",
            source.source,
            background.width(),
            background.height()
        )));
    }

    match source.kind {
        RegionKind::SelectedRegion => {
            let color =
                imageops::crop_imm(background, origin.x, origin.y, origin.width, origin.height)
                    .to_image();
            let mask = GrayImage::from_pixel(origin.width, origin.height, Luma([255]));
            Ok(RegionCut {
                kind: RegionKind::SelectedRegion,
                color,
                mask,
                origin,
                freehand_points: None,
            })
        }
        RegionKind::FreehandRegion => {
            let points = source
                .freehand_points
                .as_deref()
                .filter(|p| p.len() >= 3)
                .ok_or_else(|| {
                    DefectPasteError::selection(format!(
                        "freehand region '{}' has no usable outline",
                        source.source
                    ))
                })?;
            let (color, mask) = cut_polygon(background, origin, points);
            Ok(RegionCut {
                kind: RegionKind::FreehandRegion,
                color,
                mask,
                origin,
                freehand_points: Some(points.to_vec()),
            })
        }
    }
}

/// Even-odd scanline fill of a closed polygon, sampled at pixel centers.
pub fn polygon_mask(width: u32, height: u32, points: &[Point]) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    let n = points.len();
    if n < 3 {
        return mask;
    }

    let mut nodes: Vec<f64> = Vec::with_capacity(n);
    for y in 0..height {
        let yc = f64::from(y) + 0.5;
        nodes.clear();
        for i in 0..n {
            let (a, b) = (points[i], points[(i + 1) % n]);
            if (a.y < yc && b.y >= yc) || (b.y < yc && a.y >= yc) {
                let t = (yc - a.y) / (b.y - a.y);
                nodes.push(a.x + t * (b.x - a.x));
            }
        }
        nodes.sort_by(f64::total_cmp);

        for pair in nodes.chunks_exact(2) {
            let start = (pair[0] - 0.5).ceil().clamp(0.0, f64::from(width)) as u32;
            let end = (pair[1] - 0.5).ceil().clamp(0.0, f64::from(width)) as u32;
            for x in start..end {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }
    mask
}

fn cut_polygon(
    background: &RgbaImage,
    origin: PixelRect,
    local: &[Point],
) -> (RgbaImage, GrayImage) {
    let mask = polygon_mask(origin.width, origin.height, local);
    let color = RgbaImage::from_fn(origin.width, origin.height, |x, y| {
        let m = mask.get_pixel(x, y).0[0];
        if m == 0 {
            return Rgba([0, 0, 0, 0]);
        }
        let [r, g, b, _] = background.get_pixel(origin.x + x, origin.y + y).0;
        Rgba([r, g, b, m])
    });
    (color, mask)
}

fn clip_selection(
    background: &RgbaImage,
    rect: Rect,
    min_extent: u32,
) -> DefectPasteResult<PixelRect> {
    let clipped = PixelRect::from_canvas_rect(rect, background.width(), background.height());
    match clipped {
        Some(r) if r.width > min_extent && r.height > min_extent => Ok(r),
        _ => Err(DefectPasteError::selection(format!(
            "selection must exceed {min_extent}x{min_extent} pixels inside the background"
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/selection/selection.rs"]
mod tests;
