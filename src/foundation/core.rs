use crate::foundation::error::{DefectPasteError, DefectPasteResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Integer pixel rectangle in background (or raster-local) coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `width`x`height` raster.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn right(self) -> u32 {
        self.x + self.width // exclusive
    }

    pub fn bottom(self) -> u32 {
        self.y + self.height // exclusive
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self::new(x, y, right - x, bottom - y)
    }

    pub fn intersect(self, other: Self) -> Option<Self> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(Self::new(x, y, right - x, bottom - y))
    }

    /// Convert a floating canvas rectangle into pixels, truncating the origin and
    /// extent toward zero, then clipping to `bounds_w`x`bounds_h`.
    pub fn from_canvas_rect(rect: Rect, bounds_w: u32, bounds_h: u32) -> Option<Self> {
        let rect = rect.abs();
        let x0 = rect.x0.trunc();
        let y0 = rect.y0.trunc();
        let x1 = x0 + rect.width().trunc();
        let y1 = y0 + rect.height().trunc();

        let clamp_x = |v: f64| v.clamp(0.0, f64::from(bounds_w)) as u32;
        let clamp_y = |v: f64| v.clamp(0.0, f64::from(bounds_h)) as u32;
        let (cx0, cx1) = (clamp_x(x0), clamp_x(x1));
        let (cy0, cy1) = (clamp_y(y0), clamp_y(y1));
        if cx1 <= cx0 || cy1 <= cy0 {
            return None;
        }
        Some(Self::new(cx0, cy0, cx1 - cx0, cy1 - cy0))
    }
}

/// Straight (non-premultiplied) RGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Validate an opacity scalar, which must be finite and within `[0, 1]`.
pub fn check_opacity(opacity: f64) -> DefectPasteResult<f64> {
    if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
        return Err(DefectPasteError::validation(format!(
            "opacity must be within [0, 1], got {opacity}"
        )));
    }
    Ok(opacity)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
