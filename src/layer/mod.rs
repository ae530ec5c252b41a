//! Positioned, transformable raster layers.
//!
//! A [`Layer`] keeps its original color raster and influence mask for its whole
//! lifetime; every transform update recomputes the displayed pair from those
//! originals, so repeated edits never compound resampling error.

pub(crate) mod transform;

use std::path::PathBuf;

use image::{GrayImage, RgbaImage};

use crate::foundation::{
    core::{PixelRect, Point, check_opacity},
    error::{DefectPasteError, DefectPasteResult},
};

/// Largest width or height a transformed layer may reach, measured on the
/// diagonal so any rotation stays within it.
pub const MAX_LAYER_EXTENT: u32 = 16_384;

/// Stable identity of a layer within one [`Scene`](crate::Scene).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct LayerId(pub(crate) u64);

impl LayerId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Tag distinguishing the layer variants; serialized as the `type` of
/// region descriptors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Defect,
    SelectedRegion,
    FreehandRegion,
}

impl LayerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Defect => "defect",
            Self::SelectedRegion => "selected_region",
            Self::FreehandRegion => "freehand_region",
        }
    }

    pub fn is_region(self) -> bool {
        !matches!(self, Self::Defect)
    }
}

/// Where a defect layer's pixels came from.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DefectSource {
    /// Defect category, usually the mask's parent directory name.
    pub defect_type: String,
    /// Mask file name, used by the fallback search when `mask_path` is stale.
    pub source: String,
    pub mask_path: Option<PathBuf>,
    pub defect_image_path: Option<PathBuf>,
}

/// Where a region layer's pixels came from on the background.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RegionSource {
    pub kind: RegionKind,
    /// Display label such as `region_0` or `freehand_region_2`.
    pub source: String,
    /// Rectangle on the background the region was cut from.
    pub origin: PixelRect,
    /// Freehand outline in region-local coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freehand_points: Option<Vec<Point>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    SelectedRegion,
    FreehandRegion,
}

impl From<RegionKind> for LayerKind {
    fn from(kind: RegionKind) -> Self {
        match kind {
            RegionKind::SelectedRegion => Self::SelectedRegion,
            RegionKind::FreehandRegion => Self::FreehandRegion,
        }
    }
}

/// Provenance of a layer, one variant per layer kind.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum LayerSource {
    Defect(DefectSource),
    Region(RegionSource),
}

impl LayerSource {
    pub fn kind(&self) -> LayerKind {
        match self {
            Self::Defect(_) => LayerKind::Defect,
            Self::Region(r) => r.kind.into(),
        }
    }

    /// Human-facing type label: the defect category for defects, the region
    /// kind for regions.
    pub fn type_label(&self) -> &str {
        match self {
            Self::Defect(d) => &d.defect_type,
            Self::Region(r) => r.kind_label(),
        }
    }
}

impl RegionSource {
    fn kind_label(&self) -> &'static str {
        LayerKind::from(self.kind).as_str()
    }
}

/// Scale / rotation / opacity applied to a layer.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerTransform {
    pub scale: f64,
    pub rotation_deg: f64,
    pub opacity: f64,
}

impl LayerTransform {
    pub fn with_opacity(opacity: f64) -> Self {
        Self {
            opacity,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> DefectPasteResult<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(DefectPasteError::validation(format!(
                "scale must be finite and > 0, got {}",
                self.scale
            )));
        }
        if !self.rotation_deg.is_finite() {
            return Err(DefectPasteError::validation("rotation must be finite"));
        }
        check_opacity(self.opacity)?;
        Ok(())
    }
}

impl Default for LayerTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation_deg: 0.0,
            opacity: 1.0,
        }
    }
}

/// A positioned raster with a paired influence mask.
#[derive(Clone, Debug)]
pub struct Layer {
    id: LayerId,
    source: LayerSource,
    original_color: RgbaImage,
    original_mask: GrayImage,
    color: RgbaImage,
    mask: GrayImage,
    position: Point,
    transform: LayerTransform,
}

impl Layer {
    pub(crate) fn new(
        id: LayerId,
        source: LayerSource,
        color: RgbaImage,
        mask: GrayImage,
        position: Point,
        opacity: f64,
    ) -> DefectPasteResult<Self> {
        if color.dimensions() != mask.dimensions() {
            return Err(DefectPasteError::validation(format!(
                "layer color {:?} and mask {:?} must have the same size",
                color.dimensions(),
                mask.dimensions()
            )));
        }
        if color.width() == 0 || color.height() == 0 {
            return Err(DefectPasteError::validation("layer raster must be non-empty"));
        }
        if !position.x.is_finite() || !position.y.is_finite() {
            return Err(DefectPasteError::validation("layer position must be finite"));
        }
        let transform = LayerTransform::with_opacity(check_opacity(opacity)?);

        Ok(Self {
            id,
            source,
            color: color.clone(),
            mask: mask.clone(),
            original_color: color,
            original_mask: mask,
            position,
            transform,
        })
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn kind(&self) -> LayerKind {
        self.source.kind()
    }

    pub fn source(&self) -> &LayerSource {
        &self.source
    }

    /// Transformed color raster, as composited.
    pub fn color(&self) -> &RgbaImage {
        &self.color
    }

    /// Transformed influence mask, same size as [`Layer::color`].
    pub fn mask(&self) -> &GrayImage {
        &self.mask
    }

    pub fn original_color(&self) -> &RgbaImage {
        &self.original_color
    }

    pub fn original_mask(&self) -> &GrayImage {
        &self.original_mask
    }

    /// Top-left corner in canvas coordinates.
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn transform(&self) -> LayerTransform {
        self.transform
    }

    pub fn opacity(&self) -> f64 {
        self.transform.opacity
    }

    pub(crate) fn set_position(&mut self, position: Point) -> DefectPasteResult<()> {
        if !position.x.is_finite() || !position.y.is_finite() {
            return Err(DefectPasteError::validation("layer position must be finite"));
        }
        self.position = position;
        Ok(())
    }

    /// Recompute the displayed color and mask from the originals.
    ///
    /// Only the transform fields change; the position is left untouched.
    pub fn update_transform(
        &mut self,
        scale: f64,
        rotation_deg: f64,
        opacity: f64,
    ) -> DefectPasteResult<()> {
        let next = LayerTransform {
            scale,
            rotation_deg,
            opacity,
        };
        next.validate()?;
        let (w, h) = self.original_color.dimensions();
        let diagonal = f64::from(w).hypot(f64::from(h)) * scale;
        if diagonal > f64::from(MAX_LAYER_EXTENT) {
            return Err(DefectPasteError::validation(format!(
                "scale {scale} would grow a {w}x{h} layer past {MAX_LAYER_EXTENT} px"
            )));
        }

        let geometry_changed = next.scale != self.transform.scale
            || next.rotation_deg != self.transform.rotation_deg;
        if geometry_changed {
            let (color, mask) = transform::transform_pair(
                &self.original_color,
                &self.original_mask,
                scale,
                rotation_deg,
            );
            self.color = color;
            self.mask = mask;
        }
        self.transform = next;
        Ok(())
    }

    /// Canvas-space pixel footprint of the transformed raster, before clipping.
    pub fn footprint(&self) -> (i64, i64, u32, u32) {
        let (x, y) = snapped_origin(self.position);
        (x, y, self.color.width(), self.color.height())
    }
}

/// Integer pixel origin a layer is composited at.
pub(crate) fn snapped_origin(position: Point) -> (i64, i64) {
    (position.x.round() as i64, position.y.round() as i64)
}

#[cfg(test)]
#[path = "../../tests/unit/layer/layer.rs"]
mod tests;
