//! The editable scene: one background, one paint layer, and the defect and
//! region stacks drawn above it.
//!
//! Z-order is fixed: background, paint, defects in insertion order, then
//! regions in insertion order. No command reorders layers.

mod event;

use image::RgbaImage;

use crate::{
    assets::decode::decode_image,
    defect::DefectCut,
    foundation::{
        core::Point,
        error::{DefectPasteError, DefectPasteResult},
    },
    layer::{DefectSource, Layer, LayerId, LayerKind, LayerSource, RegionKind, RegionSource},
    paint::{Brush, PaintLayer},
    selection::{RegionCut, SelectionDraft, SelectionMode},
    session::SessionOpts,
};

pub use event::{ClearTarget, SceneEvent};

#[derive(Clone, Copy, Debug)]
struct PlacementDefaults {
    defect_opacity: f64,
    region_opacity: f64,
    min_selection_extent: u32,
}

impl From<&SessionOpts> for PlacementDefaults {
    fn from(opts: &SessionOpts) -> Self {
        Self {
            defect_opacity: opts.defect_opacity,
            region_opacity: opts.region_opacity,
            min_selection_extent: opts.min_selection_extent,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Scene {
    background: Option<RgbaImage>,
    paint: PaintLayer,
    defects: Vec<Layer>,
    regions: Vec<Layer>,
    selected: Option<LayerId>,
    draft: Option<SelectionDraft>,
    next_id: u64,
    defaults: PlacementDefaults,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(&SessionOpts::default())
    }
}

impl Scene {
    pub fn new(opts: &SessionOpts) -> Self {
        Self {
            background: None,
            paint: PaintLayer::new(0, 0),
            defects: Vec::new(),
            regions: Vec::new(),
            selected: None,
            draft: None,
            next_id: 0,
            defaults: opts.into(),
        }
    }

    /// Install a new background. All layers, the paint raster, the selection
    /// and any selection drag are discarded.
    pub fn set_background(&mut self, background: RgbaImage) -> DefectPasteResult<()> {
        let (w, h) = background.dimensions();
        if w == 0 || h == 0 {
            return Err(DefectPasteError::validation("background must be non-empty"));
        }
        self.paint = PaintLayer::new(w, h);
        self.defects.clear();
        self.regions.clear();
        self.selected = None;
        self.draft = None;
        self.background = Some(background);
        tracing::debug!(width = w, height = h, "background set");
        Ok(())
    }

    /// Decode `bytes` and install the result as the background.
    pub fn set_background_bytes(&mut self, bytes: &[u8]) -> DefectPasteResult<()> {
        self.set_background(decode_image(bytes)?)
    }

    pub fn background(&self) -> Option<&RgbaImage> {
        self.background.as_ref()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.background.as_ref().map(RgbaImage::dimensions)
    }

    pub(crate) fn require_background(&self) -> DefectPasteResult<&RgbaImage> {
        self.background
            .as_ref()
            .ok_or_else(|| DefectPasteError::validation("scene has no background"))
    }

    pub fn paint(&self) -> &PaintLayer {
        &self.paint
    }

    pub fn defects(&self) -> &[Layer] {
        &self.defects
    }

    pub fn regions(&self) -> &[Layer] {
        &self.regions
    }

    /// Defects then regions, bottom to top.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.defects.iter().chain(self.regions.iter())
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers().find(|l| l.id() == id)
    }

    pub fn selected(&self) -> Option<LayerId> {
        self.selected
    }

    pub fn selection_draft(&self) -> Option<&SelectionDraft> {
        self.draft.as_ref()
    }

    /// Place a defect cut-out. Without a position it is centered on the
    /// background; without an opacity the session default is used. The new
    /// layer becomes the selection.
    pub fn add_defect(
        &mut self,
        cut: DefectCut,
        source: DefectSource,
        position: Option<Point>,
        opacity: Option<f64>,
    ) -> DefectPasteResult<SceneEvent> {
        let (w, h) = self.require_background()?.dimensions();
        let position =
            position.unwrap_or_else(|| centered(w, h, cut.color.width(), cut.color.height()));
        let opacity = opacity.unwrap_or(self.defaults.defect_opacity);

        let layer = Layer::new(
            self.alloc_id(),
            LayerSource::Defect(source),
            cut.color,
            cut.mask,
            position,
            opacity,
        )?;
        Ok(self.push(layer))
    }

    /// Place a region cut from the background, centered, labelled after the
    /// current region count.
    pub fn add_region(
        &mut self,
        cut: RegionCut,
        opacity: Option<f64>,
    ) -> DefectPasteResult<SceneEvent> {
        let (w, h) = self.require_background()?.dimensions();
        let n = self.regions.len();
        let source = RegionSource {
            kind: cut.kind,
            source: match cut.kind {
                RegionKind::SelectedRegion => format!("region_{n}"),
                RegionKind::FreehandRegion => format!("freehand_region_{n}"),
            },
            origin: cut.origin,
            freehand_points: cut.freehand_points,
        };
        let position = centered(w, h, cut.color.width(), cut.color.height());
        let opacity = opacity.unwrap_or(self.defaults.region_opacity);
        self.push_region(source, cut.color, cut.mask, position, opacity)
    }

    /// Place a region with explicit provenance and position.
    pub(crate) fn push_region(
        &mut self,
        source: RegionSource,
        color: RgbaImage,
        mask: image::GrayImage,
        position: Point,
        opacity: f64,
    ) -> DefectPasteResult<SceneEvent> {
        self.require_background()?;
        let layer = Layer::new(
            self.alloc_id(),
            LayerSource::Region(source),
            color,
            mask,
            position,
            opacity,
        )?;
        Ok(self.push(layer))
    }

    #[tracing::instrument(skip(self))]
    pub fn update_transform(
        &mut self,
        id: LayerId,
        scale: f64,
        rotation_deg: f64,
        opacity: f64,
    ) -> DefectPasteResult<SceneEvent> {
        let layer = self.layer_mut(id)?;
        layer.update_transform(scale, rotation_deg, opacity)?;
        Ok(SceneEvent::Transformed {
            id,
            kind: layer.kind(),
            transform: layer.transform(),
        })
    }

    /// Drag a layer so its top-left corner sits at `position`.
    pub fn move_layer(&mut self, id: LayerId, position: Point) -> DefectPasteResult<SceneEvent> {
        let layer = self.layer_mut(id)?;
        layer.set_position(position)?;
        let event = SceneEvent::Moved {
            id,
            kind: layer.kind(),
            position,
        };
        tracing::debug!(status = %event.status_line());
        Ok(event)
    }

    /// Highlight a layer, or clear the highlight with `None`.
    pub fn select(&mut self, id: Option<LayerId>) -> DefectPasteResult<()> {
        if let Some(id) = id
            && self.layer(id).is_none()
        {
            return Err(DefectPasteError::not_found(format!("layer {}", id.as_u64())));
        }
        self.selected = id;
        Ok(())
    }

    /// Remove the highlighted layer. Returns `None` when nothing is selected.
    pub fn remove_selected(&mut self) -> Option<SceneEvent> {
        let id = self.selected.take()?;
        let removed =
            take_layer(&mut self.defects, id).or_else(|| take_layer(&mut self.regions, id))?;
        let event = SceneEvent::Removed {
            id,
            kind: removed.kind(),
        };
        tracing::debug!(status = %event.status_line());
        Some(event)
    }

    /// Drop a layer without reporting it, e.g. one that failed to restore.
    pub(crate) fn discard_layer(&mut self, id: LayerId) {
        if take_layer(&mut self.defects, id)
            .or_else(|| take_layer(&mut self.regions, id))
            .is_some()
        {
            self.drop_dangling_selection();
        }
    }

    pub fn clear_defects(&mut self) -> SceneEvent {
        self.defects.clear();
        self.drop_dangling_selection();
        SceneEvent::Cleared {
            what: ClearTarget::Defects,
        }
    }

    pub fn clear_regions(&mut self) -> SceneEvent {
        self.regions.clear();
        self.drop_dangling_selection();
        SceneEvent::Cleared {
            what: ClearTarget::Regions,
        }
    }

    pub fn clear_paint(&mut self) -> SceneEvent {
        self.paint.clear();
        SceneEvent::Cleared {
            what: ClearTarget::Paint,
        }
    }

    /// Drop every layer and the paint raster, keeping the background.
    pub(crate) fn clear_content(&mut self) {
        self.clear_defects();
        self.clear_regions();
        self.clear_paint();
        self.draft = None;
    }

    pub(crate) fn paint_mut(&mut self) -> &mut PaintLayer {
        &mut self.paint
    }

    pub fn paint_stroke(
        &mut self,
        from: Point,
        to: Point,
        brush: &Brush,
    ) -> DefectPasteResult<SceneEvent> {
        self.require_background()?;
        let area = self.paint.stroke(from, to, brush)?;
        Ok(SceneEvent::Painted { area })
    }

    pub fn begin_selection(
        &mut self,
        mode: SelectionMode,
        start: Point,
    ) -> DefectPasteResult<()> {
        self.require_background()?;
        self.draft = Some(SelectionDraft::begin(mode, start));
        Ok(())
    }

    pub fn update_selection(&mut self, p: Point) -> DefectPasteResult<()> {
        let draft = self
            .draft
            .as_mut()
            .ok_or_else(|| DefectPasteError::validation("no selection in progress"))?;
        draft.update(p);
        Ok(())
    }

    /// Finish the drag. A degenerate selection yields
    /// `Selection { has_selection: false }` instead of an error; a valid one
    /// places a region and reports it.
    pub fn commit_selection(&mut self) -> DefectPasteResult<SceneEvent> {
        let Some(draft) = self.draft.take() else {
            return Ok(SceneEvent::Selection {
                has_selection: false,
            });
        };
        let background = self.require_background()?;
        match draft.extract(background, self.defaults.min_selection_extent) {
            Ok(cut) => self.add_region(cut, None),
            Err(DefectPasteError::Selection(reason)) => {
                tracing::debug!(%reason, "selection discarded");
                Ok(SceneEvent::Selection {
                    has_selection: false,
                })
            }
            Err(err) => Err(err),
        }
    }

    pub fn cancel_selection(&mut self) -> SceneEvent {
        self.draft = None;
        SceneEvent::Selection {
            has_selection: false,
        }
    }

    fn alloc_id(&mut self) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        id
    }

    fn push(&mut self, layer: Layer) -> SceneEvent {
        let event = SceneEvent::Placed {
            id: layer.id(),
            kind: layer.kind(),
            position: layer.position(),
        };
        self.selected = Some(layer.id());
        match layer.kind() {
            LayerKind::Defect => self.defects.push(layer),
            LayerKind::SelectedRegion | LayerKind::FreehandRegion => self.regions.push(layer),
        }
        tracing::debug!(status = %event.status_line());
        event
    }

    fn layer_mut(&mut self, id: LayerId) -> DefectPasteResult<&mut Layer> {
        self.defects
            .iter_mut()
            .chain(self.regions.iter_mut())
            .find(|l| l.id() == id)
            .ok_or_else(|| DefectPasteError::not_found(format!("layer {}", id.as_u64())))
    }

    fn drop_dangling_selection(&mut self) {
        if let Some(id) = self.selected
            && self.layer(id).is_none()
        {
            self.selected = None;
        }
    }
}

/// Top-left position that centers a `w`x`h` raster on the background.
pub(crate) fn centered(bg_w: u32, bg_h: u32, w: u32, h: u32) -> Point {
    Point::new(
        f64::from(bg_w) / 2.0 - f64::from(w) / 2.0,
        f64::from(bg_h) / 2.0 - f64::from(h) / 2.0,
    )
}

fn take_layer(layers: &mut Vec<Layer>, id: LayerId) -> Option<Layer> {
    let idx = layers.iter().position(|l| l.id() == id)?;
    Some(layers.remove(idx))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/scene.rs"]
mod tests;
