//! Command facade over a scene, its augmentation cache and the defect library.
//!
//! The session owns the "current image" context: switching images saves the
//! outgoing image's state and restores the incoming one.

mod opts;

use std::path::Path;

use crate::{
    assets::{
        decode::load_image,
        library::{DefectLibrary, load_defect},
    },
    compose::{Composite, compose},
    export::{BatchExporter, ExportReport, OutputPaths, SaveMetadata, save_outputs},
    foundation::{
        core::Point,
        error::{DefectPasteError, DefectPasteResult},
    },
    layer::LayerId,
    paint::Brush,
    scene::{Scene, SceneEvent},
    selection::SelectionMode,
    state::{AugmentationStateCache, ImageKey, RestoreReport},
};

pub use opts::SessionOpts;

#[derive(Debug)]
pub struct EditorSession {
    opts: SessionOpts,
    scene: Scene,
    cache: AugmentationStateCache,
    library: DefectLibrary,
    current: Option<ImageKey>,
    dirty: bool,
}

impl EditorSession {
    pub fn new(opts: SessionOpts, library: DefectLibrary) -> Self {
        Self {
            scene: Scene::new(&opts),
            opts,
            cache: AugmentationStateCache::new(),
            library,
            current: None,
            dirty: false,
        }
    }

    /// Start from a previously persisted cache.
    pub fn with_cache(mut self, cache: AugmentationStateCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn opts(&self) -> &SessionOpts {
        &self.opts
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn cache(&self) -> &AugmentationStateCache {
        &self.cache
    }

    pub fn library(&self) -> &DefectLibrary {
        &self.library
    }

    pub fn current(&self) -> Option<&ImageKey> {
        self.current.as_ref()
    }

    /// Whether anything changed since the last save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Cache the current image's state, then load `path` and restore whatever
    /// was cached for it.
    #[tracing::instrument(skip(self))]
    pub fn switch_image(&mut self, path: &Path) -> DefectPasteResult<RestoreReport> {
        let background = load_image(path)?;
        self.stash_current();

        let key = ImageKey::from(path);
        self.scene.set_background(background)?;
        let report = self
            .cache
            .restore(&mut self.scene, &key, &self.library, &self.opts)?;
        self.current = Some(key);
        if report.defects + report.regions > 0 || report.paint {
            self.dirty = true;
        }
        tracing::info!(image = %path.display(), restored_defects = report.defects, "image loaded");
        Ok(report)
    }

    /// Place the defect described by a mask file (paired image found in the
    /// library), centered with the default opacity.
    pub fn add_defect_from_mask(&mut self, mask: &Path) -> DefectPasteResult<SceneEvent> {
        let image = self
            .library
            .find_defect_image(mask)
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                DefectPasteError::not_found(format!(
                    "no defect image matches mask '{}'",
                    mask.display()
                ))
            })?;
        self.add_defect_pair(mask, &image, None)
    }

    /// Place a defect from an explicit mask/image pair.
    pub fn add_defect_pair(
        &mut self,
        mask: &Path,
        image: &Path,
        position: Option<Point>,
    ) -> DefectPasteResult<SceneEvent> {
        let cut = load_defect(mask, image, self.opts.mask_threshold, self.opts.crop_margin)?;
        let source = self.library.source_for(mask, image);
        let event = self.scene.add_defect(cut, source, position, None)?;
        self.dirty = true;
        Ok(event)
    }

    pub fn update_transform(
        &mut self,
        id: LayerId,
        scale: f64,
        rotation_deg: f64,
        opacity: f64,
    ) -> DefectPasteResult<SceneEvent> {
        let event = self.scene.update_transform(id, scale, rotation_deg, opacity)?;
        self.dirty = true;
        Ok(event)
    }

    pub fn move_layer(&mut self, id: LayerId, position: Point) -> DefectPasteResult<SceneEvent> {
        let event = self.scene.move_layer(id, position)?;
        self.dirty = true;
        Ok(event)
    }

    pub fn select(&mut self, id: Option<LayerId>) -> DefectPasteResult<()> {
        self.scene.select(id)
    }

    pub fn begin_selection(
        &mut self,
        mode: SelectionMode,
        start: Point,
    ) -> DefectPasteResult<()> {
        self.scene.begin_selection(mode, start)
    }

    pub fn update_selection(&mut self, p: Point) -> DefectPasteResult<()> {
        self.scene.update_selection(p)
    }

    pub fn commit_selection(&mut self) -> DefectPasteResult<SceneEvent> {
        let event = self.scene.commit_selection()?;
        if matches!(event, SceneEvent::Placed { .. }) {
            self.dirty = true;
        }
        Ok(event)
    }

    pub fn cancel_selection(&mut self) -> SceneEvent {
        self.scene.cancel_selection()
    }

    pub fn paint_stroke(
        &mut self,
        from: Point,
        to: Point,
        brush: &Brush,
    ) -> DefectPasteResult<SceneEvent> {
        let event = self.scene.paint_stroke(from, to, brush)?;
        self.dirty = true;
        Ok(event)
    }

    pub fn remove_selected(&mut self) -> Option<SceneEvent> {
        let event = self.scene.remove_selected()?;
        self.dirty = true;
        Some(event)
    }

    pub fn clear_defects(&mut self) -> SceneEvent {
        self.dirty = true;
        self.scene.clear_defects()
    }

    pub fn clear_regions(&mut self) -> SceneEvent {
        self.dirty = true;
        self.scene.clear_regions()
    }

    pub fn clear_paint(&mut self) -> SceneEvent {
        self.dirty = true;
        self.scene.clear_paint()
    }

    pub fn composite(&self) -> DefectPasteResult<Composite> {
        compose(&self.scene)
    }

    /// Save the current composite as `path`, `_mask` and `_metadata` files.
    pub fn save(&mut self, path: &Path) -> DefectPasteResult<OutputPaths> {
        let key = self
            .current
            .clone()
            .ok_or_else(|| DefectPasteError::validation("no target image loaded"))?;
        let composite = self.composite()?;
        let metadata = SaveMetadata::from_scene(&self.scene, &key);
        let paths = save_outputs(path, &composite, &metadata)?;
        self.cache.save(&self.scene, key);
        self.dirty = false;
        Ok(paths)
    }

    /// Batch export every cached image with defects, then return to the
    /// current image. If the current image cannot be reloaded the session is
    /// left with no current image; its cached state is kept.
    pub fn save_all(
        &mut self,
        out_dir: &Path,
        base: Option<&str>,
    ) -> DefectPasteResult<ExportReport> {
        self.stash_current();
        let base = base.unwrap_or(self.opts.export_base_name.as_str()).to_owned();
        let exporter = BatchExporter {
            cache: &self.cache,
            library: &self.library,
            opts: &self.opts,
        };
        let report = exporter.run(&mut self.scene, out_dir, &base, self.current.as_ref())?;
        if report.resume_error.is_some() {
            self.current = None;
        }
        if !report.exported.is_empty() {
            self.dirty = false;
        }
        Ok(report)
    }

    /// Cache the current image and write the whole cache to `dir`.
    pub fn persist(&mut self, dir: &Path) -> DefectPasteResult<()> {
        self.stash_current();
        self.cache.persist(dir)
    }

    fn stash_current(&mut self) {
        if let Some(key) = self.current.clone()
            && self.scene.background().is_some()
        {
            self.cache.save(&self.scene, key);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/session.rs"]
mod tests;
