//! Per-image augmentation state: compact layer descriptors plus the paint
//! raster, keyed by target image.
//!
//! Defects and regions are stored by provenance and rebuilt on restore; only
//! the paint raster is kept by value.

mod persist;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use image::RgbaImage;

use crate::{
    assets::library::{DefectLibrary, load_defect},
    foundation::{
        core::Point,
        error::{DefectPasteError, DefectPasteResult},
    },
    layer::{DefectSource, LayerKind, LayerSource, LayerTransform, RegionSource},
    scene::{Scene, SceneEvent},
    selection::rebuild_region,
    session::SessionOpts,
};

pub use persist::SESSION_FILE;

/// Identity of a target image: its path.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ImageKey(PathBuf);

impl ImageKey {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// File name shown in metadata and logs.
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl From<&Path> for ImageKey {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DefectDescriptor {
    pub source: DefectSource,
    pub position: Point,
    pub transform: LayerTransform,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RegionDescriptor {
    pub source: RegionSource,
    pub position: Point,
    pub transform: LayerTransform,
}

/// Everything needed to rebuild one image's edits.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AugmentationState {
    pub defects: Vec<DefectDescriptor>,
    pub regions: Vec<RegionDescriptor>,
    /// Present only when the paint layer had visible pixels.
    pub paint: Option<RgbaImage>,
}

impl AugmentationState {
    pub fn capture(scene: &Scene) -> Self {
        let mut state = Self {
            paint: scene.paint().snapshot(),
            ..Self::default()
        };
        for layer in scene.layers() {
            match layer.source() {
                LayerSource::Defect(src) => state.defects.push(DefectDescriptor {
                    source: src.clone(),
                    position: layer.position(),
                    transform: layer.transform(),
                }),
                LayerSource::Region(src) => state.regions.push(RegionDescriptor {
                    source: src.clone(),
                    position: layer.position(),
                    transform: layer.transform(),
                }),
            }
        }
        state
    }

    pub fn has_defects(&self) -> bool {
        !self.defects.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.defects.is_empty() && self.regions.is_empty() && self.paint.is_none()
    }
}

/// A cached item that could not be rebuilt, e.g. `defect scratch_01.png`.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedItem {
    pub item: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RestoreReport {
    pub defects: usize,
    pub regions: usize,
    pub paint: bool,
    pub skipped: Vec<SkippedItem>,
}

/// Augmentation states keyed by image, iterated in key order.
#[derive(Clone, Debug, Default)]
pub struct AugmentationStateCache {
    entries: BTreeMap<ImageKey, AugmentationState>,
}

impl AugmentationStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &ImageKey) -> Option<&AugmentationState> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: ImageKey, state: AugmentationState) {
        self.entries.insert(key, state);
    }

    pub fn remove(&mut self, key: &ImageKey) -> Option<AugmentationState> {
        self.entries.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ImageKey, &AugmentationState)> + '_ {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ImageKey> + '_ {
        self.entries.keys()
    }

    /// Overwrite the entry for `key` with the scene's current contents.
    #[tracing::instrument(skip(self, scene))]
    pub fn save(&mut self, scene: &Scene, key: ImageKey) {
        let state = AugmentationState::capture(scene);
        tracing::debug!(
            defects = state.defects.len(),
            regions = state.regions.len(),
            paint = state.paint.is_some(),
            "cached augmentation state"
        );
        self.entries.insert(key, state);
    }

    /// Clear the scene's layers and paint, then rebuild them from the entry for
    /// `key`.
    ///
    /// The scene must already hold the image's background. Items whose sources
    /// cannot be resolved or rebuilt are skipped and listed in the report.
    #[tracing::instrument(skip(self, scene, library, opts))]
    pub fn restore(
        &self,
        scene: &mut Scene,
        key: &ImageKey,
        library: &DefectLibrary,
        opts: &SessionOpts,
    ) -> DefectPasteResult<RestoreReport> {
        scene.require_background()?;
        scene.clear_content();

        let mut report = RestoreReport::default();
        let Some(state) = self.entries.get(key) else {
            return Ok(report);
        };

        if let Some(paint) = &state.paint {
            match scene.paint_mut().install(paint.clone()) {
                Ok(()) => report.paint = true,
                Err(err) => skip(&mut report, "paint".to_owned(), &err),
            }
        }

        for desc in &state.defects {
            match restore_defect(scene, desc, library, opts) {
                Ok(()) => report.defects += 1,
                Err(err) => skip(&mut report, format!("defect {}", desc.source.source), &err),
            }
        }

        for desc in &state.regions {
            match restore_region(scene, desc) {
                Ok(()) => report.regions += 1,
                Err(err) => {
                    let kind = LayerKind::from(desc.source.kind);
                    skip(&mut report, format!("{} {}", kind.as_str(), desc.source.source), &err);
                }
            }
        }

        scene.select(None)?;
        Ok(report)
    }

    /// Write the cache to `dir` (see [`SESSION_FILE`]).
    pub fn persist(&self, dir: &Path) -> DefectPasteResult<()> {
        persist::write_session(self, dir)
    }

    /// Read a cache written by [`AugmentationStateCache::persist`].
    pub fn load(dir: &Path) -> DefectPasteResult<Self> {
        persist::read_session(dir)
    }
}

fn restore_defect(
    scene: &mut Scene,
    desc: &DefectDescriptor,
    library: &DefectLibrary,
    opts: &SessionOpts,
) -> DefectPasteResult<()> {
    desc.transform.validate()?;
    let (mask, image) = library.resolve(&desc.source)?;
    let cut = load_defect(&mask, &image, opts.mask_threshold, opts.crop_margin)?;
    let source = DefectSource {
        mask_path: Some(mask),
        defect_image_path: Some(image),
        ..desc.source.clone()
    };
    let t = desc.transform;
    let event = scene.add_defect(cut, source, Some(desc.position), Some(t.opacity))?;
    apply_transform(scene, &event, t)
}

fn restore_region(scene: &mut Scene, desc: &RegionDescriptor) -> DefectPasteResult<()> {
    desc.transform.validate()?;
    let background = scene.require_background()?;
    let cut = rebuild_region(background, &desc.source)?;
    let t = desc.transform;
    let event = scene.push_region(
        desc.source.clone(),
        cut.color,
        cut.mask,
        desc.position,
        t.opacity,
    )?;
    apply_transform(scene, &event, t)
}

fn apply_transform(
    scene: &mut Scene,
    event: &SceneEvent,
    t: LayerTransform,
) -> DefectPasteResult<()> {
    let SceneEvent::Placed { id, .. } = event else {
        return Err(DefectPasteError::validation("restored layer was not placed"));
    };
    if let Err(err) = scene.update_transform(*id, t.scale, t.rotation_deg, t.opacity) {
        scene.discard_layer(*id);
        return Err(err);
    }
    Ok(())
}

fn skip(report: &mut RestoreReport, item: String, err: &DefectPasteError) {
    tracing::warn!(%item, error = %err, "skipping cached item");
    report.skipped.push(SkippedItem {
        item,
        reason: err.to_string(),
    });
}

#[cfg(test)]
#[path = "../../tests/unit/state/cache.rs"]
mod tests;
