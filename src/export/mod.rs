//! Writing composites to disk: one-off saves and batch export of every cached
//! image with collision-free numbering.

mod metadata;

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    assets::{
        decode::{load_image, write_png_gray, write_png_rgb},
        library::DefectLibrary,
    },
    compose::{Composite, compose},
    foundation::error::{DefectPasteError, DefectPasteResult},
    scene::Scene,
    session::SessionOpts,
    state::{AugmentationStateCache, ImageKey, RestoreReport, SkippedItem},
};

pub use metadata::{DefectMetadata, RegionMetadata, SaveMetadata};

/// The three files written for one composite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    pub color: PathBuf,
    pub mask: PathBuf,
    pub metadata: PathBuf,
}

impl OutputPaths {
    /// `{stem}.png`, `{stem}_mask.png` and `{stem}_metadata.json` in `dir`.
    pub fn for_stem(dir: &Path, stem: &str) -> Self {
        Self {
            color: dir.join(format!("{stem}.png")),
            mask: dir.join(format!("{stem}_mask.png")),
            metadata: dir.join(format!("{stem}_metadata.json")),
        }
    }

    /// Sibling paths for a chosen color image path such as `out/result.png`.
    pub fn from_color_path(path: &Path) -> DefectPasteResult<Self> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                DefectPasteError::validation(format!(
                    "output path '{}' has no file name",
                    path.display()
                ))
            })?;
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(Self::for_stem(dir, &stem))
    }
}

/// Write color, mask and metadata next to `path`.
#[tracing::instrument(skip(composite, metadata))]
pub fn save_outputs(
    path: &Path,
    composite: &Composite,
    metadata: &SaveMetadata,
) -> DefectPasteResult<OutputPaths> {
    let paths = OutputPaths::from_color_path(path)?;
    write_outputs(&paths, composite, metadata)?;
    Ok(paths)
}

fn write_outputs(
    paths: &OutputPaths,
    composite: &Composite,
    metadata: &SaveMetadata,
) -> DefectPasteResult<()> {
    write_png_rgb(&paths.color, &composite.color)?;
    write_png_gray(&paths.mask, &composite.mask)?;
    let json = serde_json::to_vec_pretty(metadata)?;
    std::fs::write(&paths.metadata, json)
        .with_context(|| format!("write metadata '{}'", paths.metadata.display()))?;
    Ok(())
}

/// First free index for `{base}_{n}.png` in `dir`: one past the largest `n`
/// found, or 1 when there is none or the directory cannot be read.
pub fn next_index(dir: &Path, base: &str) -> u64 {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 1;
    };
    let prefix = format!("{base}_");
    let mut max = 0u64;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.to_ascii_lowercase().ends_with(".png") || !name.starts_with(&prefix) {
            continue;
        }
        let stem = &name[..name.len() - 4];
        if let Some(n) = stem.rsplit('_').next().and_then(|s| s.parse::<u64>().ok()) {
            max = max.max(n);
        }
    }
    max + 1
}

/// One exported image.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportedItem {
    pub key: ImageKey,
    pub index: u64,
    pub paths: OutputPaths,
    pub restore: RestoreReport,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExportReport {
    pub exported: Vec<ExportedItem>,
    pub skipped: Vec<SkippedItem>,
    /// Set when the `resume` image could not be reloaded; the scene is then
    /// left empty.
    pub resume_error: Option<String>,
}

/// Drives one scene through every cached image that has defects.
#[derive(Clone, Copy, Debug)]
pub struct BatchExporter<'a> {
    pub cache: &'a AugmentationStateCache,
    pub library: &'a DefectLibrary,
    pub opts: &'a SessionOpts,
}

impl BatchExporter<'_> {
    /// Export every eligible entry, in key order, to `{base}_{n}` files in
    /// `out_dir`, numbering from [`next_index`].
    ///
    /// Entries whose target image is missing or fails to render are skipped
    /// without consuming an index. Afterwards the scene is reloaded with
    /// `resume` (if any) and its cached state. A failed reload is recorded in
    /// [`ExportReport::resume_error`] and resets the scene, so no exported
    /// image's layers remain in it.
    #[tracing::instrument(skip(self, scene))]
    pub fn run(
        &self,
        scene: &mut Scene,
        out_dir: &Path,
        base: &str,
        resume: Option<&ImageKey>,
    ) -> DefectPasteResult<ExportReport> {
        if base.is_empty() || base.contains(['/', '\\']) {
            return Err(DefectPasteError::validation(format!(
                "export base name must be a plain prefix, got '{base}'"
            )));
        }
        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("create output directory '{}'", out_dir.display()))?;

        let mut index = next_index(out_dir, base);
        let mut report = ExportReport::default();

        for (key, state) in self.cache.iter() {
            if !state.has_defects() {
                continue;
            }
            if !key.path().exists() {
                tracing::warn!(image = %key.path().display(), "target image missing, skipping");
                report.skipped.push(SkippedItem {
                    item: key.path().display().to_string(),
                    reason: "target image no longer exists".to_owned(),
                });
                continue;
            }

            let paths = OutputPaths::for_stem(out_dir, &format!("{base}_{index}"));
            match self.export_one(scene, key, &paths) {
                Ok(restore) => {
                    report.exported.push(ExportedItem {
                        key: key.clone(),
                        index,
                        paths,
                        restore,
                    });
                    index += 1;
                }
                Err(err) => {
                    tracing::warn!(image = %key.path().display(), error = %err, "export failed");
                    report.skipped.push(SkippedItem {
                        item: key.path().display().to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        if let Some(key) = resume
            && let Err(err) = self.load(scene, key)
        {
            tracing::warn!(image = %key.path().display(), error = %err, "resume failed");
            *scene = Scene::new(self.opts);
            report.resume_error = Some(err.to_string());
        }

        tracing::info!(
            exported = report.exported.len(),
            skipped = report.skipped.len(),
            dir = %out_dir.display(),
            "batch export finished"
        );
        Ok(report)
    }

    fn export_one(
        &self,
        scene: &mut Scene,
        key: &ImageKey,
        paths: &OutputPaths,
    ) -> DefectPasteResult<RestoreReport> {
        let restore = self.load(scene, key)?;
        let composite = compose(scene)?;
        write_outputs(paths, &composite, &SaveMetadata::from_scene(scene, key))?;
        Ok(restore)
    }

    fn load(&self, scene: &mut Scene, key: &ImageKey) -> DefectPasteResult<RestoreReport> {
        scene.set_background(load_image(key.path())?)?;
        self.cache.restore(scene, key, self.library, self.opts)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/export.rs"]
mod tests;
