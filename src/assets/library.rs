//! Known defect masks and defect source images, with the lookups used to pair
//! them and to re-resolve stale provenance.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    assets::decode::{load_image, load_mask},
    defect::{DefectCut, extract_defect},
    foundation::error::{DefectPasteError, DefectPasteResult},
    layer::DefectSource,
};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Category used for masks stored directly in the mask root.
pub const DEFAULT_DEFECT_TYPE: &str = "defect";

#[derive(Clone, Debug, Default)]
pub struct DefectLibrary {
    masks_root: Option<PathBuf>,
    masks: Vec<PathBuf>,
    images_root: Option<PathBuf>,
    images: Vec<PathBuf>,
}

impl DefectLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recursively scan both directories for image files.
    pub fn scan(masks_dir: &Path, images_dir: &Path) -> DefectPasteResult<Self> {
        let masks = scan_images(masks_dir)?;
        let images = scan_images(images_dir)?;
        tracing::debug!(
            masks = masks.len(),
            images = images.len(),
            "scanned defect library"
        );
        Ok(Self::new()
            .with_masks(masks_dir, masks)
            .with_images(images_dir, images))
    }

    pub fn with_masks(mut self, root: impl Into<PathBuf>, masks: Vec<PathBuf>) -> Self {
        self.masks_root = Some(root.into());
        self.masks = masks;
        self
    }

    pub fn with_images(mut self, root: impl Into<PathBuf>, images: Vec<PathBuf>) -> Self {
        self.images_root = Some(root.into());
        self.images = images;
        self
    }

    pub fn masks(&self) -> &[PathBuf] {
        &self.masks
    }

    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    /// Category of a mask: its directory relative to the mask root, or
    /// [`DEFAULT_DEFECT_TYPE`] for masks at the root.
    pub fn defect_type(&self, mask: &Path) -> String {
        let Some(parent) = mask.parent() else {
            return DEFAULT_DEFECT_TYPE.to_owned();
        };
        let rel = match &self.masks_root {
            Some(root) => parent.strip_prefix(root).unwrap_or(parent),
            None => Path::new(parent.file_name().unwrap_or_default()),
        };
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if parts.is_empty() {
            DEFAULT_DEFECT_TYPE.to_owned()
        } else {
            parts.join("/")
        }
    }

    /// `(defect_type, mask)` for every known mask, in scan order.
    pub fn entries(&self) -> impl Iterator<Item = (String, &Path)> + '_ {
        self.masks
            .iter()
            .map(|m| (self.defect_type(m), m.as_path()))
    }

    /// First mask whose directory mentions `defect_type` and whose file name
    /// contains `source`.
    pub fn find_mask(&self, defect_type: &str, source: &str) -> Option<&Path> {
        self.masks
            .iter()
            .find(|m| {
                let dir = m
                    .parent()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let name = m
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                dir.contains(defect_type) && name.contains(source)
            })
            .map(PathBuf::as_path)
    }

    /// Defect image paired with `mask`: exact stem match first, then
    /// case-insensitive containment in either direction.
    pub fn find_defect_image(&self, mask: &Path) -> Option<&Path> {
        let mask_stem = file_stem(mask);
        if let Some(exact) = self.images.iter().find(|img| file_stem(img) == mask_stem) {
            return Some(exact);
        }

        let mask_lower = mask_stem.to_lowercase();
        self.images
            .iter()
            .find(|img| {
                let stem = file_stem(img).to_lowercase();
                stem.contains(&mask_lower) || mask_lower.contains(&stem)
            })
            .map(PathBuf::as_path)
    }

    /// Locate the mask and defect image for a stored provenance record.
    ///
    /// Stored paths win when they still exist; otherwise the fallback searches
    /// above are used.
    pub fn resolve(&self, source: &DefectSource) -> DefectPasteResult<(PathBuf, PathBuf)> {
        let mask = match &source.mask_path {
            Some(p) if p.exists() => p.clone(),
            _ => self
                .find_mask(&source.defect_type, &source.source)
                .map(Path::to_path_buf)
                .ok_or_else(|| {
                    DefectPasteError::not_found(format!(
                        "mask for '{}' ({})",
                        source.source, source.defect_type
                    ))
                })?,
        };

        let image = match &source.defect_image_path {
            Some(p) if p.exists() => p.clone(),
            _ => self
                .find_defect_image(&mask)
                .map(Path::to_path_buf)
                .ok_or_else(|| {
                    DefectPasteError::not_found(format!(
                        "defect image for mask '{}'",
                        mask.display()
                    ))
                })?,
        };

        Ok((mask, image))
    }

    /// Provenance record for a mask/image pair from this library.
    pub fn source_for(&self, mask: &Path, image: &Path) -> DefectSource {
        DefectSource {
            defect_type: self.defect_type(mask),
            source: mask
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            mask_path: Some(mask.to_path_buf()),
            defect_image_path: Some(image.to_path_buf()),
        }
    }
}

/// Load a mask (binarized at `threshold`) and its defect image, keep the
/// masked pixels and crop them to the padded content box.
#[tracing::instrument]
pub fn load_defect(
    mask: &Path,
    image: &Path,
    threshold: u8,
    margin: u32,
) -> DefectPasteResult<DefectCut> {
    let mask_px = load_mask(mask, threshold)?;
    let image_px = load_image(image)?;
    extract_defect(&image_px, &mask_px, margin)
}

/// Recursively collect `.png`, `.jpg` and `.jpeg` files below `dir`, sorted.
pub fn scan_images(dir: &Path) -> DefectPasteResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(DefectPasteError::not_found(format!(
            "directory '{}' does not exist",
            dir.display()
        )));
    }
    let mut out = Vec::new();
    walk(dir, &mut out)?;
    out.sort();
    Ok(out)
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> DefectPasteResult<()> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read directory '{}'", dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("read entry in '{}'", dir.display()))?
            .path();
        if path.is_dir() {
            walk(&path, out)?;
        } else if has_image_extension(&path) {
            out.push(path);
        }
    }
    Ok(())
}

pub(crate) fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "../../tests/unit/assets/library.rs"]
mod tests;
