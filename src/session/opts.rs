use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;

use crate::{
    defect::CROP_MARGIN,
    foundation::{
        core::check_opacity,
        error::{DefectPasteError, DefectPasteResult},
    },
    selection::MIN_SELECTION_EXTENT,
};

/// Editing and export defaults for a session.
///
/// Every field is optional in JSON; missing fields take the values from
/// [`SessionOpts::default`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionOpts {
    /// Opacity given to newly placed defects.
    pub defect_opacity: f64,
    /// Opacity given to newly committed regions.
    pub region_opacity: f64,
    /// Selections must be strictly wider and taller than this.
    pub min_selection_extent: u32,
    /// Padding kept around a defect's mask content when cropping.
    pub crop_margin: u32,
    /// Mask luma at or above this is foreground.
    pub mask_threshold: u8,
    /// File name prefix for batch export.
    pub export_base_name: String,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            defect_opacity: 0.7,
            region_opacity: 0.8,
            min_selection_extent: MIN_SELECTION_EXTENT,
            crop_margin: CROP_MARGIN,
            mask_threshold: 128,
            export_base_name: "augmented".to_owned(),
        }
    }
}

impl SessionOpts {
    pub fn from_json_file(path: &Path) -> DefectPasteResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let opts: Self = serde_json::from_reader(BufReader::new(f))?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> DefectPasteResult<()> {
        check_opacity(self.defect_opacity)?;
        check_opacity(self.region_opacity)?;
        if self.mask_threshold == 0 {
            return Err(DefectPasteError::validation(
                "mask_threshold must be > 0 so empty pixels stay background",
            ));
        }
        if self.export_base_name.is_empty()
            || self
                .export_base_name
                .contains(|c: char| c == '/' || c == '\\')
        {
            return Err(DefectPasteError::validation(format!(
                "export_base_name must be a plain file name prefix, got '{}'",
                self.export_base_name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/opts.rs"]
mod tests;
