use std::path::Path;

use anyhow::Context;

use super::{
    AugmentationState, AugmentationStateCache, DefectDescriptor, ImageKey, RegionDescriptor,
};
use crate::{
    assets::decode::{load_rgba, write_png_rgba},
    foundation::error::{DefectPasteError, DefectPasteResult},
};

/// Name of the JSON index inside a persisted session directory. Paint
/// rasters sit next to it as `paint_{n}.png`.
pub const SESSION_FILE: &str = "session.json";

const SESSION_VERSION: u32 = 1;

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionFile {
    version: u32,
    entries: Vec<SessionEntry>,
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionEntry {
    image: ImageKey,
    defects: Vec<DefectDescriptor>,
    regions: Vec<RegionDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    paint: Option<String>,
}

pub(super) fn write_session(cache: &AugmentationStateCache, dir: &Path) -> DefectPasteResult<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create session directory '{}'", dir.display()))?;

    let mut entries = Vec::with_capacity(cache.len());
    for (i, (key, state)) in cache.iter().enumerate() {
        let paint = match &state.paint {
            Some(raster) => {
                let name = format!("paint_{i}.png");
                write_png_rgba(&dir.join(&name), raster)?;
                Some(name)
            }
            None => None,
        };
        entries.push(SessionEntry {
            image: key.clone(),
            defects: state.defects.clone(),
            regions: state.regions.clone(),
            paint,
        });
    }

    let file = SessionFile {
        version: SESSION_VERSION,
        entries,
    };
    let json = serde_json::to_vec_pretty(&file)?;
    let path = dir.join(SESSION_FILE);
    std::fs::write(&path, json).with_context(|| format!("write '{}'", path.display()))?;
    tracing::info!(entries = cache.len(), dir = %dir.display(), "session persisted");
    Ok(())
}

pub(super) fn read_session(dir: &Path) -> DefectPasteResult<AugmentationStateCache> {
    let path = dir.join(SESSION_FILE);
    if !path.exists() {
        return Err(DefectPasteError::not_found(format!(
            "no {SESSION_FILE} in '{}'",
            dir.display()
        )));
    }
    let bytes = std::fs::read(&path).with_context(|| format!("read '{}'", path.display()))?;
    let file: SessionFile = serde_json::from_slice(&bytes)?;
    if file.version != SESSION_VERSION {
        return Err(DefectPasteError::serde(format!(
            "unsupported session version {} (expected {SESSION_VERSION})",
            file.version
        )));
    }

    let mut cache = AugmentationStateCache::new();
    for entry in file.entries {
        let paint = match entry.paint {
            Some(name) => Some(load_rgba(&dir.join(name))?),
            None => None,
        };
        cache.insert(
            entry.image,
            AugmentationState {
                defects: entry.defects,
                regions: entry.regions,
                paint,
            },
        );
    }
    Ok(cache)
}
