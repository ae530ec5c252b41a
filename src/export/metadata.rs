use std::path::PathBuf;

use crate::{
    layer::{Layer, LayerSource},
    scene::Scene,
    state::ImageKey,
};

/// JSON sidecar written next to every saved composite.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SaveMetadata {
    pub target_image: String,
    pub target_image_path: PathBuf,
    pub defects: Vec<DefectMetadata>,
    pub regions: Vec<RegionMetadata>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DefectMetadata {
    #[serde(rename = "type")]
    pub defect_type: String,
    pub position: [f64; 2],
    pub scale: f64,
    pub rotation: f64,
    pub opacity: f64,
    pub mask_path: Option<PathBuf>,
    pub defect_image_path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RegionMetadata {
    #[serde(rename = "type")]
    pub region_type: String,
    pub position: [f64; 2],
    pub scale: f64,
    pub rotation: f64,
    pub opacity: f64,
    /// `[x, y, width, height]` on the background.
    pub original_rect: [u32; 4],
    pub source: String,
}

impl SaveMetadata {
    pub fn from_scene(scene: &Scene, target: &ImageKey) -> Self {
        Self {
            target_image: target.file_name(),
            target_image_path: target.path().to_path_buf(),
            defects: scene.defects().iter().filter_map(defect_entry).collect(),
            regions: scene.regions().iter().filter_map(region_entry).collect(),
        }
    }
}

fn defect_entry(layer: &Layer) -> Option<DefectMetadata> {
    let LayerSource::Defect(src) = layer.source() else {
        return None;
    };
    let t = layer.transform();
    Some(DefectMetadata {
        defect_type: src.defect_type.clone(),
        position: [layer.position().x, layer.position().y],
        scale: t.scale,
        rotation: t.rotation_deg,
        opacity: t.opacity,
        mask_path: src.mask_path.clone(),
        defect_image_path: src.defect_image_path.clone(),
    })
}

fn region_entry(layer: &Layer) -> Option<RegionMetadata> {
    let LayerSource::Region(src) = layer.source() else {
        return None;
    };
    let t = layer.transform();
    let o = src.origin;
    Some(RegionMetadata {
        region_type: layer.kind().as_str().to_owned(),
        position: [layer.position().x, layer.position().y],
        scale: t.scale,
        rotation: t.rotation_deg,
        opacity: t.opacity,
        original_rect: [o.x, o.y, o.width, o.height],
        source: src.source.clone(),
    })
}
