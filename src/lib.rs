//! defectpaste builds labeled defect datasets by pasting defect cut-outs onto
//! target images.
//!
//! The API is session-oriented:
//!
//! - Scan a [`DefectLibrary`] of masks and paired defect images
//! - Open an [`EditorSession`] and switch between target images
//! - Place, transform and remove layers, paint, and cut regions from the background
//! - Save one composite, or batch export every cached image with [`BatchExporter`]
//!
//! Every composite is written as a color PNG, a binary label mask and a JSON
//! metadata file describing the layers that produced it.
#![forbid(unsafe_code)]

mod assets;
mod foundation;

/// Flattening a scene into color and mask rasters.
pub mod compose;
/// Defect extraction and cropping.
pub mod defect;
/// Writing composites and batch export.
pub mod export;
/// Positioned rasters and their provenance.
pub mod layer;
/// The freehand paint raster.
pub mod paint;
/// The editable scene.
pub mod scene;
/// Rectangle and freehand region cuts.
pub mod selection;
/// Command facade tying scene, cache and library together.
pub mod session;
/// Per-image augmentation state.
pub mod state;

pub use crate::assets::decode::{
    decode_image, decode_mask, load_image, load_mask, load_rgba, write_png_gray, write_png_rgb,
    write_png_rgba,
};
pub use crate::assets::library::{DEFAULT_DEFECT_TYPE, DefectLibrary, load_defect, scan_images};
pub use crate::foundation::core::{Affine, PixelRect, Point, Rect, Rgb8, Vec2};
pub use crate::foundation::error::{DefectPasteError, DefectPasteResult};

pub use crate::compose::{Composite, compose};
pub use crate::defect::{CROP_MARGIN, DefectCut, content_bounds, crop_to_content, extract_defect};
pub use crate::export::{
    BatchExporter, ExportReport, ExportedItem, OutputPaths, SaveMetadata, next_index, save_outputs,
};
pub use crate::layer::{
    DefectSource, Layer, LayerId, LayerKind, LayerSource, LayerTransform, RegionKind,
    RegionSource,
};
pub use crate::paint::{Brush, BrushMode, PaintLayer};
pub use crate::scene::{ClearTarget, Scene, SceneEvent};
pub use crate::selection::{
    RegionCut, SelectionDraft, SelectionMode, extract_freehand, extract_rectangle, polygon_mask,
    rebuild_region,
};
pub use crate::session::{EditorSession, SessionOpts};
pub use crate::state::{
    AugmentationState, AugmentationStateCache, ImageKey, RestoreReport, SESSION_FILE, SkippedItem,
};
