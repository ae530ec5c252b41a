use crate::{
    foundation::core::{PixelRect, Point},
    layer::{LayerId, LayerKind, LayerTransform},
};

/// What a clear command removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearTarget {
    Defects,
    Regions,
    Paint,
}

impl ClearTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Defects => "defects",
            Self::Regions => "regions",
            Self::Paint => "paint",
        }
    }
}

/// Status report returned by every mutating scene command.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SceneEvent {
    Placed {
        id: LayerId,
        kind: LayerKind,
        position: Point,
    },
    Moved {
        id: LayerId,
        kind: LayerKind,
        position: Point,
    },
    Transformed {
        id: LayerId,
        kind: LayerKind,
        transform: LayerTransform,
    },
    Removed {
        id: LayerId,
        kind: LayerKind,
    },
    Cleared {
        what: ClearTarget,
    },
    Painted {
        area: Option<PixelRect>,
    },
    /// A selection drag ended without producing a region.
    Selection {
        has_selection: bool,
    },
}

impl SceneEvent {
    /// One-line summary for a status display.
    pub fn status_line(&self) -> String {
        match self {
            Self::Placed { kind, position, .. } => {
                format!("placed {} at ({:.0}, {:.0})", kind.as_str(), position.x, position.y)
            }
            Self::Moved { kind, position, .. } => {
                format!("moved {} to ({:.0}, {:.0})", kind.as_str(), position.x, position.y)
            }
            Self::Transformed {
                kind, transform, ..
            } => format!(
                "{}: scale {:.2}x, rotation {:.0} deg, opacity {:.2}",
                kind.as_str(),
                transform.scale,
                transform.rotation_deg,
                transform.opacity
            ),
            Self::Removed { kind, .. } => format!("removed {}", kind.as_str()),
            Self::Cleared { what } => format!("cleared {}", what.as_str()),
            Self::Painted { .. } => "painted".to_owned(),
            Self::Selection { has_selection: true } => "selection ready".to_owned(),
            Self::Selection {
                has_selection: false,
            } => "no selection".to_owned(),
        }
    }
}
