/// Convenience result type used across the crate.
pub type DefectPasteResult<T> = Result<T, DefectPasteError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum DefectPasteError {
    /// Invalid arguments or inconsistent raster data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced mask, defect image, or target image could not be located.
    #[error("not found: {0}")]
    NotFound(String),

    /// A selection too small to become a region.
    #[error("selection error: {0}")]
    Selection(String),

    /// Errors when serializing or deserializing session or metadata JSON.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DefectPasteError {
    /// Build a [`DefectPasteError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`DefectPasteError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`DefectPasteError::Selection`] value.
    pub fn selection(msg: impl Into<String>) -> Self {
        Self::Selection(msg.into())
    }

    /// Build a [`DefectPasteError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for DefectPasteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
