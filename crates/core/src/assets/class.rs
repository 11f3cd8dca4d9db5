//! Asset classes and their format allow-lists.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Mesh container extensions accepted for models.
pub const MODEL_FORMATS: &[&str] = &["obj", "gltf", "glb", "fbx", "stl", "ply", "dae"];

/// Raster image extensions accepted for textures.
pub const TEXTURE_FORMATS: &[&str] = &[
    "png", "jpg", "jpeg", "bmp", "tga", "tif", "tiff", "webp", "exr", "hdr",
];

/// One of the two independently configured catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Model,
    Texture,
}

impl AssetClass {
    /// Extensions (lower-case, no dot) accepted for this class.
    pub fn allowed_formats(self) -> &'static [&'static str] {
        match self {
            Self::Model => MODEL_FORMATS,
            Self::Texture => TEXTURE_FORMATS,
        }
    }

    /// Case-insensitive membership test against [`Self::allowed_formats`].
    pub fn is_allowed_format(self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.allowed_formats().contains(&ext.as_str())
    }

    /// Reject `ext` unless it is allowed for this class.
    pub fn validate_format(self, ext: &str) -> Result<(), CoreError> {
        if self.is_allowed_format(ext) {
            Ok(())
        } else {
            Err(CoreError::InvalidInput(format!(
                "Unsupported {} format '.{ext}'. Allowed: {}",
                self.noun(),
                self.allowed_formats().join(", ")
            )))
        }
    }

    /// Public route prefix the backing files are served under.
    pub fn route_prefix(self) -> &'static str {
        match self {
            Self::Model => "/models",
            Self::Texture => "/textures",
        }
    }

    /// Entity label used in `NotFound` errors.
    pub fn entity(self) -> &'static str {
        match self {
            Self::Model => "Model",
            Self::Texture => "Texture",
        }
    }

    /// Lower-case noun for log lines and generated descriptions.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Texture => "texture",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}
