//! The asset record and its on-disk document form.
//!
//! [`AssetRecord`] is the fully-populated, strongly-typed record used
//! everywhere in the service. [`RecordDocument`] is the loose shape read back
//! from a catalog file: every field optional, legacy key names accepted. The
//! conversion between them is the only place defaults are filled in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::naming::{asset_url, display_name_from_stored, extension_of, filename_from_url};
use super::{AssetClass, CATEGORY_UNCATEGORIZED};
use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Texture kinds
// ---------------------------------------------------------------------------

/// Shading channel a texture is intended for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureKind {
    #[default]
    Diffuse,
    Normal,
    Roughness,
    Metallic,
    Ao,
    Emissive,
    Height,
    Opacity,
}

impl TextureKind {
    pub const ALL: &'static [TextureKind] = &[
        Self::Diffuse,
        Self::Normal,
        Self::Roughness,
        Self::Metallic,
        Self::Ao,
        Self::Emissive,
        Self::Height,
        Self::Opacity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Diffuse => "diffuse",
            Self::Normal => "normal",
            Self::Roughness => "roughness",
            Self::Metallic => "metallic",
            Self::Ao => "ao",
            Self::Emissive => "emissive",
            Self::Height => "height",
            Self::Opacity => "opacity",
        }
    }
}

impl fmt::Display for TextureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextureKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                CoreError::InvalidInput(format!(
                    "Unknown texture type '{s}'. Valid types: {}",
                    valid.join(", ")
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Class-specific record fields, tagged by `kind` in JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AssetDetails {
    #[serde(rename_all = "camelCase")]
    Model {
        is_generated: bool,
        is_edited: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        original_record_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Texture { texture_kind: TextureKind },
}

impl AssetDetails {
    /// Details for a model that was neither generated nor edited.
    pub fn plain_model() -> Self {
        Self::Model {
            is_generated: false,
            is_edited: false,
            original_record_id: None,
        }
    }

    /// Defaults for a record of `class` discovered without metadata.
    pub fn default_for(class: AssetClass) -> Self {
        match class {
            AssetClass::Model => Self::plain_model(),
            AssetClass::Texture => Self::Texture {
                texture_kind: TextureKind::default(),
            },
        }
    }

    pub fn class(&self) -> AssetClass {
        match self {
            Self::Model { .. } => AssetClass::Model,
            Self::Texture { .. } => AssetClass::Texture,
        }
    }
}

/// One entry in a model or texture catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub stored_filename: String,
    pub asset_url: String,
    pub format: String,
    /// Never empty: entries loaded without one get `"uncategorized"`.
    pub category: String,
    pub file_size_bytes: u64,
    pub created_at: Timestamp,
    #[serde(flatten)]
    pub details: AssetDetails,
}

impl AssetRecord {
    pub fn class(&self) -> AssetClass {
        self.details.class()
    }

    /// Filename the record expects to find in the asset directory.
    ///
    /// Taken from the URL when it has one, since that is what clients fetch.
    pub fn expected_filename(&self) -> &str {
        filename_from_url(&self.asset_url).unwrap_or(&self.stored_filename)
    }
}

/// Loosely-typed record as found in a catalog file.
///
/// Older catalogs used `name`, `modelUrl`/`textureUrl`, `fileSize` and `type`;
/// those are accepted as aliases.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordDocument {
    pub id: Option<String>,
    #[serde(alias = "name")]
    pub display_name: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "filename")]
    pub stored_filename: Option<String>,
    #[serde(alias = "modelUrl", alias = "textureUrl")]
    pub asset_url: Option<String>,
    pub format: Option<String>,
    pub category: Option<String>,
    #[serde(alias = "fileSize")]
    pub file_size_bytes: Option<u64>,
    pub created_at: Option<Timestamp>,
    pub kind: Option<AssetClass>,
    pub is_generated: Option<bool>,
    pub is_edited: Option<bool>,
    pub original_record_id: Option<String>,
    #[serde(alias = "type")]
    pub texture_kind: Option<String>,
}

impl RecordDocument {
    /// Fill defaults and produce a record for the catalog of `class`.
    ///
    /// Returns `None` when neither the id nor a stored filename can be
    /// determined; such entries cannot be addressed or reconciled.
    /// A missing or blank category becomes `"uncategorized"`.
    pub fn into_record(self, class: AssetClass) -> Option<AssetRecord> {
        let id = self.id.filter(|id| !id.trim().is_empty())?;

        let stored_filename = self
            .stored_filename
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.asset_url
                    .as_deref()
                    .and_then(filename_from_url)
                    .map(str::to_string)
            })?;

        if let Some(kind) = self.kind {
            if kind != class {
                tracing::warn!(
                    id = %id,
                    kind = %kind,
                    catalog = %class,
                    "Record kind does not match its catalog, treating as catalog class",
                );
            }
        }

        let display_name = self
            .display_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| display_name_from_stored(&stored_filename));

        let description = self
            .description
            .unwrap_or_else(|| format!("{} {display_name}", class.entity()));

        let details = match class {
            AssetClass::Model => {
                let is_edited = self.is_edited.unwrap_or(false);
                AssetDetails::Model {
                    is_generated: self.is_generated.unwrap_or(is_edited),
                    is_edited,
                    original_record_id: self.original_record_id,
                }
            }
            AssetClass::Texture => AssetDetails::Texture {
                texture_kind: self
                    .texture_kind
                    .and_then(|k| k.parse().ok())
                    .unwrap_or_default(),
            },
        };

        Some(AssetRecord {
            asset_url: self
                .asset_url
                .unwrap_or_else(|| asset_url(class, &stored_filename)),
            format: self
                .format
                .map(|f| f.to_ascii_lowercase())
                .or_else(|| extension_of(&stored_filename))
                .unwrap_or_default(),
            category: self
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| CATEGORY_UNCATEGORIZED.to_string()),
            file_size_bytes: self.file_size_bytes.unwrap_or(0),
            created_at: self.created_at.unwrap_or_default(),
            id,
            display_name,
            description,
            stored_filename,
            details,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
