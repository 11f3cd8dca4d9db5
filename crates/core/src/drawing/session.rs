//! Drawing sessions and model edit specifications.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::commands::DrawCommand;
use crate::error::CoreError;

/// Export format requested from the tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Obj,
    Blend,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Obj => "obj",
            Self::Blend => "blend",
        }
    }
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_true() -> bool {
    true
}

fn default_output_name() -> String {
    "drawing".into()
}

/// A batch of drawing commands executed in one tool run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingSession {
    #[serde(default = "new_session_id")]
    pub session_id: String,
    #[serde(default = "default_true")]
    pub clear_scene: bool,
    pub commands: Vec<DrawCommand>,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default = "default_output_name")]
    pub output_name: String,
}

impl DrawingSession {
    /// A fresh session around `commands` with a generated id.
    pub fn new(commands: Vec<DrawCommand>, output_name: impl Into<String>) -> Self {
        Self {
            session_id: new_session_id(),
            clear_scene: true,
            commands,
            output_format: OutputFormat::Obj,
            output_name: output_name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.session_id.trim().is_empty() {
            return Err(CoreError::InvalidInput("session_id must not be empty".into()));
        }
        if self.commands.is_empty() {
            return Err(CoreError::InvalidInput(
                "A drawing session needs at least one command".into(),
            ));
        }
        self.commands.iter().try_for_each(DrawCommand::validate)
    }
}

// ---------------------------------------------------------------------------
// Model edits
// ---------------------------------------------------------------------------

/// Material overrides applied to the first material slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roughness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metallic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emission: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissive_intensity: Option<f64>,
}

/// Transform and material changes applied to an existing mesh.
///
/// Serialized as-is into the JSON file read by the update script. Rotation is
/// Euler XYZ; the script treats values that are all above 2π as degrees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<MaterialUpdate>,
}

fn unit_range(field: &str, value: f64) -> Result<(), CoreError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::InvalidInput(format!(
            "{field} must be between 0 and 1, got {value}"
        )))
    }
}

fn colour_channels(field: &str, channels: &[f64]) -> Result<(), CoreError> {
    if !matches!(channels.len(), 3 | 4) {
        return Err(CoreError::InvalidInput(format!(
            "{field} must have 3 or 4 components, got {}",
            channels.len()
        )));
    }
    channels.iter().try_for_each(|&c| unit_range(field, c))
}

impl ModelUpdate {
    pub fn is_empty(&self) -> bool {
        self.location.is_none()
            && self.rotation.is_none()
            && self.scale.is_none()
            && self.material.is_none()
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.is_empty() {
            return Err(CoreError::InvalidInput(
                "Update must change at least one of location, rotation, scale, material".into(),
            ));
        }

        let transforms = [self.location, self.rotation, self.scale];
        if transforms.iter().flatten().flatten().any(|v| !v.is_finite()) {
            return Err(CoreError::InvalidInput(
                "Transform components must be finite numbers".into(),
            ));
        }

        if let Some(material) = &self.material {
            if let Some(color) = &material.color {
                colour_channels("material.color", color)?;
            }
            if let Some(emission) = &material.emission {
                colour_channels("material.emission", emission)?;
            }
            if let Some(r) = material.roughness {
                unit_range("material.roughness", r)?;
            }
            if let Some(m) = material.metallic {
                unit_range("material.metallic", m)?;
            }
            if let Some(i) = material.emissive_intensity {
                if !(i.is_finite() && i >= 0.0) {
                    return Err(CoreError::InvalidInput(
                        "material.emissiveIntensity must be a non-negative number".into(),
                    ));
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
