//! Drawing command payloads sent to the external modelling tool.
//!
//! Every command is validated here, before any process is spawned, so a bad
//! request is rejected as invalid input instead of surfacing as a tool crash.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Geometry primitives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn splat(v: f64) -> Self {
        Self::new(v, v, v)
    }
}

impl From<[f64; 3]> for Point3D {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

fn one() -> f64 {
    1.0
}

/// RGBA colour, every channel in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct Color {
    #[validate(range(min = 0.0, max = 1.0))]
    pub r: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub g: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub b: f64,
    #[serde(default = "one")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub a: f64,
}

impl Color {
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Result<Self, CoreError> {
        let digits = hex.trim().trim_start_matches('#');
        if !matches!(digits.len(), 6 | 8) || !digits.is_ascii() {
            return Err(CoreError::InvalidInput(format!(
                "Invalid hex color '{hex}'. Expected #RRGGBB or #RRGGBBAA"
            )));
        }

        let channel = |i: usize| -> Result<f64, CoreError> {
            let pair = digits.get(i..i + 2).unwrap_or("");
            u8::from_str_radix(pair, 16)
                .map(|v| f64::from(v) / 255.0)
                .map_err(|_| CoreError::InvalidInput(format!("Invalid hex color '{hex}'")))
        };

        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if digits.len() == 8 { channel(6)? } else { 1.0 },
        })
    }

    fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }

    fn orange() -> Self {
        Self::rgb(1.0, 0.5, 0.0)
    }

    fn light_grey() -> Self {
        Self::rgb(0.8, 0.8, 0.8)
    }

    fn periwinkle() -> Self {
        Self::rgb(0.6, 0.6, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn default_line_thickness() -> f64 {
    0.01
}

fn default_curve_thickness() -> f64 {
    0.02
}

fn default_curve_resolution() -> u32 {
    12
}

fn default_subdivisions() -> u32 {
    2
}

fn default_height() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_line_name() -> String {
    "Line".into()
}

fn default_curve_name() -> String {
    "Curve".into()
}

fn default_mesh_name() -> String {
    "Mesh".into()
}

fn default_primitive_name() -> String {
    "Primitive".into()
}

fn default_scale() -> Point3D {
    Point3D::splat(1.0)
}

/// A polyline through `points`, swept to `thickness`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LineCommand {
    #[validate(length(min = 2, message = "a line needs at least 2 points"))]
    pub points: Vec<Point3D>,
    #[serde(default = "Color::white")]
    #[validate(nested)]
    pub color: Color,
    #[serde(default = "default_line_thickness")]
    #[validate(range(exclusive_min = 0.0))]
    pub thickness: f64,
    #[serde(default = "default_line_name")]
    pub name: String,
}

/// A smooth curve through `control_points`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CurveCommand {
    #[validate(length(min = 2, message = "a curve needs at least 2 control points"))]
    pub control_points: Vec<Point3D>,
    #[serde(default = "Color::orange")]
    #[validate(nested)]
    pub color: Color,
    #[serde(default = "default_curve_thickness")]
    #[validate(range(exclusive_min = 0.0))]
    pub thickness: f64,
    #[serde(default = "default_curve_resolution")]
    #[validate(range(min = 3, max = 64))]
    pub resolution: u32,
    #[serde(default = "default_curve_name")]
    pub name: String,
}

/// An arbitrary mesh from explicit vertices and face index lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_mesh_faces"))]
pub struct MeshCommand {
    #[validate(length(min = 3, message = "a mesh needs at least 3 vertices"))]
    pub vertices: Vec<Point3D>,
    pub faces: Vec<Vec<usize>>,
    #[serde(default = "Color::light_grey")]
    #[validate(nested)]
    pub color: Color,
    #[serde(default = "default_mesh_name")]
    pub name: String,
    #[serde(default = "default_true")]
    pub smooth: bool,
}

fn validate_mesh_faces(mesh: &MeshCommand) -> Result<(), ValidationError> {
    let vertex_count = mesh.vertices.len();
    for face in &mesh.faces {
        if face.len() < 3 {
            return Err(ValidationError::new("face_too_small")
                .with_message("faces must have at least 3 vertices".into()));
        }
        if let Some(idx) = face.iter().find(|&&idx| idx >= vertex_count) {
            return Err(ValidationError::new("face_index_out_of_range")
                .with_message(format!("face index {idx} out of range").into()));
        }
    }
    Ok(())
}

/// Built-in primitive shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    #[default]
    Cube,
    Sphere,
    Cylinder,
    Cone,
    Plane,
    Torus,
}

impl PrimitiveType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cube => "cube",
            Self::Sphere => "sphere",
            Self::Cylinder => "cylinder",
            Self::Cone => "cone",
            Self::Plane => "plane",
            Self::Torus => "torus",
        }
    }

    /// `Cube` for `cube`, used to build default object names.
    pub fn title(self) -> String {
        let s = self.as_str();
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }
}

/// A primitive placed with a transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PrimitiveCommand {
    pub primitive_type: PrimitiveType,
    #[serde(default)]
    pub location: Point3D,
    #[serde(default = "default_scale")]
    pub scale: Point3D,
    #[serde(default)]
    pub rotation: Point3D,
    #[serde(default = "Color::periwinkle")]
    #[validate(nested)]
    pub color: Color,
    #[serde(default = "default_primitive_name")]
    pub name: String,
    #[serde(default = "default_subdivisions")]
    #[validate(range(min = 1, max = 6))]
    pub subdivisions: u32,
    #[serde(default = "one")]
    #[validate(range(exclusive_min = 0.0))]
    pub radius: f64,
    #[serde(default = "default_height")]
    #[validate(range(exclusive_min = 0.0))]
    pub height: f64,
}

impl PrimitiveCommand {
    /// A primitive with default shape parameters.
    pub fn new(
        primitive_type: PrimitiveType,
        location: Point3D,
        scale: Point3D,
        color: Color,
        name: String,
    ) -> Self {
        Self {
            primitive_type,
            location,
            scale,
            rotation: Point3D::default(),
            color,
            name,
            subdivisions: default_subdivisions(),
            radius: one(),
            height: default_height(),
        }
    }
}

/// One drawing step.
///
/// Serialized as a `[type, params]` pair, which is what the drawing module on
/// the tool side iterates over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "(String, Value)",
    into = "(String, Value)"
)]
pub enum DrawCommand {
    Line(LineCommand),
    Curve(CurveCommand),
    Mesh(MeshCommand),
    Primitive(PrimitiveCommand),
}

impl DrawCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Line(_) => "line",
            Self::Curve(_) => "curve",
            Self::Mesh(_) => "mesh",
            Self::Primitive(_) => "primitive",
        }
    }

    /// Run field validation for the wrapped command.
    pub fn validate(&self) -> Result<(), CoreError> {
        let result = match self {
            Self::Line(c) => c.validate(),
            Self::Curve(c) => c.validate(),
            Self::Mesh(c) => c.validate(),
            Self::Primitive(c) => c.validate(),
        };
        result.map_err(|errs| CoreError::InvalidInput(format!("{} command: {errs}", self.kind())))
    }
}

impl TryFrom<(String, Value)> for DrawCommand {
    type Error = String;

    fn try_from((kind, params): (String, Value)) -> Result<Self, Self::Error> {
        let parsed = match kind.as_str() {
            "line" => serde_json::from_value(params).map(Self::Line),
            "curve" => serde_json::from_value(params).map(Self::Curve),
            "mesh" => serde_json::from_value(params).map(Self::Mesh),
            "primitive" => serde_json::from_value(params).map(Self::Primitive),
            other => return Err(format!("Invalid command type: {other}")),
        };
        parsed.map_err(|e| format!("{kind} command: {e}"))
    }
}

impl From<DrawCommand> for (String, Value) {
    fn from(cmd: DrawCommand) -> Self {
        let kind = cmd.kind().to_string();
        let params = match cmd {
            DrawCommand::Line(c) => serde_json::to_value(c),
            DrawCommand::Curve(c) => serde_json::to_value(c),
            DrawCommand::Mesh(c) => serde_json::to_value(c),
            DrawCommand::Primitive(c) => serde_json::to_value(c),
        };
        (kind, params.unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
