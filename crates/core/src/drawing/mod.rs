//! Request types for programmatic model generation.
//!
//! These types describe what to draw; the tool invocation itself lives in
//! [`crate::scripting::blender`].

pub mod commands;
pub mod session;

pub use commands::{
    Color, CurveCommand, DrawCommand, LineCommand, MeshCommand, Point3D, PrimitiveCommand,
    PrimitiveType,
};
pub use session::{DrawingSession, MaterialUpdate, ModelUpdate, OutputFormat};
