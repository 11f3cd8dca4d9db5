//! Out-of-process tool orchestration.
//!
//! [`subprocess`] owns spawning, output capture and timeouts; [`blender`]
//! builds the Blender command lines and interprets their results.

pub mod blender;
pub mod subprocess;

pub use blender::{BlenderRunner, SessionOutcome};
