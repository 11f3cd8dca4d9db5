//! Handlers for programmatic model generation.
//!
//! Each handler builds a drawing session, runs it through the modelling tool
//! and registers the exported OBJ in the model catalog as `generated`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use meshvault_catalog::{GeneratedAsset, Provenance};
use meshvault_core::assets::AssetRecord;
use meshvault_core::drawing::{
    Color, DrawCommand, DrawingSession, LineCommand, OutputFormat, Point3D, PrimitiveCommand,
    PrimitiveType,
};
use meshvault_core::error::CoreError;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_LINE_COLOR: &str = "#ffffff";
const DEFAULT_PRIMITIVE_COLOR: &str = "#8080ff";

/// A model produced by a drawing session.
#[derive(Debug, Serialize)]
pub struct GeneratedModel {
    pub model: AssetRecord,
    pub session_id: String,
}

/// Body of `POST /api/draw/line`.
#[derive(Debug, Deserialize)]
pub struct DrawLineRequest {
    pub points: Vec<[f64; 3]>,
    /// Hex colour, `#ffffff` when absent.
    pub color: Option<String>,
    #[serde(default = "default_thickness")]
    pub thickness: f64,
    #[serde(default = "default_line_name")]
    pub name: String,
}

fn default_thickness() -> f64 {
    0.01
}

fn default_line_name() -> String {
    "Line".into()
}

/// Body of `POST /api/draw/primitive`.
#[derive(Debug, Deserialize)]
pub struct DrawPrimitiveRequest {
    #[serde(default)]
    pub primitive_type: PrimitiveType,
    #[serde(default)]
    pub location: [f64; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f64; 3],
    /// Hex colour, `#8080ff` when absent.
    pub color: Option<String>,
    /// Defaults to `{Type}_Generated`.
    pub name: Option<String>,
}

fn unit_scale() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

/// POST /api/draw/session
pub async fn session(
    State(state): State<AppState>,
    Json(session): Json<DrawingSession>,
) -> AppResult<(StatusCode, Json<DataResponse<GeneratedModel>>)> {
    let description = format!(
        "Programmatically generated model with {} commands",
        session.commands.len()
    );
    generate(&state, session, description).await
}

/// POST /api/draw/line
pub async fn line(
    State(state): State<AppState>,
    Json(input): Json<DrawLineRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<GeneratedModel>>)> {
    let color = Color::from_hex(input.color.as_deref().unwrap_or(DEFAULT_LINE_COLOR))?;
    let description = format!("Generated line with {} points", input.points.len());

    let command = LineCommand {
        points: input.points.into_iter().map(Point3D::from).collect(),
        color,
        thickness: input.thickness,
        name: input.name.clone(),
    };
    let session = DrawingSession::new(vec![DrawCommand::Line(command)], input.name);
    generate(&state, session, description).await
}

/// POST /api/draw/primitive
pub async fn primitive(
    State(state): State<AppState>,
    Json(input): Json<DrawPrimitiveRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<GeneratedModel>>)> {
    let color = Color::from_hex(input.color.as_deref().unwrap_or(DEFAULT_PRIMITIVE_COLOR))?;
    let kind = input.primitive_type;
    let name = input
        .name
        .unwrap_or_else(|| format!("{}_Generated", kind.title()));

    let command = PrimitiveCommand::new(
        kind,
        input.location.into(),
        input.scale.into(),
        color,
        name.clone(),
    );
    let session = DrawingSession::new(vec![DrawCommand::Primitive(command)], name);
    generate(&state, session, format!("Generated {} primitive", kind.as_str())).await
}

/// Run `session` and register its output.
async fn generate(
    state: &AppState,
    session: DrawingSession,
    description: String,
) -> AppResult<(StatusCode, Json<DataResponse<GeneratedModel>>)> {
    if session.output_format != OutputFormat::Obj {
        return Err(CoreError::InvalidInput(format!(
            "Output format '{}' cannot be stored in the model catalog, use 'obj'",
            session.output_format.extension()
        ))
        .into());
    }
    session.validate()?;

    let outcome = state.blender.execute_session(&session).await?;

    let model = state
        .models
        .register_generated(GeneratedAsset {
            source: outcome.output_path,
            display_name: session.output_name,
            description: Some(description),
            provenance: Provenance::Generated,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: GeneratedModel {
                model,
                session_id: outcome.session_id,
            },
        }),
    ))
}
