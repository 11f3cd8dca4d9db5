//! HTTP-level integration tests for programmatic model generation.
//!
//! Validation failures must be rejected before the modelling tool is run,
//! so most tests use a configuration whose executable does not exist.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, build_test_app_with, get, post_json};
use serde_json::json;

fn line(points: serde_json::Value) -> serde_json::Value {
    json!(["line", { "points": points }])
}

// ---------------------------------------------------------------------------
// Test: validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_session_is_400() {
    let app = build_test_app().await;
    let response = post_json(app.router(), "/api/draw/session", json!({ "commands": [] })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn single_point_line_is_400() {
    let app = build_test_app().await;
    let response = post_json(
        app.router(),
        "/api/draw/session",
        json!({ "commands": [line(json!([{ "x": 0.0, "y": 0.0, "z": 0.0 }]))] }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn blend_output_is_400() {
    let app = build_test_app().await;
    let response = post_json(
        app.router(),
        "/api/draw/session",
        json!({
            "output_format": "blend",
            "commands": [line(json!([
                { "x": 0.0, "y": 0.0, "z": 0.0 },
                { "x": 1.0, "y": 0.0, "z": 0.0 }
            ]))]
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("blend"));
}

#[tokio::test]
async fn bad_hex_color_is_400() {
    let app = build_test_app().await;
    let response = post_json(
        app.router(),
        "/api/draw/line",
        json!({ "points": [[0, 0, 0], [1, 1, 1]], "color": "#zzz" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn zero_thickness_line_is_400() {
    let app = build_test_app().await;
    let response = post_json(
        app.router(),
        "/api/draw/line",
        json!({ "points": [[0, 0, 0], [1, 1, 1]], "thickness": 0.0 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Test: tool failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_tool_is_502_and_registers_nothing() {
    let app = build_test_app().await;
    let response = post_json(
        app.router(),
        "/api/draw/primitive",
        json!({ "primitive_type": "sphere" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "GENERATION_FAILED");

    let json = body_json(get(app.router(), "/api/models").await).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: successful generation against a stand-in tool
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn install_fake_blender(root: &std::path::Path) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    // Reads the result path out of the control script ($3), writes an OBJ
    // into the working directory and reports it.
    let script = r#"#!/bin/sh
result=$(sed -n 's/^RESULT_FILE = "\(.*\)"$/\1/p' "$3")
printf 'o Generated\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n' > out.obj
printf '{"success": true, "session_id": "fake-session", "output_path": "out.obj"}' > "$result"
"#;
    let exe = root.join("fake-blender");
    std::fs::write(&exe, script).unwrap();
    std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
    exe
}

#[cfg(unix)]
#[tokio::test]
async fn primitive_is_generated_and_registered() {
    let app = build_test_app_with(|root| Some(install_fake_blender(root))).await;

    let response = post_json(
        app.router(),
        "/api/draw/primitive",
        json!({ "primitive_type": "torus", "location": [0, 0, 1] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["session_id"], "fake-session");
    let model = &json["data"]["model"];
    assert_eq!(model["displayName"], "Torus_Generated");
    assert_eq!(model["description"], "Generated torus primitive");
    assert_eq!(model["category"], "generated");
    assert_eq!(model["isGenerated"], true);
    assert_eq!(model["format"], "obj");
    assert!(app
        .models_dir
        .join(model["storedFilename"].as_str().unwrap())
        .is_file());

    let json = body_json(get(app.router(), "/api/models?category=generated").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn session_uses_output_name() {
    let app = build_test_app_with(|root| Some(install_fake_blender(root))).await;

    let response = post_json(
        app.router(),
        "/api/draw/session",
        json!({
            "output_name": "scribble",
            "commands": [line(json!([
                { "x": 0.0, "y": 0.0, "z": 0.0 },
                { "x": 1.0, "y": 2.0, "z": 3.0 }
            ]))]
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let model = body_json(response).await["data"]["model"].clone();
    assert_eq!(model["displayName"], "scribble");
    assert_eq!(
        model["description"],
        "Programmatically generated model with 1 commands"
    );
}
