//! HTTP-level integration tests for the model catalog.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router over
//! temporary asset directories.

mod common;

use axum::http::StatusCode;
use common::{
    body_bytes, body_json, build_test_app, build_test_app_with, delete, get, post_empty,
    post_json, post_multipart, upload, Part,
};

// ---------------------------------------------------------------------------
// Test: upload, get, file, delete round
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_get_and_delete_chair() {
    let app = build_test_app().await;

    let record = upload(app.router(), "/api/models", "chair.obj", b"v 0 0 0\n").await;
    assert_eq!(record["format"], "obj");
    assert_eq!(record["category"], "uploaded");
    assert_eq!(record["displayName"], "chair");
    assert_eq!(record["kind"], "model");
    assert_eq!(record["fileSizeBytes"], 8);
    let stored = record["storedFilename"].as_str().unwrap().to_string();
    assert!(stored.ends_with("_chair.obj"));
    assert!(app.models_dir.join(&stored).is_file());

    let id = record["id"].as_str().unwrap();
    let response = get(app.router(), &format!("/api/models/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], record);

    let response = delete(app.router(), &format!("/api/models/{id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!app.models_dir.join(&stored).exists());

    let response = get(app.router(), &format!("/api/models/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn uploaded_file_is_served_at_asset_url() {
    let app = build_test_app().await;
    let record = upload(app.router(), "/api/models", "cube.stl", b"solid cube").await;

    let url = record["assetUrl"].as_str().unwrap();
    let response = get(app.router(), url).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"solid cube");

    let id = record["id"].as_str().unwrap();
    let response = get(app.router(), &format!("/api/models/{id}/file")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"solid cube");
}

#[tokio::test]
async fn catalog_file_is_not_served() {
    let app = build_test_app().await;
    upload(app.router(), "/api/models", "cube.stl", b"solid cube").await;
    upload(app.router(), "/api/textures", "wood.png", b"png").await;
    assert!(app.models_dir.join("catalog.json").is_file());
    assert!(app.textures_dir.join("catalog.json").is_file());

    for uri in [
        "/models/catalog.json",
        "/models/catalog%2Ejson",
        "/models/..%2Fmodels%2Fcatalog.json",
        "/textures/catalog.json",
    ] {
        let response = get(app.router(), uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body_json(response).await["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn same_filename_twice_creates_two_records() {
    let app = build_test_app().await;

    let first = upload(app.router(), "/api/models", "cube.obj", b"a").await;
    let second = upload(app.router(), "/api/models", "cube.obj", b"b").await;

    assert_ne!(first["id"], second["id"]);
    assert_ne!(first["storedFilename"], second["storedFilename"]);

    let json = body_json(get(app.router(), "/api/models").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn form_fields_are_applied() {
    let app = build_test_app().await;

    let response = post_multipart(
        app.router(),
        "/api/models",
        &[
            Part::Text("name", "Dining chair"),
            Part::Text("description", "Four legs"),
            Part::Text("category", "furniture"),
            Part::File("file", "chair.glb", b"glTF"),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let record = body_json(response).await["data"].clone();
    assert_eq!(record["displayName"], "Dining chair");
    assert_eq!(record["description"], "Four legs");
    assert_eq!(record["category"], "furniture");
    assert_eq!(record["format"], "glb");
}

// ---------------------------------------------------------------------------
// Test: upload validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_without_file_part_is_400() {
    let app = build_test_app().await;
    let response = post_multipart(app.router(), "/api/models", &[Part::Text("name", "x")]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn upload_with_empty_filename_is_400() {
    let app = build_test_app().await;
    let response =
        post_multipart(app.router(), "/api/models", &[Part::File("file", "", b"x")]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn texture_format_is_rejected_by_model_catalog() {
    let app = build_test_app().await;
    let response =
        post_multipart(app.router(), "/api/models", &[Part::File("file", "wood.png", b"x")]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("obj"));
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = build_test_app().await;
    let big = vec![0u8; 2 * 1024 * 1024];
    let response =
        post_multipart(app.router(), "/api/models", &[Part::File("file", "big.obj", &big)]).await;

    assert!(response.status().is_client_error());
    let json = body_json(get(app.router(), "/api/models").await).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn category_filter_and_categories() {
    let app = build_test_app().await;
    for (file, category) in [("a.obj", "props"), ("b.obj", "furniture"), ("c.obj", "props")] {
        let response = post_multipart(
            app.router(),
            "/api/models",
            &[Part::Text("category", category), Part::File("file", file, b"v")],
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let json = body_json(get(app.router(), "/api/models?category=props").await).await;
    let props = json["data"].as_array().unwrap();
    assert_eq!(props.len(), 2);
    assert!(props.iter().all(|r| r["category"] == "props"));

    let json = body_json(get(app.router(), "/api/models?category=").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 3);

    let json = body_json(get(app.router(), "/api/models/categories").await).await;
    assert_eq!(json["data"], serde_json::json!(["furniture", "props"]));
}

#[tokio::test]
async fn unknown_id_is_404() {
    let app = build_test_app().await;

    let response = get(app.router(), "/api/models/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Model with id does-not-exist not found");

    let response = delete(app.router(), "/api/models/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(app.router(), "/api/models/does-not-exist/file").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: reconciliation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn startup_discovers_untracked_files() {
    let app = build_test_app_with(|root| {
        std::fs::write(root.join("models").join("abc123_lamp.obj"), "v 0 0 0\n").unwrap();
        None
    })
    .await;

    let json = body_json(get(app.router(), "/api/models").await).await;
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["displayName"], "lamp");
    assert_eq!(data[0]["category"], "loaded");
    assert_eq!(data[0]["assetUrl"], "/models/abc123_lamp.obj");
}

#[tokio::test]
async fn reconcile_endpoint_reports_changes() {
    let app = build_test_app().await;
    let record = upload(app.router(), "/api/models", "chair.obj", b"v").await;
    let stored = record["storedFilename"].as_str().unwrap();

    std::fs::remove_file(app.models_dir.join(stored)).unwrap();
    std::fs::write(app.models_dir.join("ff_table.ply"), "ply").unwrap();

    let response = post_empty(app.router(), "/api/models/reconcile").await;
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await["data"].clone();
    assert_eq!(report["pruned"], serde_json::json!([record["id"]]));
    assert_eq!(report["discovered"], serde_json::json!(["ff_table.ply"]));
    assert_eq!(report["persisted"], true);

    let response = post_empty(app.router(), "/api/models/reconcile").await;
    let report = body_json(response).await["data"].clone();
    assert_eq!(report["pruned"], serde_json::json!([]));
    assert_eq!(report["discovered"], serde_json::json!([]));
    assert_eq!(report["persisted"], false);
}

// ---------------------------------------------------------------------------
// Test: model update
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_with_empty_body_is_400() {
    let app = build_test_app().await;
    let record = upload(app.router(), "/api/models", "chair.obj", b"v").await;
    let id = record["id"].as_str().unwrap();

    let response = post_json(
        app.router(),
        &format!("/api/models/{id}/update"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_of_unknown_model_is_404() {
    let app = build_test_app().await;
    let response = post_json(
        app.router(),
        "/api/models/nope/update",
        serde_json::json!({ "scale": [2.0, 2.0, 2.0] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_without_script_is_502() {
    let app = build_test_app().await;
    let record = upload(app.router(), "/api/models", "chair.obj", b"v").await;
    let id = record["id"].as_str().unwrap();

    let response = post_json(
        app.router(),
        &format!("/api/models/{id}/update"),
        serde_json::json!({ "location": [0.0, 1.0, 0.0] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "GENERATION_FAILED");

    // The original is untouched.
    let json = body_json(get(app.router(), "/api/models").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn update_registers_edited_copy() {
    use std::os::unix::fs::PermissionsExt;

    let app = build_test_app_with(|root| {
        // The update script is never interpreted: the fake tool copies the
        // value after `--obj` ($8) to the value after `--output` (${10}).
        std::fs::write(root.join("scripts").join("update_model.py"), "").unwrap();
        let exe = root.join("fake-blender");
        std::fs::write(&exe, "#!/bin/sh\ncp \"$8\" \"${10}\"\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        Some(exe)
    })
    .await;

    let original = upload(app.router(), "/api/models", "chair.obj", b"o Chair\nv 0 0 0\n").await;
    let id = original["id"].as_str().unwrap();

    let response = post_json(
        app.router(),
        &format!("/api/models/{id}/update"),
        serde_json::json!({ "scale": [2.0, 2.0, 2.0], "material": { "roughness": 0.3 } }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let edited = body_json(response).await["data"].clone();
    assert_eq!(edited["category"], "edited");
    assert_eq!(edited["isEdited"], true);
    assert_eq!(edited["originalRecordId"], original["id"]);
    assert_eq!(edited["displayName"], "chair (edited)");
    assert_ne!(edited["storedFilename"], original["storedFilename"]);

    let json = body_json(get(app.router(), "/api/models").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}
