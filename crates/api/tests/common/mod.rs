#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use meshvault_api::config::{BlenderConfig, ServerConfig};
use meshvault_api::router::build_app_router;
use meshvault_api::state::AppState;
use meshvault_catalog::CatalogService;
use meshvault_core::assets::AssetClass;
use meshvault_core::scripting::BlenderRunner;

pub const BOUNDARY: &str = "meshvault-test-boundary";

/// A router over temporary asset directories.
///
/// The directories live as long as the `TestApp`.
pub struct TestApp {
    pub router: Router,
    pub root: TempDir,
    pub models_dir: PathBuf,
    pub textures_dir: PathBuf,
    pub scripts_dir: PathBuf,
}

impl TestApp {
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Build a test `ServerConfig` rooted at `root`.
///
/// Blender points at an executable that does not exist unless a test
/// installs one with [`build_test_app_with_blender`].
pub fn test_config(root: &Path, executable: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 1024 * 1024,
        models_dir: root.join("models"),
        textures_dir: root.join("textures"),
        blender: BlenderConfig {
            executable,
            scripts_dir: root.join("scripts"),
            timeout_secs: 10,
        },
    }
}

/// Build the full application router with all middleware layers.
pub async fn build_test_app() -> TestApp {
    let root = tempfile::tempdir().unwrap();
    let missing = root.path().join("no-such-blender");
    build_app(root, missing).await
}

/// Like [`build_test_app`], with `prepare` run against the root directory
/// before the catalogs are opened (to seed files or install a fake tool).
pub async fn build_test_app_with<F>(prepare: F) -> TestApp
where
    F: FnOnce(&Path) -> Option<PathBuf>,
{
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(root.path().join("models")).unwrap();
    std::fs::create_dir_all(root.path().join("textures")).unwrap();
    std::fs::create_dir_all(root.path().join("scripts")).unwrap();
    let executable = prepare(root.path()).unwrap_or_else(|| root.path().join("no-such-blender"));
    build_app(root, executable).await
}

async fn build_app(root: TempDir, executable: PathBuf) -> TestApp {
    let config = test_config(root.path(), executable);
    std::fs::create_dir_all(&config.blender.scripts_dir).unwrap();

    let (models, _) = CatalogService::open(AssetClass::Model, &config.models_dir).await;
    let (textures, _) = CatalogService::open(AssetClass::Texture, &config.textures_dir).await;
    let blender = BlenderRunner::new(
        &config.blender.executable,
        &config.blender.scripts_dir,
        config.blender.timeout(),
    );

    let state = AppState {
        models: Arc::new(models),
        textures: Arc::new(textures),
        blender: Arc::new(blender),
    };

    TestApp {
        router: build_app_router(state, &config),
        models_dir: config.models_dir.clone(),
        textures_dir: config.textures_dir.clone(),
        scripts_dir: config.blender.scripts_dir.clone(),
        root,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_empty(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// One part of a multipart form.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart(app: Router, uri: &str, parts: &[Part<'_>]) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}

/// Upload `filename` and return the created record.
pub async fn upload(app: Router, uri: &str, filename: &str, data: &[u8]) -> serde_json::Value {
    let response = post_multipart(app, uri, &[Part::File("file", filename, data)]).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}
