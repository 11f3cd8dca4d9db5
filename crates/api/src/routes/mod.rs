pub mod catalog;
pub mod draw;
pub mod health;

use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Router};
use meshvault_core::assets::AssetClass;
use tower_http::timeout::TimeoutLayer;

use crate::config::ServerConfig;
use crate::handlers;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /models                      list, upload
/// /models/categories           distinct categories
/// /models/reconcile            re-sync with the directory (POST)
/// /models/{id}                 get, delete
/// /models/{id}/file            backing file
/// /models/{id}/update          edit through the modelling tool (POST)
///
/// /textures/...                same catalog routes as /models, without update
///
/// /draw/session                run a drawing session (POST)
/// /draw/line                   draw one line (POST)
/// /draw/primitive              draw one primitive (POST)
/// ```
///
/// Catalog routes use `REQUEST_TIMEOUT_SECS`; routes that run the modelling
/// tool get its own timeout plus headroom.
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    let catalog = Router::new()
        .nest("/models", catalog::router(AssetClass::Model))
        .nest("/textures", catalog::router(AssetClass::Texture))
        .layer(timeout(Duration::from_secs(config.request_timeout_secs)));

    let generation = Router::new()
        .route("/models/{id}/update", post(handlers::catalog::update_model))
        .nest("/draw", draw::router())
        .layer(timeout(config.blender.request_timeout()));

    catalog.merge(generation)
}

/// Static file routes for stored assets: `/models/{file}`, `/textures/{file}`.
///
/// Files are looked up in each catalog's own directory.
pub fn static_files() -> Router<AppState> {
    let files = |class: AssetClass| {
        Router::new()
            .route("/{file}", get(handlers::catalog::stored_file))
            .layer(Extension(class))
    };

    Router::new()
        .nest(AssetClass::Model.route_prefix(), files(AssetClass::Model))
        .nest(AssetClass::Texture.route_prefix(), files(AssetClass::Texture))
}

fn timeout(duration: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, duration)
}
