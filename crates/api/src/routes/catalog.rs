//! Route definitions shared by the model and texture catalogs.

use axum::routing::{get, post};
use axum::{Extension, Router};
use meshvault_core::assets::AssetClass;

use crate::handlers::catalog;
use crate::state::AppState;

/// Routes mounted at `/models` or `/textures`.
///
/// ```text
/// GET    /              -> list
/// POST   /              -> upload
/// GET    /categories    -> list_categories
/// POST   /reconcile     -> reconcile
/// GET    /{id}          -> get_by_id
/// DELETE /{id}          -> delete
/// GET    /{id}/file     -> file
/// ```
pub fn router(class: AssetClass) -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::list).post(catalog::upload))
        .route("/categories", get(catalog::list_categories))
        .route("/reconcile", post(catalog::reconcile))
        .route("/{id}", get(catalog::get_by_id).delete(catalog::delete))
        .route("/{id}/file", get(catalog::file))
        .layer(Extension(class))
}
