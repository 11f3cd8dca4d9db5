use std::sync::Arc;

use meshvault_catalog::CatalogService;
use meshvault_core::assets::AssetClass;
use meshvault_core::scripting::BlenderRunner;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything lives behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Model catalog (`MODELS_DIR`).
    pub models: Arc<CatalogService>,
    /// Texture catalog (`TEXTURES_DIR`).
    pub textures: Arc<CatalogService>,
    pub blender: Arc<BlenderRunner>,
}

impl AppState {
    pub fn catalog(&self, class: AssetClass) -> &Arc<CatalogService> {
        match class {
            AssetClass::Model => &self.models,
            AssetClass::Texture => &self.textures,
        }
    }
}
