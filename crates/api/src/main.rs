use std::net::SocketAddr;
use std::sync::Arc;

use meshvault_catalog::CatalogService;
use meshvault_core::assets::AssetClass;
use meshvault_core::scripting::BlenderRunner;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meshvault_api::config::ServerConfig;
use meshvault_api::router::build_app_router;
use meshvault_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "meshvault_api=debug,meshvault_catalog=debug,meshvault_core=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Catalogs ---
    // Opening a catalog reconciles it with its directory.
    let (models, report) = CatalogService::open(AssetClass::Model, &config.models_dir).await;
    tracing::info!(
        dir = %config.models_dir.display(),
        pruned = report.pruned.len(),
        discovered = report.discovered.len(),
        "Model catalog ready",
    );
    let (textures, report) = CatalogService::open(AssetClass::Texture, &config.textures_dir).await;
    tracing::info!(
        dir = %config.textures_dir.display(),
        pruned = report.pruned.len(),
        discovered = report.discovered.len(),
        "Texture catalog ready",
    );

    // --- Modelling tool ---
    let blender = BlenderRunner::new(
        &config.blender.executable,
        &config.blender.scripts_dir,
        config.blender.timeout(),
    );
    tracing::info!(
        executable = %config.blender.executable.display(),
        scripts_dir = %config.blender.scripts_dir.display(),
        "Blender runner configured",
    );

    // --- App state ---
    let state = AppState {
        models: Arc::new(models),
        textures: Arc::new(textures),
        blender: Arc::new(blender),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
