use std::path::PathBuf;
use std::time::Duration;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// Timeout for catalog requests in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Largest accepted request body (default: 100 MiB).
    pub max_upload_bytes: usize,
    /// Model files and their `catalog.json`.
    pub models_dir: PathBuf,
    /// Texture files and their `catalog.json`.
    pub textures_dir: PathBuf,
    pub blender: BlenderConfig,
}

/// How to reach the external modelling tool.
///
/// The Blender-side Python scripts are not part of this workspace. They are
/// deployed alongside Blender and `BLENDER_SCRIPTS_DIR` points at them:
///
/// ```text
/// $BLENDER_SCRIPTS_DIR/
///   blender_draw/
///     __init__.py
///     draw_models.py    execute_drawing_session(session) -> (session_id, output_path)
///   update_model.py     -- --input <update.json> --obj <source.obj> --output <edited.obj>
/// ```
///
/// `execute_drawing_session` receives the session JSON as a dict and returns
/// the id and path of the exported file. `update_model.py` reads the update
/// JSON and writes the edited OBJ to `--output`. Without these files the
/// catalog still works; the draw and update routes answer 502.
#[derive(Debug, Clone)]
pub struct BlenderConfig {
    pub executable: PathBuf,
    /// Directory holding the drawing module and the update script
    /// (`BLENDER_SCRIPTS_DIR`, default `blender`).
    pub scripts_dir: PathBuf,
    pub timeout_secs: u64,
}

impl BlenderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Request timeout for routes that run the tool: its own timeout plus
    /// headroom for copying and registering the result.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs + 30)
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `5000`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `MAX_UPLOAD_BYTES`     | `104857600`             |
    /// | `MODELS_DIR`           | `uploads/models`        |
    /// | `TEXTURES_DIR`         | `uploads/textures`      |
    /// | `BLENDER_EXECUTABLE`   | `blender`               |
    /// | `BLENDER_SCRIPTS_DIR`  | `blender`               |
    /// | `BLENDER_TIMEOUT_SECS` | `300`                   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| "104857600".into())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let models_dir = env_path("MODELS_DIR", "uploads/models");
        let textures_dir = env_path("TEXTURES_DIR", "uploads/textures");

        let blender = BlenderConfig {
            executable: env_path("BLENDER_EXECUTABLE", "blender"),
            scripts_dir: env_path("BLENDER_SCRIPTS_DIR", "blender"),
            timeout_secs: std::env::var("BLENDER_TIMEOUT_SECS")
                .unwrap_or_else(|_| "300".into())
                .parse()
                .expect("BLENDER_TIMEOUT_SECS must be a valid u64"),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            models_dir,
            textures_dir,
            blender,
        }
    }
}

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}
