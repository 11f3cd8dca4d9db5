//! Headless Blender invocation.
//!
//! Blender is a black box here: a drawing session is written to a scratch
//! directory together with a generated control script, Blender runs that
//! script in background mode, and the script reports back through a JSON
//! result file. Edits use a standalone update script shipped next to the
//! drawing module.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;

use super::subprocess::{run_command, CommandError, CommandInput, CommandOutput};
use crate::drawing::{DrawingSession, ModelUpdate};
use crate::error::CoreError;

/// Python module (under the scripts directory) that executes sessions.
pub const DRAWING_MODULE: &str = "blender_draw.draw_models";

/// Update script filename inside the scripts directory.
pub const UPDATE_SCRIPT: &str = "update_model.py";

/// Default timeout for one Blender run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// How much of stdout/stderr to keep in error messages.
const ERROR_TAIL_CHARS: usize = 2000;

const CONTROL_SCRIPT_TEMPLATE: &str = r#"import json
import sys
import traceback

SCRIPTS_DIR = @SCRIPTS_DIR@
SESSION_FILE = @SESSION_FILE@
RESULT_FILE = @RESULT_FILE@

sys.path.insert(0, SCRIPTS_DIR)


def write_result(result):
    with open(RESULT_FILE, "w") as f:
        json.dump(result, f)


try:
    from @MODULE@ import execute_drawing_session

    with open(SESSION_FILE, "r") as f:
        session_data = json.load(f)

    session_id, output_path = execute_drawing_session(session_data)
    write_result({
        "success": True,
        "session_id": session_id,
        "output_path": str(output_path),
        "error": None,
    })
except Exception as e:
    write_result({
        "success": False,
        "session_id": None,
        "output_path": None,
        "error": str(e),
        "details": {"traceback": traceback.format_exc(), "sys_path": sys.path},
    })
"#;

/// What the control script writes to the result file.
#[derive(Debug, Deserialize)]
struct SessionResult {
    success: bool,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    output_path: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

/// A completed drawing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub session_id: String,
    /// Absolute path of the exported file.
    pub output_path: PathBuf,
}

/// Runs Blender in batch mode.
#[derive(Debug, Clone)]
pub struct BlenderRunner {
    executable: PathBuf,
    scripts_dir: PathBuf,
    timeout: Duration,
}

impl BlenderRunner {
    /// `scripts_dir` must contain the drawing module package and
    /// [`UPDATE_SCRIPT`]; it is also the working directory of every run.
    pub fn new(executable: impl Into<PathBuf>, scripts_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            scripts_dir: scripts_dir.into(),
            timeout,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute a drawing session and return the exported file.
    pub async fn execute_session(
        &self,
        session: &DrawingSession,
    ) -> Result<SessionOutcome, CoreError> {
        session.validate()?;

        let workspace = scratch_dir()?;
        let session_file = workspace.path().join("session.json");
        let result_file = workspace.path().join("result.json");
        let script_file = workspace.path().join("execute_drawing.py");

        let session_json = serde_json::to_vec(session)
            .map_err(|e| CoreError::Internal(format!("Failed to serialize session: {e}")))?;
        write_scratch(&session_file, &session_json).await?;
        let script = control_script(&self.scripts_dir, &session_file, &result_file);
        write_scratch(&script_file, script.as_bytes()).await?;

        let mut cmd = Command::new(&self.executable);
        cmd.arg("--background").arg("--python").arg(&script_file);

        tracing::info!(
            session_id = %session.session_id,
            commands = session.commands.len(),
            executable = %self.executable.display(),
            "Running drawing session",
        );

        let output = self.run(&mut cmd).await?;

        let Some(result) = read_result(&result_file).await else {
            return Err(CoreError::Generation(format!(
                "Blender produced no result file (exit code {}). stdout: {} stderr: {}",
                output.exit_code,
                tail(&output.stdout),
                tail(&output.stderr),
            )));
        };

        if !result.success {
            let mut message = result.error.unwrap_or_else(|| "Unknown error".into());
            if let Some(details) = result.details {
                message.push_str(&format!("\nDetails: {details}"));
            }
            return Err(CoreError::Generation(message));
        }

        let reported = result.output_path.filter(|p| !p.is_empty()).ok_or_else(|| {
            CoreError::Generation("Blender reported success without an output path".into())
        })?;
        let output_path = self.resolve(Path::new(&reported));

        if !tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
            return Err(CoreError::Generation(format!(
                "Blender reported output {} but the file does not exist",
                output_path.display()
            )));
        }

        let session_id = result
            .session_id
            .unwrap_or_else(|| session.session_id.clone());
        tracing::info!(
            session_id = %session_id,
            output = %output_path.display(),
            duration_ms = output.duration_ms,
            "Drawing session finished",
        );

        Ok(SessionOutcome {
            session_id,
            output_path,
        })
    }

    /// Apply `update` to the mesh at `source`, writing the result into
    /// `output_dir`. Returns the path of the updated OBJ.
    pub async fn update_model(
        &self,
        source: &Path,
        update: &ModelUpdate,
        output_dir: &Path,
    ) -> Result<PathBuf, CoreError> {
        update.validate()?;

        let script = self.scripts_dir.join(UPDATE_SCRIPT);
        if !tokio::fs::try_exists(&script).await.unwrap_or(false) {
            return Err(CoreError::Generation(format!(
                "Update script not found at {}",
                script.display()
            )));
        }

        let spec_file = output_dir.join("update_spec.json");
        let output_file = output_dir.join("updated.obj");
        let spec_json = serde_json::to_vec_pretty(update)
            .map_err(|e| CoreError::Internal(format!("Failed to serialize update: {e}")))?;
        write_scratch(&spec_file, &spec_json).await?;

        let mut cmd = Command::new(&self.executable);
        cmd.arg("--background")
            .arg("--python")
            .arg(&script)
            .arg("--")
            .arg("--input")
            .arg(&spec_file)
            .arg("--obj")
            .arg(source)
            .arg("--output")
            .arg(&output_file);

        tracing::info!(source = %source.display(), "Running model update");

        let output = self.run(&mut cmd).await?;
        if !output.success() {
            return Err(CoreError::Generation(format!(
                "Update script exited with code {}: {}",
                output.exit_code,
                tail(&output.stderr),
            )));
        }

        if !tokio::fs::try_exists(&output_file).await.unwrap_or(false) {
            return Err(CoreError::Generation(format!(
                "Update script finished but produced no output. stdout: {}",
                tail(&output.stdout)
            )));
        }

        Ok(output_file)
    }

    async fn run(&self, cmd: &mut Command) -> Result<CommandOutput, CoreError> {
        let mut input = CommandInput::with_timeout(self.timeout);
        input.working_directory = Some(self.scripts_dir.clone());

        let output = run_command(cmd, input).await.map_err(|e| match e {
            CommandError::Timeout { elapsed_ms } => {
                CoreError::Generation(format!("Blender execution timed out after {elapsed_ms}ms"))
            }
            other => CoreError::Generation(other.to_string()),
        })?;

        tracing::debug!(
            exit_code = output.exit_code,
            duration_ms = output.duration_ms,
            stdout = %tail(&output.stdout),
            stderr = %tail(&output.stderr),
            "Blender process exited",
        );
        Ok(output)
    }

    /// Relative paths reported by the tool are relative to its working directory.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.scripts_dir.join(path)
        }
    }
}

/// Render the control script for one session.
pub fn control_script(scripts_dir: &Path, session_file: &Path, result_file: &Path) -> String {
    CONTROL_SCRIPT_TEMPLATE
        .replace("@SCRIPTS_DIR@", &py_string(scripts_dir))
        .replace("@SESSION_FILE@", &py_string(session_file))
        .replace("@RESULT_FILE@", &py_string(result_file))
        .replace("@MODULE@", DRAWING_MODULE)
}

/// A JSON string literal is also a valid Python string literal.
fn py_string(path: &Path) -> String {
    serde_json::Value::String(path.to_string_lossy().into_owned()).to_string()
}

fn scratch_dir() -> Result<tempfile::TempDir, CoreError> {
    tempfile::Builder::new()
        .prefix("meshvault-blender-")
        .tempdir()
        .map_err(|e| CoreError::Internal(format!("Failed to create scratch directory: {e}")))
}

async fn write_scratch(path: &Path, contents: &[u8]) -> Result<(), CoreError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| CoreError::Internal(format!("Failed to write {}: {e}", path.display())))
}

async fn read_result(path: &Path) -> Option<SessionResult> {
    let bytes = tokio::fs::read(path).await.ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(result) => Some(result),
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "Unreadable Blender result file");
            None
        }
    }
}

fn tail(text: &str) -> &str {
    let text = text.trim();
    if text.len() <= ERROR_TAIL_CHARS {
        return text;
    }
    let mut start = text.len() - ERROR_TAIL_CHARS;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
