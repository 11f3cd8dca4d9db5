//! Handlers shared by the model and texture catalogs.
//!
//! The catalog a request targets is injected by the router as an
//! `Extension<AssetClass>`.

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use meshvault_catalog::{GeneratedAsset, Provenance, ReconcileReport, Upload, UploadForm};
use meshvault_core::assets::naming::basename;
use meshvault_core::assets::{AssetClass, AssetRecord, CATALOG_FILENAME};
use meshvault_core::drawing::ModelUpdate;
use meshvault_core::error::CoreError;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::error::{AppError, AppResult};
use crate::query::CategoryFilter;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/{class}?category=
pub async fn list(
    State(state): State<AppState>,
    Extension(class): Extension<AssetClass>,
    Query(filter): Query<CategoryFilter>,
) -> AppResult<Json<DataResponse<Vec<AssetRecord>>>> {
    let records = state.catalog(class).list(filter.as_filter()).await;
    Ok(Json(DataResponse { data: records }))
}

/// GET /api/{class}/categories
pub async fn list_categories(
    State(state): State<AppState>,
    Extension(class): Extension<AssetClass>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let categories = state.catalog(class).list_categories().await;
    Ok(Json(DataResponse { data: categories }))
}

/// GET /api/{class}/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(class): Extension<AssetClass>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<AssetRecord>>> {
    let record = state.catalog(class).get(&id).await?;
    Ok(Json(DataResponse { data: record }))
}

/// POST /api/{class}
///
/// Accepts a multipart form with a required `file` field and optional `name`,
/// `description` and `category` fields. Textures also take `type` (the
/// texture channel, `diffuse` when absent).
pub async fn upload(
    State(state): State<AppState>,
    Extension(class): Extension<AssetClass>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<AssetRecord>>)> {
    let mut file: Option<Upload> = None;
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some(Upload {
                    filename,
                    data: data.to_vec(),
                });
            }
            "name" | "description" | "category" | "type" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                let slot = match name.as_str() {
                    "name" => &mut form.name,
                    "description" => &mut form.description,
                    "category" => &mut form.category,
                    _ => &mut form.texture_kind,
                };
                *slot = Some(text);
            }
            _ => {} // ignore unknown fields
        }
    }

    let file = file.ok_or_else(|| AppError::BadRequest("No file part in the request".into()))?;

    let record = state.catalog(class).create(file, form).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: record })))
}

/// DELETE /api/{class}/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(class): Extension<AssetClass>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.catalog(class).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/{class}/reconcile
pub async fn reconcile(
    State(state): State<AppState>,
    Extension(class): Extension<AssetClass>,
) -> AppResult<Json<DataResponse<ReconcileReport>>> {
    let report = state.catalog(class).reconcile().await;
    Ok(Json(DataResponse { data: report }))
}

/// GET /api/{class}/{id}/file
///
/// Streams the backing file. A record whose file has vanished yields 404 from
/// the file service; the next reconciliation drops the record.
pub async fn file(
    State(state): State<AppState>,
    Extension(class): Extension<AssetClass>,
    Path(id): Path<String>,
    request: Request,
) -> AppResult<Response> {
    let catalog = state.catalog(class);
    let record = catalog.get(&id).await?;
    let path = catalog.file_path(&record);

    let response = ServeFile::new(path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});
    Ok(response.into_response())
}

/// GET /models/{file}, GET /textures/{file}
///
/// Serves a stored file by name, which is what asset URLs point at. The
/// catalog file lives in the same directory and is never served.
pub async fn stored_file(
    State(state): State<AppState>,
    Extension(class): Extension<AssetClass>,
    Path(file): Path<String>,
    request: Request,
) -> AppResult<Response> {
    if !is_servable(&file) {
        return Err(CoreError::NotFound {
            entity: "File",
            id: file,
        }
        .into());
    }

    let path = state.catalog(class).dir().join(&file);
    let response = ServeFile::new(path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});
    Ok(response.into_response())
}

/// A plain file name inside the asset directory, other than the catalog.
fn is_servable(file: &str) -> bool {
    !file.is_empty()
        && !file.starts_with('.')
        && basename(file) == file
        && !file.eq_ignore_ascii_case(CATALOG_FILENAME)
}

/// POST /api/models/{id}/update
///
/// Applies transform and material changes to an OBJ model through the
/// modelling tool and registers the result as a new `edited` record. The
/// original record is left untouched.
pub async fn update_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ModelUpdate>,
) -> AppResult<(StatusCode, Json<DataResponse<AssetRecord>>)> {
    update.validate()?;

    let original = state.models.get(&id).await?;
    if original.format != "obj" {
        return Err(CoreError::InvalidInput(format!(
            "Only OBJ models can be updated, this one is {}",
            original.format
        ))
        .into());
    }

    let source = state.models.file_path(&original);
    let workspace = tempfile::tempdir()
        .map_err(|e| AppError::InternalError(format!("Failed to create scratch dir: {e}")))?;

    let output = state
        .blender
        .update_model(&source, &update, workspace.path())
        .await?;

    let record = state
        .models
        .register_generated(GeneratedAsset {
            source: output,
            display_name: format!("{} (edited)", original.display_name),
            description: Some(format!("Edited version of {}", original.display_name)),
            provenance: Provenance::Edited {
                original_record_id: original.id.clone(),
            },
        })
        .await?;

    tracing::info!(original_id = %original.id, id = %record.id, "Model updated");
    Ok((StatusCode::CREATED, Json(DataResponse { data: record })))
}
