//! Catalog service: the single owner of one class's catalog.
//!
//! The in-memory record list sits behind a mutex. Every mutation takes the
//! lock, changes the list and rewrites the catalog file before releasing it,
//! so concurrent requests never interleave a read-modify-persist sequence.
//! Uploads and generated copies are written while the lock is held: a
//! reconciliation must never see a file whose record has not been appended
//! yet, or it would register the same file a second time.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use meshvault_core::assets::naming::{
    asset_url, basename, extension_of, file_stem, stored_filename,
};
use meshvault_core::assets::{
    AssetClass, AssetDetails, AssetRecord, TextureKind, CATEGORY_EDITED, CATEGORY_GENERATED,
    CATEGORY_UPLOADED,
};
use meshvault_core::error::CoreError;

use crate::input::{non_empty, GeneratedAsset, Provenance, Upload, UploadForm};
use crate::reconcile::{reconcile, ReconcileReport};
use crate::store::CatalogStore;

/// Material library sidecar extension for OBJ meshes.
const MTL_EXTENSION: &str = "mtl";

/// Minimum line count for a material library to count as real content.
const MTL_MIN_LINES: usize = 5;

/// Owned catalog for one asset class.
#[derive(Debug)]
pub struct CatalogService {
    class: AssetClass,
    dir: PathBuf,
    store: CatalogStore,
    records: Mutex<Vec<AssetRecord>>,
}

impl CatalogService {
    /// Open the catalog in `dir`, reconciling it with the directory contents.
    pub async fn open(class: AssetClass, dir: impl Into<PathBuf>) -> (Self, ReconcileReport) {
        let dir = dir.into();
        let store = CatalogStore::new(class, &dir);
        let (records, report) = reconcile(&store, &dir).await;

        let service = Self {
            class,
            dir,
            store,
            records: Mutex::new(records),
        };
        (service, report)
    }

    pub fn class(&self) -> AssetClass {
        self.class
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Absolute path of a record's backing file.
    pub fn file_path(&self, record: &AssetRecord) -> PathBuf {
        self.dir.join(record.expected_filename())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// All records, or those whose category equals `category` exactly.
    pub async fn list(&self, category: Option<&str>) -> Vec<AssetRecord> {
        let records = self.records.lock().await;
        match category {
            Some(category) => records
                .iter()
                .filter(|r| r.category == category)
                .cloned()
                .collect(),
            None => records.clone(),
        }
    }

    /// Distinct categories in use, sorted.
    ///
    /// Records loaded without a category already carry `"uncategorized"`.
    pub async fn list_categories(&self) -> Vec<String> {
        let records = self.records.lock().await;
        records
            .iter()
            .map(|r| r.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub async fn get(&self, id: &str) -> Result<AssetRecord, CoreError> {
        let records = self.records.lock().await;
        records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| self.not_found(id))
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Store an uploaded file and register it.
    ///
    /// The file write is fatal to the upload. A failed catalog save is only
    /// logged: the file stays on disk and the next reconciliation picks it up.
    pub async fn create(&self, upload: Upload, form: UploadForm) -> Result<AssetRecord, CoreError> {
        let original = basename(upload.filename.trim()).to_string();
        if original.is_empty() {
            return Err(CoreError::InvalidInput("No file selected".into()));
        }

        let format = extension_of(&original).ok_or_else(|| {
            CoreError::InvalidInput(format!("File '{original}' has no extension"))
        })?;
        self.class.validate_format(&format)?;

        let details = match self.class {
            AssetClass::Model => AssetDetails::plain_model(),
            AssetClass::Texture => AssetDetails::Texture {
                texture_kind: match non_empty(form.texture_kind) {
                    Some(kind) => kind.parse()?,
                    None => TextureKind::default(),
                },
            },
        };

        let id = Uuid::new_v4();
        let stored = stored_filename(id, &original, &format);
        let size = upload.data.len() as u64;

        let mut records = self.records.lock().await;
        self.write_file(&stored, &upload.data).await?;

        let display_name = non_empty(form.name).unwrap_or_else(|| file_stem(&original).to_string());
        let record = AssetRecord {
            id: id.to_string(),
            description: non_empty(form.description)
                .unwrap_or_else(|| format!("Uploaded {} {display_name}", self.class.noun())),
            display_name,
            asset_url: asset_url(self.class, &stored),
            stored_filename: stored,
            format,
            category: non_empty(form.category).unwrap_or_else(|| CATEGORY_UPLOADED.to_string()),
            file_size_bytes: size,
            created_at: Utc::now(),
            details,
        };

        records.push(record.clone());
        self.persist(&records).await;
        drop(records);

        tracing::info!(
            class = %self.class,
            id = %record.id,
            stored_filename = %record.stored_filename,
            size_bytes = size,
            "Asset uploaded",
        );
        Ok(record)
    }

    /// Remove a record and, best-effort, its backing file.
    pub async fn delete(&self, id: &str) -> Result<AssetRecord, CoreError> {
        let mut records = self.records.lock().await;
        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| self.not_found(id))?;

        let path = self.file_path(&records[index]);
        remove_file_best_effort(&path).await;
        if records[index].format == "obj" {
            remove_file_best_effort(&path.with_extension(MTL_EXTENSION)).await;
        }

        let removed = records.remove(index);
        self.persist(&records).await;

        tracing::info!(class = %self.class, id = %removed.id, "Asset deleted");
        Ok(removed)
    }

    /// Copy a file produced by the modelling tool into the catalog.
    pub async fn register_generated(&self, asset: GeneratedAsset) -> Result<AssetRecord, CoreError> {
        if self.class != AssetClass::Model {
            return Err(CoreError::InvalidInput(format!(
                "Generated assets are models, not {}s",
                self.class.noun()
            )));
        }

        let format = extension_of(&asset.source.to_string_lossy()).ok_or_else(|| {
            CoreError::InvalidInput(format!(
                "Generated file {} has no extension",
                asset.source.display()
            ))
        })?;
        self.class.validate_format(&format)?;

        let display_name = non_empty(Some(asset.display_name))
            .unwrap_or_else(|| "Generated model".to_string());

        let id = Uuid::new_v4();
        let stored = stored_filename(id, &display_name, &format);
        let dest = self.dir.join(&stored);

        let mut records = self.records.lock().await;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| storage_error("create asset directory", &self.dir, e))?;
        tokio::fs::copy(&asset.source, &dest)
            .await
            .map_err(|e| storage_error("copy generated file to", &dest, e))?;

        if format == "obj" {
            attach_material_library(&asset.source, &dest).await;
        }

        let size = tokio::fs::metadata(&dest)
            .await
            .map(|m| m.len())
            .map_err(|e| storage_error("stat", &dest, e))?;

        let (category, details, default_description) = match asset.provenance {
            Provenance::Generated => (
                CATEGORY_GENERATED,
                AssetDetails::Model {
                    is_generated: true,
                    is_edited: false,
                    original_record_id: None,
                },
                format!("Programmatically generated model {display_name}"),
            ),
            Provenance::Edited { original_record_id } => (
                CATEGORY_EDITED,
                AssetDetails::Model {
                    is_generated: true,
                    is_edited: true,
                    original_record_id: Some(original_record_id),
                },
                format!("Edited model {display_name}"),
            ),
        };

        let record = AssetRecord {
            id: id.to_string(),
            description: non_empty(asset.description).unwrap_or(default_description),
            display_name,
            asset_url: asset_url(self.class, &stored),
            stored_filename: stored,
            format,
            category: category.to_string(),
            file_size_bytes: size,
            created_at: Utc::now(),
            details,
        };

        records.push(record.clone());
        self.persist(&records).await;
        drop(records);

        tracing::info!(
            id = %record.id,
            category = %record.category,
            stored_filename = %record.stored_filename,
            "Generated model registered",
        );
        Ok(record)
    }

    /// Re-read the catalog file and reconcile it with the directory.
    pub async fn reconcile(&self) -> ReconcileReport {
        let mut records = self.records.lock().await;
        let (reconciled, report) = reconcile(&self.store, &self.dir).await;
        *records = reconciled;
        report
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn not_found(&self, id: &str) -> CoreError {
        CoreError::NotFound {
            entity: self.class.entity(),
            id: id.to_string(),
        }
    }

    async fn write_file(&self, stored: &str, data: &[u8]) -> Result<(), CoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| storage_error("create asset directory", &self.dir, e))?;
        let path = self.dir.join(stored);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| storage_error("write", &path, e))
    }

    async fn persist(&self, records: &[AssetRecord]) {
        if !self.store.save(records).await {
            tracing::warn!(
                class = %self.class,
                path = %self.store.path().display(),
                "Catalog change applied in memory but not persisted",
            );
        }
    }
}

fn storage_error(action: &str, path: &Path, e: std::io::Error) -> CoreError {
    tracing::error!(error = %e, path = %path.display(), "Failed to {action}");
    CoreError::Storage(format!("Failed to {action} {}: {e}", path.display()))
}

async fn remove_file_best_effort(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed asset file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Asset file already gone");
        }
        Err(e) => tracing::warn!(error = %e, path = %path.display(), "Failed to remove asset file"),
    }
}

/// Whether an MTL file holds real materials rather than an empty export stub.
pub fn mtl_has_content(text: &str) -> bool {
    text.contains("newmtl") && text.split('\n').count() > MTL_MIN_LINES
}

/// Bring the material library along with a copied OBJ.
///
/// A genuine sidecar is copied next to `dest` and the `mtllib` line is
/// pointed at it. Otherwise material references are stripped from the copy so
/// viewers do not go looking for a file that is not there. Failures only log:
/// the mesh itself is already registered-ready.
async fn attach_material_library(source: &Path, dest: &Path) {
    let source_mtl = source.with_extension(MTL_EXTENSION);
    let dest_mtl = dest.with_extension(MTL_EXTENSION);

    let has_content = match tokio::fs::read_to_string(&source_mtl).await {
        Ok(text) => mtl_has_content(&text),
        Err(_) => false,
    };

    if has_content {
        if let Err(e) = tokio::fs::copy(&source_mtl, &dest_mtl).await {
            tracing::warn!(error = %e, path = %source_mtl.display(), "Failed to copy material library");
            return;
        }
    }

    let obj = match tokio::fs::read_to_string(dest).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, path = %dest.display(), "Cannot rewrite material references");
            return;
        }
    };

    let mtl_name = dest_mtl
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let rewritten = rewrite_material_refs(&obj, has_content.then_some(mtl_name.as_str()));

    if rewritten != obj {
        if let Err(e) = tokio::fs::write(dest, rewritten).await {
            tracing::warn!(error = %e, path = %dest.display(), "Failed to rewrite material references");
        }
    }
}

/// Point `mtllib` at `library`, or drop material statements when `None`.
pub fn rewrite_material_refs(obj: &str, library: Option<&str>) -> String {
    let mut out = String::with_capacity(obj.len());
    for line in obj.lines() {
        let trimmed = line.trim_start();
        let is_mtllib = trimmed.starts_with("mtllib ");
        let is_usemtl = trimmed.starts_with("usemtl ");
        match library {
            Some(lib) if is_mtllib => {
                out.push_str("mtllib ");
                out.push_str(lib);
            }
            None if is_mtllib || is_usemtl => continue,
            _ => out.push_str(line),
        }
        out.push('\n');
    }
    out
}
