//! Persistent catalog store.
//!
//! A catalog file is a pretty-printed JSON array of records. Every save
//! rewrites the whole file. Loading never fails: a missing, unreadable or
//! malformed file is an empty catalog, and malformed entries are skipped.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use meshvault_core::assets::{AssetClass, AssetRecord, RecordDocument, CATALOG_FILENAME};

/// Load/save access to one class's catalog file.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    class: AssetClass,
    path: PathBuf,
}

impl CatalogStore {
    /// Store for the catalog file inside `asset_dir`.
    pub fn new(class: AssetClass, asset_dir: impl AsRef<Path>) -> Self {
        Self {
            class,
            path: asset_dir.as_ref().join(CATALOG_FILENAME),
        }
    }

    pub fn class(&self) -> AssetClass {
        self.class
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every valid record from the catalog file.
    pub async fn load(&self) -> Vec<AssetRecord> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No catalog file yet");
                return Vec::new();
            }
            Err(e) => {
                tracing::error!(error = %e, path = %self.path.display(), "Failed to read catalog");
                return Vec::new();
            }
        };

        let entries: Vec<serde_json::Value> = match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path = %self.path.display(),
                    "Catalog file is not a JSON array, starting empty",
                );
                return Vec::new();
            }
        };

        let mut seen_ids = HashSet::new();
        let mut seen_files = HashSet::new();
        let mut records = Vec::with_capacity(entries.len());

        for (index, entry) in entries.into_iter().enumerate() {
            let document: RecordDocument = match serde_json::from_value(entry) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping malformed catalog entry");
                    continue;
                }
            };

            let Some(record) = document.into_record(self.class) else {
                tracing::warn!(index, "Skipping catalog entry without id or filename");
                continue;
            };

            if !seen_ids.insert(record.id.clone())
                || !seen_files.insert(record.stored_filename.clone())
            {
                tracing::warn!(
                    index,
                    id = %record.id,
                    stored_filename = %record.stored_filename,
                    "Skipping duplicate catalog entry",
                );
                continue;
            }

            records.push(record);
        }

        tracing::debug!(
            class = %self.class,
            count = records.len(),
            "Catalog loaded",
        );
        records
    }

    /// Overwrite the catalog file with `records`.
    ///
    /// Returns `false` (after logging) if the file could not be written.
    pub async fn save(&self, records: &[AssetRecord]) -> bool {
        let json = match serde_json::to_vec_pretty(records) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize catalog");
                return false;
            }
        };

        if let Some(parent) = self.path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                tracing::error!(error = %e, dir = %parent.display(), "Failed to create catalog directory");
                return false;
            }
        }

        match tokio::fs::write(&self.path, json).await {
            Ok(()) => {
                tracing::debug!(class = %self.class, count = records.len(), "Catalog saved");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, path = %self.path.display(), "Failed to write catalog");
                false
            }
        }
    }
}
