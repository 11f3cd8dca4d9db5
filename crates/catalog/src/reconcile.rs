//! Filesystem reconciliation.
//!
//! Brings a catalog in line with its asset directory:
//!
//! 1. load the catalog file
//! 2. prune records whose backing file is gone
//! 3. discover allow-listed files no record references
//! 4. persist, but only if steps 2 or 3 changed anything
//!
//! Missing files are normal drift (manual deletion, a lost volume) and are
//! only logged. A file that cannot be inspected is skipped on its own.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use meshvault_core::assets::naming::{asset_url, display_name_from_stored, extension_of};
use meshvault_core::assets::{
    AssetClass, AssetDetails, AssetRecord, CATALOG_FILENAME, CATEGORY_LOADED,
};

use crate::store::CatalogStore;

/// What a reconciliation pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Ids of records dropped because their file was missing.
    pub pruned: Vec<String>,
    /// Stored filenames of newly registered files.
    pub discovered: Vec<String>,
    /// Whether the catalog file was rewritten successfully.
    pub persisted: bool,
}

impl ReconcileReport {
    pub fn changed(&self) -> bool {
        !self.pruned.is_empty() || !self.discovered.is_empty()
    }
}

/// Run a full reconciliation of `store` against `asset_dir`.
///
/// Returns the reconciled catalog and a report of the changes.
pub async fn reconcile(store: &CatalogStore, asset_dir: &Path) -> (Vec<AssetRecord>, ReconcileReport) {
    let class = store.class();

    if let Err(e) = tokio::fs::create_dir_all(asset_dir).await {
        tracing::error!(error = %e, dir = %asset_dir.display(), "Failed to create asset directory");
    }

    let loaded = store.load().await;
    let mut report = ReconcileReport::default();

    // --- Prune ---
    let mut records = Vec::with_capacity(loaded.len());
    for record in loaded {
        if is_regular_file(&asset_dir.join(record.expected_filename())).await {
            records.push(record);
        } else {
            tracing::info!(
                class = %class,
                id = %record.id,
                file = %record.expected_filename(),
                "Backing file missing, removing record",
            );
            report.pruned.push(record.id);
        }
    }

    // --- Discover ---
    let referenced: HashSet<String> = records
        .iter()
        .flat_map(|r| [r.stored_filename.clone(), r.expected_filename().to_string()])
        .collect();

    for filename in candidate_files(asset_dir).await {
        if referenced.contains(&filename) {
            continue;
        }
        let Some(ext) = extension_of(&filename) else {
            continue;
        };
        if !class.is_allowed_format(&ext) {
            continue;
        }

        let Some(record) = discovered_record(asset_dir, &filename, &ext, class).await else {
            continue;
        };
        tracing::info!(
            class = %class,
            id = %record.id,
            file = %filename,
            "Registered untracked file",
        );
        report.discovered.push(filename);
        records.push(record);
    }

    // --- Persist ---
    if report.changed() {
        report.persisted = store.save(&records).await;
    }

    tracing::info!(
        class = %class,
        records = records.len(),
        pruned = report.pruned.len(),
        discovered = report.discovered.len(),
        persisted = report.persisted,
        "Catalog reconciled",
    );

    (records, report)
}

/// Names of the regular files in `dir`, sorted, excluding the catalog itself.
async fn candidate_files(dir: &Path) -> Vec<String> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(error = %e, dir = %dir.display(), "Failed to scan asset directory");
            return Vec::new();
        }
    };

    let mut names = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, dir = %dir.display(), "Error while scanning asset directory");
                break;
            }
        };

        let Ok(name) = entry.file_name().into_string() else {
            tracing::warn!(path = %entry.path().display(), "Skipping non UTF-8 filename");
            continue;
        };
        if name == CATALOG_FILENAME {
            continue;
        }
        if is_regular_file(&entry.path()).await {
            names.push(name);
        }
    }

    names.sort();
    names
}

async fn is_regular_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Build a `loaded` record for an untracked file, or `None` if it cannot be
/// inspected.
async fn discovered_record(
    dir: &Path,
    filename: &str,
    ext: &str,
    class: AssetClass,
) -> Option<AssetRecord> {
    let metadata = match tokio::fs::metadata(dir.join(filename)).await {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(error = %e, file = %filename, "Cannot stat untracked file, skipping");
            return None;
        }
    };

    let created_at: DateTime<Utc> = metadata
        .created()
        .or_else(|_| metadata.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    let display_name = display_name_from_stored(filename);

    Some(AssetRecord {
        id: Uuid::new_v4().to_string(),
        description: format!("{} {display_name} found in the asset directory", class.entity()),
        display_name,
        stored_filename: filename.to_string(),
        asset_url: asset_url(class, filename),
        format: ext.to_string(),
        category: CATEGORY_LOADED.to_string(),
        file_size_bytes: metadata.len(),
        created_at,
        details: AssetDetails::default_for(class),
    })
}
