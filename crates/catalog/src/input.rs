//! Inputs accepted by [`crate::CatalogService`] mutations.

use std::path::PathBuf;

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Original filename as sent by the client.
    pub filename: String,
    pub data: Vec<u8>,
}

/// Optional form fields that accompany an upload.
///
/// Empty strings are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Texture channel (`type` form field); ignored for models.
    pub texture_kind: Option<String>,
}

/// How a generated file came to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// Output of a fresh drawing session.
    Generated,
    /// Output of editing an existing record.
    Edited { original_record_id: String },
}

/// A file produced by the external modelling tool, ready to be registered.
#[derive(Debug, Clone)]
pub struct GeneratedAsset {
    /// Where the tool left the file. It is copied, never moved.
    pub source: PathBuf,
    pub display_name: String,
    pub description: Option<String>,
    pub provenance: Provenance,
}

/// Trimmed, non-empty value or `None`.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
