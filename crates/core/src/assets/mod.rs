//! Asset catalog domain: asset classes, records, and file naming.
//!
//! Two asset classes (models and textures) share one record shape. Every
//! class-specific field lives in [`record::AssetDetails`].

pub mod class;
pub mod naming;
pub mod record;

pub use class::AssetClass;
pub use record::{AssetDetails, AssetRecord, RecordDocument, TextureKind};

// ---------------------------------------------------------------------------
// Category constants
// ---------------------------------------------------------------------------

/// Records created through an upload request.
pub const CATEGORY_UPLOADED: &str = "uploaded";
/// Records discovered on disk during reconciliation.
pub const CATEGORY_LOADED: &str = "loaded";
/// Records produced by a drawing session.
pub const CATEGORY_GENERATED: &str = "generated";
/// Records produced by editing an existing model.
pub const CATEGORY_EDITED: &str = "edited";
/// Substituted for records without a category.
pub const CATEGORY_UNCATEGORIZED: &str = "uncategorized";

/// Name of the per-class catalog file inside the asset directory.
pub const CATALOG_FILENAME: &str = "catalog.json";
