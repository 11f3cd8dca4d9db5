//! JSON-file-backed asset catalogs.
//!
//! - [`store`]: whole-file load/save of one catalog.
//! - [`reconcile`]: aligns a catalog with its asset directory.
//! - [`service`]: the owned, lock-guarded catalog used by the API.

pub mod input;
pub mod reconcile;
pub mod service;
pub mod store;

pub use input::{GeneratedAsset, Provenance, Upload, UploadForm};
pub use reconcile::ReconcileReport;
pub use service::CatalogService;
pub use store::CatalogStore;
