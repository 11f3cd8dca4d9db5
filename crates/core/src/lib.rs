//! Domain types and pure logic for the meshvault asset service.
//!
//! Nothing in this crate touches the catalog files directly; the `catalog`
//! crate owns persistence and the `api` crate owns HTTP.

pub mod assets;
pub mod drawing;
pub mod error;
pub mod scripting;
pub mod types;
