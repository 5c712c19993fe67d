//! Foreign schema import
//!
//! Turns remote catalog rows into [`TableDraft`]s the host engine can register
//! as foreign tables.

mod draft;
mod importer;
pub mod naming;

pub use draft::TableDraft;
pub use importer::{ImportError, ImportReport, SchemaImporter, SchemaRestriction};
