//! Shared types for the BigQuery foreign data wrapper core
//!
//! Holds the pieces every other crate leans on: column and value types,
//! the static type-mapping tables, the SQL dialect switch and the injected
//! diagnostics channel.

mod diagnostics;
mod dialect;
pub mod mapping;
mod types;

pub use diagnostics::{CollectingReporter, Diagnostic, Diagnostics, Reporter, Severity, TracingReporter};
pub use dialect::SqlDialect;
pub use mapping::{ConversionRule, TemporalFamily, TypeMapping};
pub use types::*;

/// Maximum number of columns a relational table may carry.
pub const MAX_TABLE_COLUMNS: usize = 1600;

/// Identifiers longer than this many bytes are truncated by the relational engine.
pub const MAX_IDENTIFIER_BYTES: usize = 63;
