//! Execution shim
//!
//! Binds generated queries to a [`RemoteClient`] and exposes the results as a
//! lazy [`Scan`]. Also drives schema import from the remote catalog.

mod client;
mod scan;
mod table;

pub use client::{
    ClientError, Fixture, QueryHandle, RawRow, RawRows, RecordedQuery, RemoteClient, StaticClient,
};
pub use scan::{CancelToken, Row, Scan};
pub use table::{import_foreign_schema, ForeignTable};
