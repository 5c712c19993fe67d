//! Remote client seam
//!
//! The network client is an external collaborator. [`RemoteClient`] is the
//! contract the wrapper needs from it; [`StaticClient`] answers from in-memory
//! or fixture data.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use bqfdw_query::QueryParameter;
use bqfdw_types::{CatalogRow, SqlDialect};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to connect to the remote service: {0}")]
    Connect(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Unknown result handle: {0}")]
    UnknownHandle(Uuid),

    #[error("Failed to read fixture: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid fixture: {0}")]
    Fixture(#[from] serde_json::Error),
}

/// One result tuple as returned by the remote service.
pub type RawRow = Vec<serde_json::Value>;

/// Lazy, forward-only sequence of result tuples.
pub type RawRows<'a> = Box<dyn Iterator<Item = Result<RawRow, ClientError>> + 'a>;

/// Identifies a submitted query job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryHandle {
    pub job_id: Uuid,
}

impl QueryHandle {
    pub fn new() -> Self {
        Self { job_id: Uuid::new_v4() }
    }
}

impl Default for QueryHandle {
    fn default() -> Self {
        Self::new()
    }
}

pub trait RemoteClient {
    /// Submit a query. Blocks until the remote service accepts it.
    fn run_query(
        &self,
        sql: &str,
        parameters: &[QueryParameter],
        dialect: SqlDialect,
    ) -> Result<QueryHandle, ClientError>;

    /// Stream the tuples of a submitted query.
    fn read_result(&self, handle: &QueryHandle) -> Result<RawRows<'_>, ClientError>;
}

/// A query the [`StaticClient`] received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub sql: String,
    pub parameters: Vec<QueryParameter>,
    pub dialect: SqlDialect,
}

/// Fixture file layout understood by [`StaticClient::from_fixture`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub catalog: Vec<CatalogRow>,
    #[serde(default)]
    pub rows: Vec<RawRow>,
}

/// Client answering from canned data.
///
/// Catalog queries (anything reading `INFORMATION_SCHEMA`) return the catalog
/// rows as `(schema, table, column, type)` tuples; every other query returns
/// the canned result rows as-is.
#[derive(Debug, Default)]
pub struct StaticClient {
    fixture: Fixture,
    pending: Mutex<HashMap<Uuid, Vec<RawRow>>>,
    executed: Mutex<Vec<RecordedQuery>>,
}

impl StaticClient {
    pub fn new(fixture: Fixture) -> Self {
        Self {
            fixture,
            ..Self::default()
        }
    }

    /// Load a JSON fixture. A missing or unreadable file is a connection failure.
    pub fn from_fixture<P: AsRef<Path>>(path: P) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Connect(format!("{}: {}", path.display(), e)))?;
        let fixture: Fixture = serde_json::from_str(&contents)?;
        Ok(Self::new(fixture))
    }

    pub fn with_rows(mut self, rows: Vec<RawRow>) -> Self {
        self.fixture.rows = rows;
        self
    }

    pub fn with_catalog(mut self, catalog: Vec<CatalogRow>) -> Self {
        self.fixture.catalog = catalog;
        self
    }

    /// Queries received so far, oldest first.
    pub fn executed(&self) -> Vec<RecordedQuery> {
        self.executed.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl RemoteClient for StaticClient {
    fn run_query(
        &self,
        sql: &str,
        parameters: &[QueryParameter],
        dialect: SqlDialect,
    ) -> Result<QueryHandle, ClientError> {
        let result = if sql.contains("INFORMATION_SCHEMA") {
            self.fixture
                .catalog
                .iter()
                .map(|row| {
                    vec![
                        row.schema_name.clone().into(),
                        row.table_name.clone().into(),
                        row.column_name.clone().into(),
                        row.remote_type.clone().into(),
                    ]
                })
                .collect()
        } else {
            self.fixture.rows.clone()
        };

        let handle = QueryHandle::new();
        self.pending
            .lock()
            .map_err(|e| ClientError::Query(e.to_string()))?
            .insert(handle.job_id, result);
        self.executed
            .lock()
            .map_err(|e| ClientError::Query(e.to_string()))?
            .push(RecordedQuery {
                sql: sql.to_string(),
                parameters: parameters.to_vec(),
                dialect,
            });
        Ok(handle)
    }

    fn read_result(&self, handle: &QueryHandle) -> Result<RawRows<'_>, ClientError> {
        let rows = self
            .pending
            .lock()
            .map_err(|e| ClientError::Query(e.to_string()))?
            .remove(&handle.job_id)
            .ok_or(ClientError::UnknownHandle(handle.job_id))?;
        Ok(Box::new(rows.into_iter().map(Ok)))
    }
}
