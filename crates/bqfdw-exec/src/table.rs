use bqfdw_import::{ImportReport, SchemaImporter, SchemaRestriction};
use bqfdw_query::{BuiltQuery, Qualifier, QueryBuilder};
use bqfdw_types::{CatalogRow, Diagnostics, SqlDialect};
use serde_json::Value;

use crate::client::{ClientError, RemoteClient};
use crate::scan::{CancelToken, Scan};

/// A foreign table bound to a remote client.
///
/// Connecting happens once, at construction. A failed connection is reported
/// and leaves the table without a client: every scan is then empty.
pub struct ForeignTable<C> {
    builder: QueryBuilder,
    client: Option<C>,
    diagnostics: Diagnostics,
}

impl<C: RemoteClient> ForeignTable<C> {
    pub fn connect<F>(builder: QueryBuilder, connect: F, diagnostics: Diagnostics) -> Self
    where
        F: FnOnce() -> Result<C, ClientError>,
    {
        let client = match connect() {
            Ok(client) => Some(client),
            Err(e) => {
                diagnostics.error(format!(
                    "Could not connect for table {}: {}",
                    builder.identity(),
                    e
                ));
                None
            }
        };
        Self {
            builder,
            client,
            diagnostics,
        }
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    pub fn client(&self) -> Option<&C> {
        self.client.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Build and submit the query for one scan.
    ///
    /// `columns: None` means every table column, in declaration order. The
    /// remote query then names those columns explicitly, so pseudo-columns
    /// render as their expressions and row values line up with the names.
    pub fn scan(
        &self,
        qualifiers: Option<&[Qualifier]>,
        columns: Option<&[&str]>,
        cancel: CancelToken,
    ) -> Scan<'_> {
        let names: Vec<String> = match columns {
            Some(requested) => requested.iter().map(|c| c.to_string()).collect(),
            None => self
                .builder
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
        };

        let Some(client) = self.client.as_ref() else {
            return Scan::empty(names, self.diagnostics.clone());
        };

        let projection: Vec<&str> = names.iter().map(String::as_str).collect();
        let query = self.builder.build_query(qualifiers, Some(projection.as_slice()));
        match submit(client, &query) {
            Ok(rows) => Scan::new(names, rows, cancel, self.diagnostics.clone()),
            Err(e) => {
                self.diagnostics.error(format!(
                    "Query against {} failed: {}",
                    self.builder.identity(),
                    e
                ));
                Scan::empty(names, self.diagnostics.clone())
            }
        }
    }
}

fn submit<'c, C: RemoteClient>(
    client: &'c C,
    query: &BuiltQuery,
) -> Result<crate::client::RawRows<'c>, ClientError> {
    let handle = client.run_query(&query.sql, &query.parameters, query.dialect)?;
    client.read_result(&handle)
}

/// Fetch the catalog of `dataset` through `client` and run it through `importer`.
///
/// Catalog tuples that are not `(schema, table, column, type)` are skipped with
/// a warning. A client failure is returned to the caller.
pub fn import_foreign_schema<C: RemoteClient>(
    client: &C,
    dataset: &str,
    importer: &SchemaImporter,
    restriction: &SchemaRestriction,
    diagnostics: &Diagnostics,
) -> Result<ImportReport, ClientError> {
    let sql = SchemaImporter::catalog_query(dataset);
    let handle = client.run_query(&sql, &[], SqlDialect::Standard)?;

    let mut rows = Vec::new();
    for raw in client.read_result(&handle)? {
        let raw = raw?;
        match <[Value; 4]>::try_from(raw) {
            Ok([schema, table, column, remote_type]) => rows.push(CatalogRow::new(
                text_of(schema),
                text_of(table),
                text_of(column),
                text_of(remote_type),
            )),
            Err(raw) => diagnostics.warn(format!(
                "Skipping catalog row with {} values: {:?}",
                raw.len(),
                raw
            )),
        }
    }
    diagnostics.debug(format!("Fetched {} catalog rows for {}", rows.len(), dataset));

    Ok(importer.import(rows, restriction))
}

fn text_of(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
