//! Schema importer
//!
//! Groups remote catalog rows into tables, maps remote types to relational
//! types and enforces the relational engine's column-count and identifier-length
//! limits according to the configured policies. A policy failure only removes
//! the affected table; the rest of the import carries on.

use std::collections::{BTreeSet, HashMap};

use bqfdw_options::{FdwOptions, OverflowPolicy};
use bqfdw_types::mapping::postgres_type_for_remote;
use bqfdw_types::{CatalogRow, ColumnSpec, Diagnostics, MAX_IDENTIFIER_BYTES, MAX_TABLE_COLUMNS};
use thiserror::Error;

use crate::draft::TableDraft;
use crate::naming::{disambiguate, find_collisions, truncate_identifier};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("Table {schema}.{table} has {count} columns, more than the maximum of {max}")]
    TooManyColumns {
        schema: String,
        table: String,
        count: usize,
        max: usize,
    },

    #[error("Table {schema}.{table} has column names colliding after truncation: {}", .names.join(", "))]
    NameCollision {
        schema: String,
        table: String,
        names: Vec<String>,
    },

    #[error("Table {schema}.{table} has no columns left to import")]
    NoColumns { schema: String, table: String },
}

/// Schema filter supplied with the import request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SchemaRestriction {
    #[default]
    All,
    LimitTo(BTreeSet<String>),
    Except(BTreeSet<String>),
}

impl SchemaRestriction {
    /// Build from the host's restriction type (`limit`/`limit_to`, `except`) and names.
    pub fn from_host<I, S>(kind: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        match kind.trim().to_ascii_lowercase().as_str() {
            "limit" | "limit_to" => SchemaRestriction::LimitTo(names),
            "except" if !names.is_empty() => SchemaRestriction::Except(names),
            _ => SchemaRestriction::All,
        }
    }

    pub fn allows(&self, schema: &str) -> bool {
        match self {
            SchemaRestriction::All => true,
            SchemaRestriction::LimitTo(names) => names.contains(schema),
            SchemaRestriction::Except(names) => !names.contains(schema),
        }
    }
}

/// Drafts produced by an import plus the tables rejected by policy.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub drafts: Vec<TableDraft>,
    pub rejected: Vec<ImportError>,
}

pub struct SchemaImporter {
    colcount: OverflowPolicy,
    colnames: OverflowPolicy,
    max_columns: usize,
    max_identifier_bytes: usize,
    project: Option<String>,
    diagnostics: Diagnostics,
}

impl SchemaImporter {
    pub fn new(options: &FdwOptions, diagnostics: Diagnostics) -> Self {
        Self {
            colcount: options.colcount,
            colnames: options.colnames,
            max_columns: MAX_TABLE_COLUMNS,
            max_identifier_bytes: MAX_IDENTIFIER_BYTES,
            project: None,
            diagnostics: diagnostics.with_verbose(options.verbose),
        }
    }

    /// Override the relational engine limits.
    pub fn with_limits(mut self, max_columns: usize, max_identifier_bytes: usize) -> Self {
        self.max_columns = max_columns;
        self.max_identifier_bytes = max_identifier_bytes;
        self
    }

    /// Project prefixed to the `fdw_dataset` option of generated drafts.
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Catalog introspection query for one dataset (optionally `project.dataset`).
    pub fn catalog_query(dataset: &str) -> String {
        format!(
            "SELECT table_schema, table_name, column_name, data_type \
             FROM `{}`.INFORMATION_SCHEMA.COLUMNS \
             ORDER BY table_schema, table_name, ordinal_position",
            dataset
        )
    }

    pub fn import<I>(&self, rows: I, restriction: &SchemaRestriction) -> ImportReport
    where
        I: IntoIterator<Item = CatalogRow>,
    {
        let mut report = ImportReport::default();

        for ((schema, table), columns) in group_rows(rows, restriction) {
            match self.build_draft(&schema, &table, columns) {
                Ok(Some(draft)) => report.drafts.push(draft),
                Ok(None) => {}
                Err(e) => {
                    self.diagnostics.error(e.to_string());
                    report.rejected.push(e);
                }
            }
        }

        self.diagnostics.info(format!(
            "Imported {} table(s), rejected {}",
            report.drafts.len(),
            report.rejected.len()
        ));
        report
    }

    /// Apply both policies to one table. `Ok(None)` means the table was skipped.
    fn build_draft(
        &self,
        schema: &str,
        table: &str,
        mut columns: Vec<ColumnSpec>,
    ) -> Result<Option<TableDraft>, ImportError> {
        if columns.len() > self.max_columns {
            let count = columns.len();
            match self.colcount {
                OverflowPolicy::Skip => {
                    self.diagnostics.warn(format!(
                        "Skipping table {}.{}: {} columns exceeds the maximum of {}",
                        schema, table, count, self.max_columns
                    ));
                    return Ok(None);
                }
                OverflowPolicy::Trim => {
                    self.diagnostics.warn(format!(
                        "Trimming table {}.{} from {} to {} columns",
                        schema, table, count, self.max_columns
                    ));
                    columns.truncate(self.max_columns);
                }
                OverflowPolicy::Error => {
                    return Err(ImportError::TooManyColumns {
                        schema: schema.to_string(),
                        table: table.to_string(),
                        count,
                        max: self.max_columns,
                    });
                }
            }
        }

        let columns = match self.resolve_names(schema, table, columns)? {
            Some(columns) => columns,
            None => return Ok(None),
        };

        let dataset = match &self.project {
            Some(project) => format!("{}.{}", project, schema),
            None => schema.to_string(),
        };
        Ok(Some(
            TableDraft::new(schema, table, columns)
                .with_option("fdw_dataset", dataset)
                .with_option("fdw_table", table),
        ))
    }

    /// Truncate column names and resolve collisions. `Ok(None)` drops the table.
    fn resolve_names(
        &self,
        schema: &str,
        table: &str,
        columns: Vec<ColumnSpec>,
    ) -> Result<Option<Vec<ColumnSpec>>, ImportError> {
        let max = self.max_identifier_bytes;
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        let collisions = find_collisions(&names, max);

        if collisions.is_empty() {
            let columns = columns
                .iter()
                .map(|c| ColumnSpec::new(truncate_identifier(&c.name, max), c.declared_type.clone()))
                .collect();
            return Ok(Some(columns));
        }

        let colliding: Vec<String> = collisions
            .iter()
            .flat_map(|(_, group)| group.iter().map(|n| n.to_string()))
            .collect();

        let survivors: Vec<ColumnSpec> = match self.colnames {
            OverflowPolicy::Error => {
                return Err(ImportError::NameCollision {
                    schema: schema.to_string(),
                    table: table.to_string(),
                    names: colliding,
                });
            }
            OverflowPolicy::Skip => {
                self.diagnostics.warn(format!(
                    "Dropping colliding columns from {}.{}: {}",
                    schema,
                    table,
                    colliding.join(", ")
                ));
                columns
                    .iter()
                    .filter(|c| !colliding.contains(&c.name))
                    .map(|c| ColumnSpec::new(truncate_identifier(&c.name, max), c.declared_type.clone()))
                    .collect()
            }
            OverflowPolicy::Trim if columns.iter().all(|c| colliding.contains(&c.name)) => {
                // Only colliding columns remain: nothing is kept
                self.diagnostics.warn(format!(
                    "Dropping colliding columns from {}.{}: {}",
                    schema,
                    table,
                    colliding.join(", ")
                ));
                Vec::new()
            }
            OverflowPolicy::Trim => {
                let renamed = disambiguate(&names, max);
                columns
                    .iter()
                    .zip(renamed)
                    .filter_map(|(c, local)| match local {
                        Some(local) => {
                            if local != c.name {
                                self.diagnostics.info(format!(
                                    "Column {}.{}.{} imported as {}",
                                    schema, table, c.name, local
                                ));
                            }
                            Some(ColumnSpec::new(local, c.declared_type.clone()))
                        }
                        None => {
                            self.diagnostics.warn(format!(
                                "Dropping column {}.{}.{}: no unique name available",
                                schema, table, c.name
                            ));
                            None
                        }
                    })
                    .collect()
            }
        };

        if survivors.is_empty() {
            // TODO: product review on dropping tables whose columns all collide away
            self.diagnostics.warn(
                ImportError::NoColumns {
                    schema: schema.to_string(),
                    table: table.to_string(),
                }
                .to_string(),
            );
            return Ok(None);
        }
        Ok(Some(survivors))
    }
}

/// Filter by schema and group rows by `(schema, table)`, keeping first-seen order.
fn group_rows<I>(rows: I, restriction: &SchemaRestriction) -> Vec<((String, String), Vec<ColumnSpec>)>
where
    I: IntoIterator<Item = CatalogRow>,
{
    let mut groups: Vec<((String, String), Vec<ColumnSpec>)> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for row in rows {
        if !restriction.allows(&row.schema_name) {
            continue;
        }
        let column = ColumnSpec::new(row.column_name, postgres_type_for_remote(&row.remote_type));
        let key = (row.schema_name, row.table_name);
        match index.get(&key) {
            Some(&i) => groups[i].1.push(column),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![column]));
            }
        }
    }
    groups
}
