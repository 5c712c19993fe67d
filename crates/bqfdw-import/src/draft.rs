use std::collections::BTreeMap;

use bqfdw_types::ColumnSpec;
use serde::Serialize;

/// Proposed foreign table definition for one remote table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDraft {
    pub schema_name: String,
    pub table_name: String,
    pub columns: Vec<ColumnSpec>,
    /// Always carries `schema` and `tablename`; the `fdw_*` entries make the
    /// table scannable with the options it was imported from.
    pub options: BTreeMap<String, String>,
}

impl TableDraft {
    pub fn new(schema_name: impl Into<String>, table_name: impl Into<String>, columns: Vec<ColumnSpec>) -> Self {
        let schema_name = schema_name.into();
        let table_name = table_name.into();
        let mut options = BTreeMap::new();
        options.insert("schema".to_string(), schema_name.clone());
        options.insert("tablename".to_string(), table_name.clone());
        Self {
            schema_name,
            table_name,
            columns,
            options,
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// `CREATE FOREIGN TABLE` statement for this draft.
    pub fn to_sql(&self, local_schema: &str, server: &str) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("    {} {}", quote_ident(&c.name), c.declared_type))
            .collect::<Vec<_>>()
            .join(",\n");

        let options = self
            .options
            .iter()
            .filter(|(k, _)| k.starts_with("fdw_"))
            .map(|(k, v)| format!("{} {}", k, quote_literal(v)))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!(
            "CREATE FOREIGN TABLE {}.{} (\n{}\n) SERVER {}",
            quote_ident(local_schema),
            quote_ident(&self.table_name),
            columns,
            quote_ident(server)
        );
        if !options.is_empty() {
            sql.push_str(&format!(" OPTIONS ({})", options));
        }
        sql.push(';');
        sql
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
