//! Dialect strategies
//!
//! The two dialects differ in type names, table reference syntax and array
//! membership. Everything dialect-specific goes through [`DialectStrategy`].

use bqfdw_options::TableIdentity;
use bqfdw_types::mapping::{self, TYPE_MAPPINGS};
use bqfdw_types::SqlDialect;

pub trait DialectStrategy: Send + Sync {
    fn dialect(&self) -> SqlDialect;

    /// Remote type name for a relational type, `STRING` when unmapped.
    fn remote_type(&self, postgres_type: &str) -> &'static str {
        mapping::remote_type_for(postgres_type, self.dialect())
    }

    /// Spelling of a cast target given its standard-dialect name.
    fn cast_target(&self, standard: &str) -> String;

    /// Fully qualified `FROM` target.
    fn table_reference(&self, identity: &TableIdentity) -> String;

    /// `lhs IN <array parameter>`.
    fn membership(&self, lhs: &str, param: &str) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardSql;

#[derive(Debug, Clone, Copy, Default)]
pub struct LegacySql;

impl DialectStrategy for StandardSql {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::Standard
    }

    fn cast_target(&self, standard: &str) -> String {
        standard.to_ascii_uppercase()
    }

    fn table_reference(&self, identity: &TableIdentity) -> String {
        format!("`{}.{}`", identity.dataset, identity.table)
    }

    fn membership(&self, lhs: &str, param: &str) -> String {
        format!("{} IN UNNEST(@{})", lhs, param)
    }
}

impl DialectStrategy for LegacySql {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::Legacy
    }

    fn cast_target(&self, standard: &str) -> String {
        TYPE_MAPPINGS
            .iter()
            .find(|m| m.standard.eq_ignore_ascii_case(standard))
            .map(|m| m.legacy.to_string())
            .unwrap_or_else(|| standard.to_ascii_uppercase())
    }

    fn table_reference(&self, identity: &TableIdentity) -> String {
        match identity.split_project() {
            (Some(project), dataset) => format!("[{}:{}.{}]", project, dataset, identity.table),
            (None, dataset) => format!("[{}.{}]", dataset, identity.table),
        }
    }

    fn membership(&self, lhs: &str, param: &str) -> String {
        format!("{} IN (@{})", lhs, param)
    }
}

pub fn strategy_for(dialect: SqlDialect) -> &'static dyn DialectStrategy {
    match dialect {
        SqlDialect::Standard => &StandardSql,
        SqlDialect::Legacy => &LegacySql,
    }
}
