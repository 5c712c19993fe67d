//! Remote query generation for the BigQuery foreign data wrapper
//!
//! Converts the host's projection and predicate pushdown into a dialect-correct
//! parameterized query: see [`QueryBuilder`].

mod builder;
pub mod column;
mod parameter;
mod qualifier;
pub mod strategy;

pub use builder::{add_column_alias, BuiltQuery, QueryBuilder};
pub use column::{Column, ColumnListMode};
pub use parameter::QueryParameter;
pub use qualifier::{get_operator, Qualifier, SqlOperator};
pub use strategy::{strategy_for, DialectStrategy, LegacySql, StandardSql};
