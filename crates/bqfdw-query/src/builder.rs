//! Query builder
//!
//! Turns a requested column set and a list of qualifiers into a parameterized
//! remote query. Translation problems (unknown operators, unmapped types,
//! unusable casts) never fail the query: the offending piece is skipped or
//! defaulted and a diagnostic is emitted.

use std::collections::{HashMap, HashSet};

use bqfdw_options::{CastOverrides, FdwOptions, OptionsError, TableIdentity};
use bqfdw_types::mapping::{self, TemporalFamily};
use bqfdw_types::{ColumnSpec, Diagnostics, Scalar, SqlDialect};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::column::{Column, ColumnListMode, PARTITION_TIME_IDENTIFIER, PARTITION_TIME_TYPE};
use crate::parameter::QueryParameter;
use crate::qualifier::{get_operator, Qualifier, SqlOperator};
use crate::strategy::{strategy_for, DialectStrategy};

/// Output of [`QueryBuilder::build_query`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltQuery {
    pub sql: String,
    pub parameters: Vec<QueryParameter>,
    pub dialect: SqlDialect,
}

impl BuiltQuery {
    /// SHA-256 over the query text and its parameters.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sql.as_bytes());
        for parameter in &self.parameters {
            let encoded = serde_json::to_string(parameter).unwrap_or_default();
            hasher.update(encoded.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

pub struct QueryBuilder {
    identity: TableIdentity,
    strategy: &'static dyn DialectStrategy,
    group_by: bool,
    convert_tz: Option<String>,
    casting: CastOverrides,
    columns: Vec<Column>,
    by_name: HashMap<String, usize>,
    diagnostics: Diagnostics,
}

impl QueryBuilder {
    /// Build a query builder for one foreign table.
    ///
    /// Fails only when the remote table identity is missing. Cast overrides
    /// naming columns the table does not define are dropped here.
    pub fn new(
        options: &FdwOptions,
        columns: Vec<ColumnSpec>,
        diagnostics: Diagnostics,
    ) -> Result<Self, OptionsError> {
        let identity = options.table_identity()?;
        let diagnostics = diagnostics.with_verbose(options.verbose);

        let casting = options
            .casting
            .restricted_to(columns.iter().map(|c| c.name.as_str()), &diagnostics);

        let columns: Vec<Column> = columns.into_iter().map(Column::classify).collect();
        let by_name = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name().to_string(), i))
            .collect();

        Ok(Self {
            identity,
            strategy: strategy_for(options.dialect),
            group_by: options.group_by,
            convert_tz: options.convert_tz.clone(),
            casting,
            columns,
            by_name,
            diagnostics,
        })
    }

    pub fn dialect(&self) -> SqlDialect {
        self.strategy.dialect()
    }

    pub fn identity(&self) -> &TableIdentity {
        &self.identity
    }

    /// Table columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.by_name.get(name).map(|&i| &self.columns[i])
    }

    /// Resolve requested names to classified columns, keeping the requested order.
    pub fn resolve_columns(&self, names: &[&str]) -> Vec<Column> {
        names
            .iter()
            .map(|name| match self.column(name) {
                Some(column) => column.clone(),
                None => {
                    self.diagnostics.warn(format!(
                        "Column '{}' is not defined on the foreign table, treating it as text",
                        name
                    ));
                    Column::classify(ColumnSpec::new(*name, mapping::DEFAULT_POSTGRES_TYPE))
                }
            })
            .collect()
    }

    /// Compose SELECT, FROM, WHERE and (when grouping is enabled) GROUP BY.
    ///
    /// `columns: None` selects every column. With grouping enabled the
    /// non-aggregate columns form the GROUP BY list; when that list renders
    /// empty (no explicit columns, or only the count column) no `GROUP BY`
    /// keyword is emitted at all.
    pub fn build_query(&self, qualifiers: Option<&[Qualifier]>, columns: Option<&[&str]>) -> BuiltQuery {
        let resolved = columns.map(|names| self.resolve_columns(names));
        let resolved = resolved.as_deref();

        let mut sql = format!(
            "SELECT {} FROM {}",
            self.build_column_list(resolved, ColumnListMode::Select),
            self.strategy.table_reference(&self.identity)
        );

        let (clause, parameters) = self.build_where_clause(qualifiers);
        if !clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }

        if self.group_by {
            let group = self.build_column_list(resolved, ColumnListMode::GroupBy);
            if !group.is_empty() {
                sql.push_str(" GROUP BY ");
                sql.push_str(&group);
            }
        }

        let query = BuiltQuery {
            sql,
            parameters,
            dialect: self.dialect(),
        };
        self.diagnostics.debug(format!(
            "Built {} query [{}]: {}",
            query.dialect,
            &query.fingerprint()[..12],
            query.sql
        ));
        query
    }

    /// Render a column set as a SELECT list or a GROUP BY list.
    ///
    /// An absent or empty set renders as `*` for SELECT and as nothing for GROUP BY.
    pub fn build_column_list(&self, columns: Option<&[Column]>, mode: ColumnListMode) -> String {
        let columns = match columns {
            Some(columns) if !columns.is_empty() => columns,
            _ => {
                return match mode {
                    ColumnListMode::Select => "*".to_string(),
                    ColumnListMode::GroupBy => String::new(),
                }
            }
        };

        columns
            .iter()
            .filter_map(|column| {
                let expr = match column {
                    Column::Count => match mode {
                        ColumnListMode::Select => "count(*)".to_string(),
                        ColumnListMode::GroupBy => return None,
                    },
                    Column::Partition => PARTITION_TIME_IDENTIFIER.to_string(),
                    Column::Ordinary(spec) => {
                        let native = mapping::remote_type_for(&spec.declared_type, SqlDialect::Standard);
                        let expr = self.set_time_zone(&spec.name, native);
                        self.cast_column(&expr, &spec.name, native)
                    }
                };
                Some(format!("{}{}", expr, add_column_alias(column.name(), mode)))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Wrap a date/time column in the remote timezone conversion function.
    ///
    /// Passes the column through when no timezone is configured or the type is
    /// not a date/datetime type.
    pub fn set_time_zone(&self, column: &str, remote_type: &str) -> String {
        match (&self.convert_tz, TemporalFamily::of(remote_type)) {
            (Some(tz), Some(family)) => format!("{}({}, \"{}\")", family.function(), column, tz),
            _ => column.to_string(),
        }
    }

    /// Apply the column's cast override when the conversion is listed as safe.
    pub fn cast_column(&self, expr: &str, column_name: &str, native_type: &str) -> String {
        match self.casting.target_for(column_name) {
            Some(target) if mapping::is_safe_cast(native_type, target) => {
                format!("CAST({} as {})", expr, self.strategy.cast_target(target))
            }
            Some(target) => {
                self.diagnostics.debug(format!(
                    "Cast of '{}' from {} to {} is not allowed, column left as is",
                    column_name, native_type, target
                ));
                expr.to_string()
            }
            None => expr.to_string(),
        }
    }

    /// Build the `AND`-joined predicate (without the `WHERE` keyword) and its parameters.
    ///
    /// Each qualifier on a defined column yields one fragment, and one
    /// parameter unless it is a null check. Qualifiers on columns the table
    /// does not define, on the count column, or with an unsupported operator
    /// are skipped with a warning and leave the scan unfiltered on that
    /// predicate.
    pub fn build_where_clause(&self, qualifiers: Option<&[Qualifier]>) -> (String, Vec<QueryParameter>) {
        let Some(qualifiers) = qualifiers else {
            return (String::new(), Vec::new());
        };

        let mut fragments = Vec::with_capacity(qualifiers.len());
        let mut parameters = Vec::with_capacity(qualifiers.len());
        let mut names = ParameterNames::default();

        for qualifier in qualifiers {
            let Some(mut operator) = get_operator(&qualifier.operator, &self.diagnostics) else {
                continue;
            };

            let (lhs, remote_type) = match self.column(&qualifier.field_name) {
                Some(Column::Partition) => (PARTITION_TIME_IDENTIFIER.to_string(), PARTITION_TIME_TYPE),
                Some(Column::Ordinary(spec)) => (spec.name.clone(), self.strategy.remote_type(&spec.declared_type)),
                Some(Column::Count) => {
                    self.diagnostics.warn("Qualifiers on the count pseudo-column cannot be pushed down");
                    continue;
                }
                None => {
                    self.diagnostics.warn(format!(
                        "Qualifier on unknown column '{}' skipped",
                        qualifier.field_name
                    ));
                    continue;
                }
            };

            // `= NULL` / `<> NULL` arrive from some hosts instead of IS [NOT]
            if qualifier.value.is_null() {
                operator = match operator {
                    SqlOperator::Eq => SqlOperator::IsNull,
                    SqlOperator::NotEq => SqlOperator::IsNotNull,
                    other => other,
                };
            }

            if operator.is_null_check() {
                fragments.push(format!("{} {}", lhs, operator.keyword()));
                continue;
            }

            let name = names.next(&qualifier.field_name);
            match operator {
                SqlOperator::In => {
                    let values = match &qualifier.value {
                        Scalar::List(values) => values.clone(),
                        single => vec![single.clone()],
                    };
                    fragments.push(self.strategy.membership(&lhs, &name));
                    parameters.push(QueryParameter::array(name, remote_type, values));
                }
                _ => {
                    fragments.push(format!("{} {} @{}", lhs, operator.keyword(), name));
                    parameters.push(QueryParameter::scalar(name, remote_type, qualifier.value.clone()));
                }
            }
        }

        (fragments.join(" AND "), parameters)
    }

    /// Remote type of a table column, defaulting to `STRING`.
    pub fn get_bigquery_datatype(&self, column_name: &str, dialect: SqlDialect) -> &'static str {
        match self.column(column_name) {
            Some(Column::Ordinary(spec)) => mapping::remote_type_for(&spec.declared_type, dialect),
            Some(Column::Count) => mapping::remote_type_for("bigint", dialect),
            Some(Column::Partition) => PARTITION_TIME_TYPE,
            None => mapping::DEFAULT_REMOTE_TYPE,
        }
    }
}

/// `" as name"` in SELECT mode, nothing in GROUP BY mode.
pub fn add_column_alias(name: &str, mode: ColumnListMode) -> String {
    match mode {
        ColumnListMode::Select => format!(" as {}", name),
        ColumnListMode::GroupBy => String::new(),
    }
}

/// Hands out unique parameter names derived from column names.
#[derive(Default)]
struct ParameterNames {
    issued: HashSet<String>,
}

impl ParameterNames {
    fn next(&mut self, column: &str) -> String {
        let mut base: String = column
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if base.is_empty() || base.starts_with(|c: char| c.is_ascii_digit()) {
            base.insert_str(0, "p_");
        }

        // A suffixed name may itself be a column's name (`year_2`)
        let mut name = base.clone();
        let mut n = 1;
        while self.issued.contains(&name) {
            n += 1;
            name = format!("{}_{}", base, n);
        }
        self.issued.insert(name.clone());
        name
    }
}
