//! Predicate qualifiers and the operator vocabulary

use bqfdw_types::{Diagnostics, Scalar};
use serde::Serialize;

/// One pushed-down predicate fragment: `field operator value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Qualifier {
    pub field_name: String,
    pub operator: String,
    pub value: Scalar,
}

impl Qualifier {
    pub fn new(field_name: impl Into<String>, operator: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self {
            field_name: field_name.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Like,
    NotLike,
    In,
    IsNull,
    IsNotNull,
}

impl SqlOperator {
    /// Remote SQL keyword for this operator.
    pub fn keyword(&self) -> &'static str {
        match self {
            SqlOperator::Eq => "=",
            SqlOperator::NotEq => "<>",
            SqlOperator::Lt => "<",
            SqlOperator::LtEq => "<=",
            SqlOperator::Gt => ">",
            SqlOperator::GtEq => ">=",
            SqlOperator::Like => "LIKE",
            SqlOperator::NotLike => "NOT LIKE",
            SqlOperator::In => "IN",
            SqlOperator::IsNull => "IS NULL",
            SqlOperator::IsNotNull => "IS NOT NULL",
        }
    }

    /// Null checks take no bind parameter.
    pub fn is_null_check(&self) -> bool {
        matches!(self, SqlOperator::IsNull | SqlOperator::IsNotNull)
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol.trim().to_ascii_uppercase().as_str() {
            "=" | "==" => SqlOperator::Eq,
            "<>" | "!=" => SqlOperator::NotEq,
            "<" => SqlOperator::Lt,
            "<=" => SqlOperator::LtEq,
            ">" => SqlOperator::Gt,
            ">=" => SqlOperator::GtEq,
            "~~" | "LIKE" => SqlOperator::Like,
            "!~~" | "NOT LIKE" => SqlOperator::NotLike,
            "IN" | "= ANY" => SqlOperator::In,
            "IS" | "IS NULL" => SqlOperator::IsNull,
            "IS NOT" | "IS NOT NULL" => SqlOperator::IsNotNull,
            _ => return None,
        };
        Some(op)
    }
}

/// Map a host operator symbol to a remote operator.
///
/// Unsupported symbols yield `None` and a warning; the caller skips the qualifier.
pub fn get_operator(symbol: &str, diagnostics: &Diagnostics) -> Option<SqlOperator> {
    let op = SqlOperator::from_symbol(symbol);
    if op.is_none() {
        diagnostics.warn(format!("Operator '{}' is not supported, qualifier skipped", symbol));
    }
    op
}
