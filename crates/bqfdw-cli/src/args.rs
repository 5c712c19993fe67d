//! Command-line predicate and column arguments

use anyhow::{bail, Result};
use bqfdw_query::Qualifier;
use bqfdw_types::Scalar;

/// Operator spellings accepted in `--where`, longest first so `<=` wins over `<`.
const OPERATORS: &[&str] = &[
    "IS NOT NULL",
    "IS NULL",
    "NOT LIKE",
    "LIKE",
    "IN",
    "!~~",
    "~~",
    "<>",
    "!=",
    "<=",
    ">=",
    "==",
    "=",
    "<",
    ">",
];

/// Parse `column operator value`, e.g. `number > 1000` or `state IN ["CA","NY"]`.
///
/// The value is read as JSON when it parses as JSON and as a plain string
/// otherwise. Null checks take no value.
pub fn parse_qualifier(input: &str) -> Result<Qualifier> {
    let input = input.trim();
    let Some((column, rest)) = input.split_once(char::is_whitespace) else {
        bail!("expected '<column> <operator> [value]', got '{}'", input);
    };
    let rest = rest.trim_start();

    for op in OPERATORS {
        let Some(head) = rest.get(..op.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(op) {
            continue;
        }
        let value = rest[op.len()..].trim();
        let is_word = op.chars().all(|c| c.is_ascii_alphabetic() || c == ' ');
        if is_word && !value.is_empty() && !rest[op.len()..].starts_with(char::is_whitespace) {
            continue;
        }

        if op.starts_with("IS") {
            if !value.is_empty() {
                bail!("'{}' takes no value", op);
            }
            return Ok(Qualifier::new(column, *op, Scalar::Null));
        }
        if value.is_empty() {
            bail!("missing value after '{}' in '{}'", op, input);
        }
        return Ok(Qualifier::new(column, *op, parse_value(value)));
    }

    // Leave unknown operators to the builder, which skips them with a warning
    match rest.split_once(char::is_whitespace) {
        Some((op, value)) => Ok(Qualifier::new(column, op, parse_value(value.trim()))),
        None => bail!("expected '<column> <operator> [value]', got '{}'", input),
    }
}

fn parse_value(value: &str) -> Scalar {
    match serde_json::from_str::<serde_json::Value>(value) {
        Ok(json) => Scalar::from(json),
        Err(_) => Scalar::from(value),
    }
}

/// Split a comma-separated column list, dropping empty entries.
pub fn parse_columns(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison() {
        let q = parse_qualifier("number >= 1000").unwrap();
        assert_eq!(q.field_name, "number");
        assert_eq!(q.operator, ">=");
        assert_eq!(q.value, Scalar::Int(1000));
    }

    #[test]
    fn test_string_values() {
        assert_eq!(parse_qualifier("state = CA").unwrap().value, Scalar::from("CA"));
        assert_eq!(parse_qualifier(r#"state = "CA""#).unwrap().value, Scalar::from("CA"));
        assert_eq!(parse_qualifier("name like M%").unwrap().operator, "LIKE");
    }

    #[test]
    fn test_null_checks() {
        let q = parse_qualifier("gender is not null").unwrap();
        assert_eq!(q.operator, "IS NOT NULL");
        assert_eq!(q.value, Scalar::Null);
        assert!(parse_qualifier("gender IS NULL 3").is_err());
    }

    #[test]
    fn test_membership() {
        let q = parse_qualifier(r#"state IN ["CA", "NY"]"#).unwrap();
        assert_eq!(q.operator, "IN");
        assert_eq!(q.value, Scalar::List(vec![Scalar::from("CA"), Scalar::from("NY")]));
    }

    #[test]
    fn test_word_operator_needs_separator() {
        // `INDEX` is not `IN` followed by a value
        let q = parse_qualifier("state INDEX 3").unwrap();
        assert_eq!(q.operator, "INDEX");
    }

    #[test]
    fn test_malformed() {
        assert!(parse_qualifier("number").is_err());
        assert!(parse_qualifier("number >").is_err());
    }

    #[test]
    fn test_parse_columns() {
        assert_eq!(parse_columns("state, number,,"), vec!["state", "number"]);
    }
}
