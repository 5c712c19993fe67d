//! Property tests for WHERE clause generation

use bqfdw_options::FdwOptions;
use bqfdw_query::{Qualifier, QueryBuilder};
use bqfdw_types::{ColumnSpec, Diagnostics, Scalar};
use proptest::prelude::*;

const COLUMNS: [(&str, &str); 4] = [
    ("state", "text"),
    ("year", "bigint"),
    ("score", "double precision"),
    ("partition_date", "date"),
];

const OPERATORS: [&str; 9] = ["=", "<>", "<", "<=", ">", ">=", "~~", "!~~", "IN"];

fn builder() -> QueryBuilder {
    let options = FdwOptions {
        dataset: Some("project.dataset".to_string()),
        table: Some("events".to_string()),
        verbose: false,
        ..FdwOptions::default()
    };
    let columns = COLUMNS.iter().map(|(n, t)| ColumnSpec::new(*n, *t)).collect();
    QueryBuilder::new(&options, columns, Diagnostics::tracing(false)).unwrap()
}

fn qualifier() -> impl Strategy<Value = (Qualifier, bool)> {
    (0..COLUMNS.len(), 0..OPERATORS.len() + 2, any::<i64>()).prop_map(|(c, o, v)| {
        let field = COLUMNS[c].0;
        match o {
            o if o < OPERATORS.len() => (Qualifier::new(field, OPERATORS[o], v), false),
            o if o == OPERATORS.len() => (Qualifier::new(field, "IS NULL", Scalar::Null), true),
            _ => (Qualifier::new(field, "IS NOT NULL", Scalar::Null), true),
        }
    })
}

proptest! {
    #[test]
    fn test_one_parameter_per_non_null_check(quals in prop::collection::vec(qualifier(), 0..12)) {
        let builder = builder();
        let (quals, null_checks): (Vec<Qualifier>, Vec<bool>) = quals.into_iter().unzip();
        let (clause, parameters) = builder.build_where_clause(Some(&quals[..]));

        let expected_params = null_checks.iter().filter(|n| !**n).count();
        prop_assert_eq!(parameters.len(), expected_params);

        if quals.is_empty() {
            prop_assert_eq!(clause, "");
        } else {
            prop_assert_eq!(clause.split(" AND ").count(), quals.len());
            for parameter in &parameters {
                let reference = format!("@{}", parameter.name());
                prop_assert!(clause.contains(&reference));
            }
        }
    }

    #[test]
    fn test_unsupported_operators_are_skipped(symbol in "[*%^&]{1,3}", value in any::<i64>()) {
        let builder = builder();
        let quals = vec![Qualifier::new("year", symbol, value)];
        let (clause, parameters) = builder.build_where_clause(Some(&quals[..]));
        prop_assert_eq!(clause, "");
        prop_assert!(parameters.is_empty());
    }
}
