//! Wrapper option parsing
//!
//! The host hands the wrapper a flat string map. It is parsed once into an
//! immutable [`FdwOptions`]; invalid values fall back to documented defaults
//! with a diagnostic, and only missing required identity options are errors.

mod casting;
mod policy;

use std::collections::HashMap;

use bqfdw_types::{Diagnostics, SqlDialect};
use thiserror::Error;

pub use casting::CastOverrides;
pub use policy::OverflowPolicy;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("Missing required option: {0}")]
    MissingOption(&'static str),
}

/// Fully qualified remote table, `dataset` optionally prefixed by a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableIdentity {
    pub dataset: String,
    pub table: String,
}

impl TableIdentity {
    pub fn new(dataset: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            table: table.into(),
        }
    }

    /// `(project, dataset)` when the dataset carries a project prefix.
    pub fn split_project(&self) -> (Option<&str>, &str) {
        match self.dataset.split_once('.') {
            Some((project, dataset)) => (Some(project), dataset),
            None => (None, self.dataset.as_str()),
        }
    }
}

impl std::fmt::Display for TableIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.dataset, self.table)
    }
}

/// Parsed wrapper configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FdwOptions {
    pub dataset: Option<String>,
    pub table: Option<String>,
    /// Defaults to standard when absent or invalid.
    pub dialect: SqlDialect,
    /// Emit a GROUP BY over the requested columns. Default false.
    pub group_by: bool,
    /// Default true.
    pub verbose: bool,
    pub casting: CastOverrides,
    /// Target timezone for date/time columns.
    pub convert_tz: Option<String>,
    /// Column-count overflow policy for imports. Default error.
    pub colcount: OverflowPolicy,
    /// Identifier-collision policy for imports. Default error.
    pub colnames: OverflowPolicy,
}

impl Default for FdwOptions {
    fn default() -> Self {
        Self {
            dataset: None,
            table: None,
            dialect: SqlDialect::Standard,
            group_by: false,
            verbose: true,
            casting: CastOverrides::default(),
            convert_tz: None,
            colcount: OverflowPolicy::default(),
            colnames: OverflowPolicy::default(),
        }
    }
}

fn canonical_key(key: &str) -> String {
    let lowered = key.trim().to_ascii_lowercase();
    match lowered.strip_prefix("fdw_") {
        Some(stripped) => stripped.to_string(),
        None => lowered,
    }
}

/// Rank of a raw key when several spell the same option; higher wins.
///
/// `fdw_`-prefixed keys beat bare ones, and the `timezone` alias loses to
/// any spelling of `convert_tz`.
fn key_precedence(key: &str) -> u8 {
    let prefixed = key.trim().to_ascii_lowercase().starts_with("fdw_");
    let alias = canonical_key(key) == "timezone";
    u8::from(!alias) * 2 + u8::from(prefixed)
}

/// Boolean option strings; anything unrecognised is false.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "t" | "yes" | "y" | "on" | "1"
    )
}

impl FdwOptions {
    /// Parse the host's option map. Never fails; see [`FdwOptions::table_identity`]
    /// for the required identity check.
    pub fn parse(options: &HashMap<String, String>, diagnostics: &Diagnostics) -> Self {
        // Applied lowest precedence first so the winning spelling is set last
        let mut entries: Vec<(u8, String, &str)> = options
            .iter()
            .map(|(k, v)| (key_precedence(k), canonical_key(k), v.as_str()))
            .collect();
        entries.sort();

        let mut parsed = FdwOptions::default();

        if let Some((_, _, verbose)) = entries.iter().rev().find(|(_, key, _)| key == "verbose") {
            parsed.verbose = parse_bool(verbose);
        }
        let diagnostics = diagnostics.with_verbose(parsed.verbose);

        for (_, key, value) in &entries {
            let value = *value;
            match key.as_str() {
                "verbose" => {}
                "dataset" => parsed.dataset = non_empty(value),
                "table" => parsed.table = non_empty(value),
                "sql_dialect" => {
                    parsed.dialect = SqlDialect::parse(value).unwrap_or_else(|| {
                        diagnostics.warn(format!(
                            "Invalid sql_dialect '{}', falling back to standard",
                            value
                        ));
                        SqlDialect::Standard
                    })
                }
                "group" => parsed.group_by = parse_bool(value),
                "casting" => parsed.casting = CastOverrides::parse(value, &diagnostics),
                "convert_tz" | "timezone" => parsed.convert_tz = parse_timezone(value, &diagnostics),
                "colcount" => parsed.colcount = OverflowPolicy::parse_or_default("colcount", value, &diagnostics),
                "colnames" => parsed.colnames = OverflowPolicy::parse_or_default("colnames", value, &diagnostics),
                other => diagnostics.debug(format!("Ignoring unknown option '{}'", other)),
            }
        }

        diagnostics.debug(format!(
            "Options: dialect={}, group={}, casting={} rule(s), timezone={:?}",
            parsed.dialect,
            parsed.group_by,
            parsed.casting.len(),
            parsed.convert_tz
        ));

        parsed
    }

    /// Remote table identity, required for scans.
    pub fn table_identity(&self) -> Result<TableIdentity, OptionsError> {
        let dataset = self.dataset.clone().ok_or(OptionsError::MissingOption("dataset"))?;
        let table = self.table.clone().ok_or(OptionsError::MissingOption("table"))?;
        Ok(TableIdentity { dataset, table })
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_timezone(value: &str, diagnostics: &Diagnostics) -> Option<String> {
    let tz = non_empty(value)?;
    // Rendered inside a double-quoted literal
    if tz.contains('"') || tz.contains('\\') || tz.contains('\n') {
        diagnostics.warn(format!("Ignoring invalid timezone '{}'", tz));
        return None;
    }
    Some(tz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bqfdw_types::{CollectingReporter, Severity};
    use std::sync::Arc;

    fn options(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn base_options() -> HashMap<String, String> {
        options(&[
            ("fdw_dataset", "bigquery-public-data.usa_names"),
            ("fdw_table", "usa_1910_current"),
            ("fdw_verbose", "true"),
            ("fdw_sql_dialect", "standard"),
            ("fdw_group", "false"),
            ("fdw_casting", "false"),
        ])
    }

    #[test]
    fn test_parse_defaults() {
        let parsed = FdwOptions::parse(&base_options(), &Diagnostics::default());
        assert_eq!(parsed.dialect, SqlDialect::Standard);
        assert!(!parsed.group_by);
        assert!(parsed.verbose);
        assert!(parsed.casting.is_empty());
        assert_eq!(parsed.colcount, OverflowPolicy::Error);
        assert_eq!(parsed.colnames, OverflowPolicy::Error);
        assert_eq!(
            parsed.table_identity().unwrap(),
            TableIdentity::new("bigquery-public-data.usa_names", "usa_1910_current")
        );
    }

    #[test]
    fn test_unprefixed_keys() {
        let parsed = FdwOptions::parse(
            &options(&[("dataset", "d"), ("table", "t"), ("sql_dialect", "legacy"), ("group", "true")]),
            &Diagnostics::default(),
        );
        assert_eq!(parsed.dialect, SqlDialect::Legacy);
        assert!(parsed.group_by);
        assert!(parsed.table_identity().is_ok());
    }

    #[test]
    fn test_missing_dataset() {
        let mut o = base_options();
        o.remove("fdw_dataset");
        let parsed = FdwOptions::parse(&o, &Diagnostics::default());
        assert_eq!(parsed.table_identity(), Err(OptionsError::MissingOption("dataset")));
    }

    #[test]
    fn test_invalid_dialect_falls_back() {
        let collector = Arc::new(CollectingReporter::new());
        let diagnostics = Diagnostics::new(collector.clone(), true);
        let mut o = base_options();
        o.insert("fdw_sql_dialect".into(), "non_existent".into());

        let parsed = FdwOptions::parse(&o, &diagnostics);
        assert_eq!(parsed.dialect, SqlDialect::Standard);
        assert_eq!(collector.messages_at(Severity::Warning).len(), 1);
    }

    #[test]
    fn test_verbose_false_silences_debug() {
        let collector = Arc::new(CollectingReporter::new());
        let diagnostics = Diagnostics::new(collector.clone(), true);
        let mut o = base_options();
        o.insert("fdw_verbose".into(), "false".into());
        o.insert("fdw_unknown".into(), "x".into());

        let parsed = FdwOptions::parse(&o, &diagnostics);
        assert!(!parsed.verbose);
        assert!(collector.entries().is_empty());
    }

    #[test]
    fn test_timezone_option() {
        let mut o = base_options();
        o.insert("fdw_convert_tz".into(), "US/Eastern".into());
        let parsed = FdwOptions::parse(&o, &Diagnostics::default());
        assert_eq!(parsed.convert_tz.as_deref(), Some("US/Eastern"));

        o.insert("fdw_convert_tz".into(), "US\"Eastern".into());
        let parsed = FdwOptions::parse(&o, &Diagnostics::default());
        assert_eq!(parsed.convert_tz, None);
    }

    #[test]
    fn test_prefixed_and_canonical_keys_win() {
        for _ in 0..8 {
            let o = options(&[
                ("dataset", "bare_ds"),
                ("fdw_dataset", "prefixed_ds"),
                ("table", "t"),
                ("timezone", "UTC"),
                ("convert_tz", "US/Eastern"),
                ("fdw_group", "true"),
                ("group", "false"),
            ]);
            let parsed = FdwOptions::parse(&o, &Diagnostics::default());
            assert_eq!(parsed.dataset.as_deref(), Some("prefixed_ds"));
            assert_eq!(parsed.convert_tz.as_deref(), Some("US/Eastern"));
            assert!(parsed.group_by);
        }
    }

    #[test]
    fn test_key_precedence() {
        assert!(key_precedence("fdw_dataset") > key_precedence("dataset"));
        assert!(key_precedence("convert_tz") > key_precedence("fdw_timezone"));
        assert!(key_precedence("fdw_timezone") > key_precedence("timezone"));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("on"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("maybe"));
    }

    #[test]
    fn test_split_project() {
        let id = TableIdentity::new("bigquery-public-data.usa_names", "t");
        assert_eq!(id.split_project(), (Some("bigquery-public-data"), "usa_names"));
        let id = TableIdentity::new("usa_names", "t");
        assert_eq!(id.split_project(), (None, "usa_names"));
    }
}
