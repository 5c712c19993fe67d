//! Per-column cast overrides (`casting` option)

use std::collections::BTreeMap;

use bqfdw_types::{mapping, Diagnostics};

/// Column name -> remote cast target, parsed from a JSON object string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CastOverrides {
    rules: BTreeMap<String, String>,
}

impl CastOverrides {
    /// Parse `{"column": "TYPE", ...}`.
    ///
    /// An empty string or `false` means no overrides. Entries whose target is
    /// not a known remote type are discarded with a warning.
    pub fn parse(value: &str, diagnostics: &Diagnostics) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("false") {
            return Self::default();
        }

        let parsed: serde_json::Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                diagnostics.warn(format!("Ignoring casting option, invalid JSON: {}", e));
                return Self::default();
            }
        };

        let serde_json::Value::Object(entries) = parsed else {
            diagnostics.warn("Ignoring casting option, expected a JSON object");
            return Self::default();
        };

        let mut rules = BTreeMap::new();
        for (column, target) in entries {
            let Some(target) = target.as_str() else {
                diagnostics.warn(format!("Ignoring cast for '{}': target must be a string", column));
                continue;
            };
            let target = target.trim().to_ascii_uppercase();
            if !mapping::is_known_cast_target(&target) {
                diagnostics.warn(format!("Ignoring cast for '{}': unknown type '{}'", column, target));
                continue;
            }
            rules.insert(column, target);
        }

        Self { rules }
    }

    /// Drop overrides for columns the table does not have.
    pub fn restricted_to<'a, I>(&self, columns: I, diagnostics: &Diagnostics) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let known: Vec<&str> = columns.into_iter().collect();
        let rules = self
            .rules
            .iter()
            .filter(|(column, _)| {
                let present = known.contains(&column.as_str());
                if !present {
                    diagnostics.warn(format!("Ignoring cast for unknown column '{}'", column));
                }
                present
            })
            .map(|(c, t)| (c.clone(), t.clone()))
            .collect();
        Self { rules }
    }

    pub fn insert(&mut self, column: impl Into<String>, target: impl Into<String>) {
        self.rules.insert(column.into(), target.into());
    }

    pub fn target_for(&self, column: &str) -> Option<&str> {
        self.rules.get(column).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|(c, t)| (c.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
