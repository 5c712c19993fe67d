use serde::{Deserialize, Serialize};

/// SQL dialect accepted by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    #[default]
    Standard,
    Legacy,
}

impl SqlDialect {
    /// Parse a dialect name; `None` for anything other than `standard`/`legacy`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Some(SqlDialect::Standard),
            "legacy" => Some(SqlDialect::Legacy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SqlDialect::Standard => "standard",
            SqlDialect::Legacy => "legacy",
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, SqlDialect::Legacy)
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
