use bqfdw_types::Diagnostics;

/// What to do when an imported table breaks a relational engine limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverflowPolicy {
    /// Drop the offending table (column count) or columns (name collisions).
    Skip,
    /// Keep what fits: truncate the column list, or disambiguate names.
    Trim,
    /// Reject the table with a diagnostic.
    #[default]
    Error,
}

impl OverflowPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "skip" => Some(OverflowPolicy::Skip),
            "trim" => Some(OverflowPolicy::Trim),
            "error" => Some(OverflowPolicy::Error),
            _ => None,
        }
    }

    pub(crate) fn parse_or_default(option: &str, value: &str, diagnostics: &Diagnostics) -> Self {
        Self::parse(value).unwrap_or_else(|| {
            diagnostics.warn(format!(
                "Invalid {} policy '{}', falling back to error",
                option, value
            ));
            OverflowPolicy::default()
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverflowPolicy::Skip => "skip",
            OverflowPolicy::Trim => "trim",
            OverflowPolicy::Error => "error",
        }
    }
}

impl std::fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(OverflowPolicy::parse("skip"), Some(OverflowPolicy::Skip));
        assert_eq!(OverflowPolicy::parse(" TRIM "), Some(OverflowPolicy::Trim));
        assert_eq!(OverflowPolicy::parse("error"), Some(OverflowPolicy::Error));
        assert_eq!(OverflowPolicy::parse("drop"), None);
        assert_eq!(OverflowPolicy::default(), OverflowPolicy::Error);
    }
}
