//! Static type-mapping tables
//!
//! Three tables live here:
//! - relational type name -> remote type name, per dialect ([`TYPE_MAPPINGS`])
//! - remote type name -> safe explicit cast targets ([`CONVERSION_RULES`])
//! - remote type name -> relational type name, used when importing a catalog

use crate::SqlDialect;

/// One supported scalar type, named in all three vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMapping {
    pub postgres: &'static str,
    pub standard: &'static str,
    pub legacy: &'static str,
}

impl TypeMapping {
    pub fn remote_name(&self, dialect: SqlDialect) -> &'static str {
        match dialect {
            SqlDialect::Standard => self.standard,
            SqlDialect::Legacy => self.legacy,
        }
    }
}

const fn mapping(postgres: &'static str, standard: &'static str, legacy: &'static str) -> TypeMapping {
    TypeMapping {
        postgres,
        standard,
        legacy,
    }
}

pub const TYPE_MAPPINGS: &[TypeMapping] = &[
    mapping("text", "STRING", "STRING"),
    mapping("character varying", "STRING", "STRING"),
    mapping("character", "STRING", "STRING"),
    mapping("bigint", "INT64", "INTEGER"),
    mapping("integer", "INT64", "INTEGER"),
    mapping("smallint", "INT64", "INTEGER"),
    mapping("double precision", "FLOAT64", "FLOAT"),
    mapping("real", "FLOAT64", "FLOAT"),
    mapping("numeric", "NUMERIC", "NUMERIC"),
    mapping("boolean", "BOOL", "BOOLEAN"),
    mapping("date", "DATE", "DATE"),
    mapping("timestamp without time zone", "TIMESTAMP", "TIMESTAMP"),
    mapping("timestamp with time zone", "TIMESTAMP", "TIMESTAMP"),
    mapping("time without time zone", "TIME", "TIME"),
    mapping("bytea", "BYTES", "BYTES"),
    mapping("json", "JSON", "STRING"),
    mapping("jsonb", "JSON", "STRING"),
];

/// Fallback remote type for relational types with no mapping. Same in both dialects.
pub const DEFAULT_REMOTE_TYPE: &str = "STRING";

/// Fallback relational type for remote types with no mapping.
pub const DEFAULT_POSTGRES_TYPE: &str = "text";

/// Normalize a relational type name as the host formats it.
///
/// Drops type modifiers (`numeric(10,2)`, `timestamp(3) without time zone`)
/// and resolves the common short aliases.
pub fn normalize_postgres_type(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut depth = 0usize;
    for c in name.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    let collapsed = out.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();

    let canonical = match collapsed.as_str() {
        "varchar" => "character varying",
        "char" | "bpchar" => "character",
        "int8" => "bigint",
        "int" | "int4" => "integer",
        "int2" => "smallint",
        "float8" => "double precision",
        "float4" => "real",
        "decimal" => "numeric",
        "bool" => "boolean",
        "timestamp" => "timestamp without time zone",
        "timestamptz" => "timestamp with time zone",
        "time" => "time without time zone",
        other => return other.to_string(),
    };
    canonical.to_string()
}

/// Find the mapping row for a relational type name.
pub fn lookup_postgres(name: &str) -> Option<&'static TypeMapping> {
    let normalized = normalize_postgres_type(name);
    TYPE_MAPPINGS.iter().find(|m| m.postgres == normalized)
}

/// Remote type name for a relational type, defaulting to the generic string type.
pub fn remote_type_for(postgres_type: &str, dialect: SqlDialect) -> &'static str {
    lookup_postgres(postgres_type)
        .map(|m| m.remote_name(dialect))
        .unwrap_or(DEFAULT_REMOTE_TYPE)
}

/// Explicit casts considered safe from one remote type (standard names).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionRule {
    pub from: &'static str,
    pub to: &'static [&'static str],
}

pub const CONVERSION_RULES: &[ConversionRule] = &[
    ConversionRule { from: "INT64", to: &["BOOL", "FLOAT64", "INT64", "NUMERIC", "STRING"] },
    ConversionRule { from: "NUMERIC", to: &["FLOAT64", "INT64", "NUMERIC", "STRING"] },
    ConversionRule { from: "FLOAT64", to: &["FLOAT64", "INT64", "NUMERIC", "STRING"] },
    ConversionRule { from: "BOOL", to: &["BOOL", "INT64", "STRING"] },
    ConversionRule {
        from: "STRING",
        to: &[
            "BOOL", "BYTES", "DATE", "DATETIME", "FLOAT64", "INT64", "NUMERIC", "STRING", "TIME",
            "TIMESTAMP",
        ],
    },
    ConversionRule { from: "BYTES", to: &["BYTES", "STRING"] },
    ConversionRule { from: "DATE", to: &["DATE", "DATETIME", "STRING", "TIMESTAMP"] },
    ConversionRule { from: "DATETIME", to: &["DATE", "DATETIME", "STRING", "TIME", "TIMESTAMP"] },
    ConversionRule { from: "TIME", to: &["STRING", "TIME"] },
    ConversionRule { from: "TIMESTAMP", to: &["DATE", "DATETIME", "STRING", "TIME", "TIMESTAMP"] },
    ConversionRule { from: "JSON", to: &["JSON", "STRING"] },
    ConversionRule { from: "ARRAY", to: &["ARRAY"] },
    ConversionRule { from: "STRUCT", to: &["STRUCT"] },
];

pub fn conversion_rule(from: &str) -> Option<&'static ConversionRule> {
    CONVERSION_RULES.iter().find(|r| r.from.eq_ignore_ascii_case(from))
}

/// Whether `to` is a known cast target for any remote type.
pub fn is_known_cast_target(to: &str) -> bool {
    CONVERSION_RULES
        .iter()
        .any(|r| r.to.iter().any(|t| t.eq_ignore_ascii_case(to)))
}

/// Whether casting `from` -> `to` is listed as safe.
pub fn is_safe_cast(from: &str, to: &str) -> bool {
    conversion_rule(from)
        .map(|r| r.to.iter().any(|t| t.eq_ignore_ascii_case(to)))
        .unwrap_or(false)
}

/// Date/time families that get timezone conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalFamily {
    Date,
    DateTime,
}

impl TemporalFamily {
    /// Family of a remote type name, if it is a date or datetime type.
    pub fn of(remote_type: &str) -> Option<Self> {
        match remote_type.to_ascii_uppercase().as_str() {
            "DATE" => Some(TemporalFamily::Date),
            "DATETIME" | "TIMESTAMP" => Some(TemporalFamily::DateTime),
            _ => None,
        }
    }

    /// Name of the remote conversion function for this family.
    pub fn function(&self) -> &'static str {
        match self {
            TemporalFamily::Date => "DATE",
            TemporalFamily::DateTime => "DATETIME",
        }
    }
}

const REMOTE_TO_POSTGRES: &[(&str, &str)] = &[
    ("BOOL", "boolean"),
    ("BOOLEAN", "boolean"),
    ("INT64", "bigint"),
    ("INTEGER", "bigint"),
    ("INT", "bigint"),
    ("SMALLINT", "bigint"),
    ("BIGINT", "bigint"),
    ("TINYINT", "bigint"),
    ("BYTEINT", "bigint"),
    ("FLOAT64", "double precision"),
    ("FLOAT", "double precision"),
    ("NUMERIC", "numeric"),
    ("DECIMAL", "numeric"),
    ("BIGNUMERIC", "numeric"),
    ("BIGDECIMAL", "numeric"),
    ("STRING", "text"),
    ("BYTES", "bytea"),
    ("DATE", "date"),
    ("DATETIME", "timestamp without time zone"),
    ("TIME", "time without time zone"),
    ("TIMESTAMP", "timestamp with time zone"),
    ("JSON", "jsonb"),
    ("GEOGRAPHY", "text"),
    ("INTERVAL", "interval"),
];

/// Relational type for a remote catalog type name.
///
/// Handles parameterized types (`STRING(10)`), `ARRAY<T>` (element type + `[]`)
/// and `STRUCT<...>` (`jsonb`). Anything unrecognised maps to `text`.
pub fn postgres_type_for_remote(remote: &str) -> String {
    let trimmed = remote.trim();
    let upper = trimmed.to_ascii_uppercase();

    if let Some(inner) = upper.strip_prefix("ARRAY<").and_then(|s| s.strip_suffix('>')) {
        let element = postgres_type_for_remote(inner);
        // Nested arrays and structs flatten to one dimension
        return if element.ends_with("[]") {
            element
        } else {
            format!("{}[]", element)
        };
    }
    if upper.starts_with("STRUCT") || upper.starts_with("RECORD") {
        return "jsonb".to_string();
    }

    let base = upper.split('(').next().unwrap_or("").trim();
    REMOTE_TO_POSTGRES
        .iter()
        .find(|(r, _)| *r == base)
        .map(|(_, p)| (*p).to_string())
        .unwrap_or_else(|| DEFAULT_POSTGRES_TYPE.to_string())
}
