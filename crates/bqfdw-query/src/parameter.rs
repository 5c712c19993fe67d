use bqfdw_types::Scalar;
use serde::Serialize;

/// A typed bind value referenced as `@name` in the query text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum QueryParameter {
    Scalar {
        name: String,
        type_name: String,
        value: Scalar,
    },
    Array {
        name: String,
        element_type: String,
        values: Vec<Scalar>,
    },
}

impl QueryParameter {
    pub fn scalar(name: impl Into<String>, type_name: impl Into<String>, value: Scalar) -> Self {
        QueryParameter::Scalar {
            name: name.into(),
            type_name: type_name.into(),
            value,
        }
    }

    pub fn array(name: impl Into<String>, element_type: impl Into<String>, values: Vec<Scalar>) -> Self {
        QueryParameter::Array {
            name: name.into(),
            element_type: element_type.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            QueryParameter::Scalar { name, .. } | QueryParameter::Array { name, .. } => name,
        }
    }

    /// `INT64`, or `ARRAY<INT64>` for array parameters.
    pub fn type_name(&self) -> String {
        match self {
            QueryParameter::Scalar { type_name, .. } => type_name.clone(),
            QueryParameter::Array { element_type, .. } => format!("ARRAY<{}>", element_type),
        }
    }
}
