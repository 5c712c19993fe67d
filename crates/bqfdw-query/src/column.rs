//! Column classification
//!
//! Every requested column is classified once into a [`Column`]; renderers match
//! on the variant instead of comparing names.

use bqfdw_types::ColumnSpec;

/// Reserved name of the counting pseudo-column, rendered as `count(*)`.
pub const COUNT_PSEUDO_COLUMN: &str = "_fdw_count";

/// Reserved name of the partition pseudo-column.
pub const PARTITION_PSEUDO_COLUMN: &str = "partition_date";

/// Remote ingestion-time column the partition pseudo-column maps to.
pub const PARTITION_TIME_IDENTIFIER: &str = "_PARTITIONTIME";

/// Remote type of [`PARTITION_TIME_IDENTIFIER`].
pub const PARTITION_TIME_TYPE: &str = "TIMESTAMP";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Ordinary(ColumnSpec),
    Count,
    Partition,
}

impl Column {
    pub fn classify(spec: ColumnSpec) -> Self {
        match spec.name.as_str() {
            COUNT_PSEUDO_COLUMN => Column::Count,
            PARTITION_PSEUDO_COLUMN => Column::Partition,
            _ => Column::Ordinary(spec),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Column::Ordinary(spec) => &spec.name,
            Column::Count => COUNT_PSEUDO_COLUMN,
            Column::Partition => PARTITION_PSEUDO_COLUMN,
        }
    }

    pub fn is_pseudo(&self) -> bool {
        !matches!(self, Column::Ordinary(_))
    }
}

/// Which list a column set is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnListMode {
    Select,
    GroupBy,
}
