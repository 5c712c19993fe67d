//! Import tests covering schema filtering and the overflow policies

use std::sync::Arc;

use bqfdw_import::{ImportError, ImportReport, SchemaImporter, SchemaRestriction};
use bqfdw_options::{FdwOptions, OverflowPolicy};
use bqfdw_types::mapping::postgres_type_for_remote;
use bqfdw_types::{CatalogRow, CollectingReporter, Diagnostics, Severity};

const LONG_1: &str = "long_column_name___2_________3_________4_________5_________6__3_1";
const LONG_2: &str = "long_column_name___2_________3_________4_________5_________6__3_2";

fn example_rows() -> Vec<CatalogRow> {
    vec![
        CatalogRow::new("public", "bq_table", "id", "INT64"),
        CatalogRow::new("public", "bq_table", "created_at", "TIMESTAMP"),
        CatalogRow::new("public", "bq_table", "updated_at", "TIMESTAMP"),
        CatalogRow::new("public", "bq_table", "visited_at", "DATE"),
        CatalogRow::new("public", "bq_table", "username", "STRING"),
        CatalogRow::new("public", "bq_table", "name", "TEXT"),
        CatalogRow::new("public", "bq_table", "roles", "ARRAY<STRING>"),
        CatalogRow::new("public", "bq_table", "recent_actions", "ARRAY<STRING>"),
        CatalogRow::new("public", "bq_table", "blocked", "BOOL"),
        CatalogRow::new("public", "bq_table", "blocked_admin", "BOOL"),
        CatalogRow::new("public", "bq_table", "some_float_col", "FLOAT64"),
        CatalogRow::new("omit_me", "bq_table", "some_omitted_col", "STRING"),
    ]
}

fn import_with(
    rows: Vec<CatalogRow>,
    colcount: OverflowPolicy,
    colnames: OverflowPolicy,
) -> (ImportReport, Arc<CollectingReporter>) {
    let options = FdwOptions {
        colcount,
        colnames,
        verbose: false,
        ..FdwOptions::default()
    };
    let collector = Arc::new(CollectingReporter::new());
    let importer = SchemaImporter::new(&options, Diagnostics::new(collector.clone(), true));
    let restriction = SchemaRestriction::from_host("except", ["omit_me"]);
    (importer.import(rows, &restriction), collector)
}

fn total_columns(report: &ImportReport) -> usize {
    report.drafts.iter().map(|d| d.columns.len()).sum()
}

#[test]
fn test_excluded_schema_produces_no_drafts() {
    let rows = example_rows();
    let (report, _) = import_with(rows.clone(), OverflowPolicy::Error, OverflowPolicy::Error);

    assert_eq!(report.drafts.len(), 1);
    let draft = &report.drafts[0];
    assert_eq!(draft.options["schema"], "public");
    assert_eq!(draft.options["tablename"], "bq_table");
    assert_eq!(draft.columns.len(), rows.len() - 1);

    for (column, expected) in draft.columns.iter().zip(&rows) {
        assert_eq!(column.name, expected.column_name);
        assert_eq!(column.declared_type, postgres_type_for_remote(&expected.remote_type));
    }
    assert_eq!(draft.columns[6].declared_type, "text[]");
    assert_eq!(draft.columns[5].declared_type, "text");
}

#[test]
fn test_limit_to_schema() {
    let options = FdwOptions::default();
    let importer = SchemaImporter::new(&options, Diagnostics::tracing(false));
    let report = importer.import(example_rows(), &SchemaRestriction::from_host("limit_to", ["omit_me"]));

    assert_eq!(report.drafts.len(), 1);
    assert_eq!(report.drafts[0].schema_name, "omit_me");
    assert_eq!(report.drafts[0].columns.len(), 1);
}

fn many_columns() -> Vec<CatalogRow> {
    let mut rows: Vec<CatalogRow> = (0..1601)
        .map(|i| CatalogRow::new("public", "bq_table2", format!("id_c_{}", i), "INT64"))
        .collect();
    rows.extend((0..10).map(|i| CatalogRow::new("public", "bq_table", format!("id_c_{}", i), "INT64")));
    rows
}

#[test]
fn test_too_many_columns_skip() {
    let (report, collector) = import_with(many_columns(), OverflowPolicy::Skip, OverflowPolicy::Error);

    assert_eq!(report.drafts.len(), 1);
    assert_eq!(report.drafts[0].table_name, "bq_table");
    assert_eq!(total_columns(&report), 10);
    assert!(report.rejected.is_empty());
    assert_eq!(collector.messages_at(Severity::Warning).len(), 1);
}

#[test]
fn test_too_many_columns_trim() {
    let (report, _) = import_with(many_columns(), OverflowPolicy::Trim, OverflowPolicy::Error);

    assert_eq!(report.drafts.len(), 2);
    let wide = report.drafts.iter().find(|d| d.table_name == "bq_table2").unwrap();
    assert_eq!(wide.columns.len(), 1600);
    assert_eq!(wide.columns.last().unwrap().name, "id_c_1599");
    assert_eq!(total_columns(&report), 1610);
}

#[test]
fn test_too_many_columns_error() {
    let (report, collector) = import_with(many_columns(), OverflowPolicy::Error, OverflowPolicy::Error);

    assert_eq!(report.drafts.len(), 1);
    assert_eq!(report.drafts[0].table_name, "bq_table");
    assert_eq!(
        report.rejected,
        vec![ImportError::TooManyColumns {
            schema: "public".to_string(),
            table: "bq_table2".to_string(),
            count: 1601,
            max: 1600,
        }]
    );
    assert_eq!(collector.messages_at(Severity::Error).len(), 1);
}

fn shared_prefix() -> Vec<CatalogRow> {
    let mut rows: Vec<CatalogRow> = (0..10)
        .map(|i| CatalogRow::new("public", "bq_table", format!("id_c_{}", i), "INT64"))
        .collect();
    rows.push(CatalogRow::new("public", "bq_table2", "keep_me", "STRING"));
    rows.push(CatalogRow::new("public", "bq_table2", LONG_1, "TEXT"));
    rows.push(CatalogRow::new("public", "bq_table2", LONG_2, "TEXT"));
    rows
}

#[test]
fn test_name_collision_skip() {
    let (report, _) = import_with(shared_prefix(), OverflowPolicy::Error, OverflowPolicy::Skip);

    assert_eq!(report.drafts.len(), 2);
    let draft = report.drafts.iter().find(|d| d.table_name == "bq_table2").unwrap();
    let names: Vec<&str> = draft.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["keep_me"]);
}

#[test]
fn test_name_collision_skip_drops_empty_table() {
    let mut rows = shared_prefix();
    rows.retain(|r| r.column_name != "keep_me");
    let (report, _) = import_with(rows, OverflowPolicy::Error, OverflowPolicy::Skip);

    assert_eq!(report.drafts.len(), 1);
    assert_eq!(report.drafts[0].table_name, "bq_table");
    assert!(report.rejected.is_empty());
}

#[test]
fn test_name_collision_trim() {
    let (report, _) = import_with(shared_prefix(), OverflowPolicy::Error, OverflowPolicy::Trim);

    let draft = report.drafts.iter().find(|d| d.table_name == "bq_table2").unwrap();
    assert_eq!(draft.columns.len(), 3);
    assert_eq!(draft.columns[1].name, &LONG_1[..63]);
    assert!(draft.columns[2].name.ends_with("_2"));
    assert!(draft.columns.iter().all(|c| c.name.len() <= 63));
    assert_ne!(draft.columns[1].name, draft.columns[2].name);
}

#[test]
fn test_name_collision_trim_drops_all_colliding_table() {
    let mut rows = shared_prefix();
    rows.retain(|r| r.column_name != "keep_me");
    let (report, collector) = import_with(rows, OverflowPolicy::Error, OverflowPolicy::Trim);

    assert_eq!(report.drafts.len(), 1);
    assert_eq!(report.drafts[0].table_name, "bq_table");
    assert_eq!(total_columns(&report), 10);
    assert!(report.rejected.is_empty());
    assert!(collector
        .messages_at(Severity::Warning)
        .iter()
        .any(|m| m.contains("bq_table2")));
}

#[test]
fn test_name_collision_error() {
    let (report, collector) = import_with(shared_prefix(), OverflowPolicy::Error, OverflowPolicy::Error);

    assert_eq!(report.drafts.len(), 1);
    assert_eq!(report.drafts[0].table_name, "bq_table");
    match &report.rejected[..] {
        [ImportError::NameCollision { table, names, .. }] => {
            assert_eq!(table, "bq_table2");
            assert_eq!(names, &vec![LONG_1.to_string(), LONG_2.to_string()]);
        }
        other => panic!("unexpected rejections: {:?}", other),
    }
    assert_eq!(collector.messages_at(Severity::Error).len(), 1);
}

#[test]
fn test_policies_combine() {
    // Trimming the column count first leaves the colliding pair beyond the limit
    let rows = vec![
        CatalogRow::new("public", "t", "a", "INT64"),
        CatalogRow::new("public", "t", LONG_1, "INT64"),
        CatalogRow::new("public", "t", LONG_2, "INT64"),
    ];
    let options = FdwOptions {
        colcount: OverflowPolicy::Trim,
        colnames: OverflowPolicy::Error,
        ..FdwOptions::default()
    };
    let report = SchemaImporter::new(&options, Diagnostics::tracing(false))
        .with_limits(2, 63)
        .import(rows, &SchemaRestriction::All);

    assert_eq!(report.drafts.len(), 1);
    assert_eq!(report.drafts[0].columns.len(), 2);
    assert!(report.rejected.is_empty());
}
