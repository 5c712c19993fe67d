//! Lazy scan results

use std::iter::FusedIterator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bqfdw_types::Diagnostics;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::client::{RawRow, RawRows};

/// Cooperative scan termination signal shared with the host.
///
/// Cancelling stops row consumption at the next pull; an in-flight remote
/// call is not interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One result row, keyed by the requested column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(String::as_str).zip(&self.values)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Forward-only, single-pass sequence of result rows.
///
/// A read failure is reported once and ends the scan. Rewinding means issuing
/// the query again.
pub struct Scan<'a> {
    id: Uuid,
    columns: Arc<[String]>,
    rows: Option<RawRows<'a>>,
    cancel: CancelToken,
    diagnostics: Diagnostics,
    emitted: usize,
    width_reported: bool,
}

impl<'a> Scan<'a> {
    pub(crate) fn new(
        columns: Vec<String>,
        rows: RawRows<'a>,
        cancel: CancelToken,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            columns: Arc::from(columns),
            rows: Some(rows),
            cancel,
            diagnostics,
            emitted: 0,
            width_reported: false,
        }
    }

    /// A scan that yields nothing.
    pub(crate) fn empty(columns: Vec<String>, diagnostics: Diagnostics) -> Self {
        Self {
            rows: None,
            ..Self::new(columns, Box::new(std::iter::empty()), CancelToken::new(), diagnostics)
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows handed out so far.
    pub fn rows_emitted(&self) -> usize {
        self.emitted
    }

    fn finish(&mut self, reason: &str) {
        if self.rows.take().is_some() {
            self.diagnostics.debug(format!(
                "Scan {} {} after {} rows",
                self.id, reason, self.emitted
            ));
        }
    }

    fn shape(&mut self, mut raw: RawRow) -> Row {
        let width = self.columns.len();
        if raw.len() != width {
            if !self.width_reported {
                self.diagnostics.warn(format!(
                    "Scan {}: remote rows have {} values for {} requested columns",
                    self.id,
                    raw.len(),
                    width
                ));
                self.width_reported = true;
            }
            raw.resize(width, Value::Null);
        }
        Row {
            columns: Arc::clone(&self.columns),
            values: raw,
        }
    }
}

impl Iterator for Scan<'_> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        if self.cancel.is_cancelled() {
            self.finish("cancelled");
            return None;
        }

        match self.rows.as_mut()?.next() {
            None => {
                self.finish("finished");
                None
            }
            Some(Err(e)) => {
                self.diagnostics
                    .error(format!("Scan {} failed while reading results: {}", self.id, e));
                self.finish("aborted");
                None
            }
            Some(Ok(raw)) => {
                self.emitted += 1;
                Some(self.shape(raw))
            }
        }
    }
}

impl FusedIterator for Scan<'_> {}

impl std::fmt::Debug for Scan<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scan")
            .field("id", &self.id)
            .field("columns", &self.columns)
            .field("emitted", &self.emitted)
            .field("open", &self.rows.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use bqfdw_types::{CollectingReporter, Severity};
    use serde_json::json;

    fn scan_of<'a>(rows: Vec<Result<RawRow, ClientError>>, diagnostics: Diagnostics) -> Scan<'a> {
        Scan::new(
            vec!["state".to_string(), "number".to_string()],
            Box::new(rows.into_iter()),
            CancelToken::new(),
            diagnostics,
        )
    }

    #[test]
    fn test_rows_are_keyed_by_column() {
        let mut scan = scan_of(vec![Ok(vec![json!("CA"), json!(7)])], Diagnostics::tracing(false));
        let row = scan.next().unwrap();

        assert_eq!(row.get("number"), Some(&json!(7)));
        assert_eq!(row.get("missing"), None);
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"state":"CA","number":7}"#);
        assert!(scan.next().is_none());
        assert_eq!(scan.rows_emitted(), 1);
    }

    #[test]
    fn test_width_mismatch_is_reported_once() {
        let collector = Arc::new(CollectingReporter::new());
        let scan = scan_of(
            vec![
                Ok(vec![json!("CA")]),
                Ok(vec![json!("NY"), json!(1), json!("extra")]),
            ],
            Diagnostics::new(collector.clone(), false),
        );
        let rows: Vec<Row> = scan.collect();

        assert_eq!(rows[0].values(), &[json!("CA"), Value::Null]);
        assert_eq!(rows[1].values(), &[json!("NY"), json!(1)]);
        assert_eq!(collector.messages_at(Severity::Warning).len(), 1);
    }

    #[test]
    fn test_read_error_ends_scan() {
        let collector = Arc::new(CollectingReporter::new());
        let mut scan = scan_of(
            vec![
                Ok(vec![json!("CA"), json!(1)]),
                Err(ClientError::Query("stream reset".to_string())),
                Ok(vec![json!("NY"), json!(2)]),
            ],
            Diagnostics::new(collector.clone(), false),
        );

        assert!(scan.next().is_some());
        assert!(scan.next().is_none());
        assert!(scan.next().is_none());
        assert_eq!(collector.messages_at(Severity::Error).len(), 1);
    }

    #[test]
    fn test_cancel_stops_consumption() {
        let cancel = CancelToken::new();
        let mut scan = Scan::new(
            vec!["n".to_string()],
            Box::new((0..100).map(|i| Ok(vec![json!(i)]))),
            cancel.clone(),
            Diagnostics::tracing(false),
        );

        assert!(scan.next().is_some());
        cancel.cancel();
        assert!(scan.next().is_none());
        assert_eq!(scan.rows_emitted(), 1);
    }
}
