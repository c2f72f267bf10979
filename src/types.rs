//! Public and internal types for the pagerun API and pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// One untyped cell of a row. Mirrors the SQLite storage classes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Render as a CSV field. Null is empty, blobs are lowercase hex.
    pub fn to_field(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Real(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Blob(b) => b.iter().map(|byte| format!("{byte:02x}")).collect(),
        }
    }
}

impl From<rusqlite::types::ValueRef<'_>> for Value {
    fn from(v: rusqlite::types::ValueRef<'_>) -> Self {
        use rusqlite::types::ValueRef;
        match v {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

/// Row codec: convert a row to and from a generic value sequence.
///
/// `pack` is called on a prototype (the job's row type) to build a fresh row, so
/// row types stay object safe and the engine never needs to know the concrete type.
pub trait Packer: Send + Sync + fmt::Debug {
    fn unpack(&self) -> Vec<Value>;
    fn pack(&self, values: Vec<Value>) -> Row;
}

/// A row as transported through the pipeline. Cheap to clone; contents are opaque.
pub type Row = Arc<dyn Packer>;

/// Default row type: the values as they came out of the source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record(pub Vec<Value>);

impl Packer for Record {
    fn unpack(&self) -> Vec<Value> {
        self.0.clone()
    }

    fn pack(&self, values: Vec<Value>) -> Row {
        Arc::new(Record(values))
    }
}

/// Row type prototype used when the job does not set one.
pub fn default_row_type() -> Row {
    Arc::new(Record::default())
}

/// Closed interval of page numbers. `0` means unset; [`crate::Job::paginate`] fills defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub stop: usize,
}

impl Range {
    pub fn new(start: usize, stop: usize) -> Self {
        Self { start, stop }
    }

    /// Number of pages covered (0 when stop < start).
    pub fn len(&self) -> usize {
        (self.stop + 1).saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A stage failure tied to the page it happened on.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("stage '{stage}' failed on page {page}: {message}")]
pub struct StageError {
    pub page: usize,
    pub stage: String,
    pub message: String,
}

/// Unit of work. Built by the paginator with capacity and metadata; stages fill `rows`.
#[derive(Clone, Debug)]
pub struct Page {
    /// 1-based page index (not a row offset).
    pub number: usize,
    /// Row capacity of this page: page size, or the remainder on the final page.
    pub total_rows: usize,
    pub index_field: String,
    /// Prototype used by stages to pack fetched values into rows.
    pub row_type: Row,
    pub rows: Vec<Row>,
    /// Every stage failure seen while processing this page, in stage order.
    pub errors: Vec<StageError>,
}

impl Page {
    pub fn new(number: usize, total_rows: usize, index_field: &str, row_type: Row) -> Self {
        Self {
            number,
            total_rows,
            index_field: index_field.to_string(),
            row_type,
            rows: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// What a run does when a stage fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// First stage error fails the whole run and cancels remaining work.
    #[default]
    FailFast,
    /// Run to completion; failures stay on each page's `errors`.
    CollectAll,
}

/// Full options (CLI and `.pagerun.toml`). Library callers build a [`crate::Job`] directly.
#[derive(Clone, Debug, Default)]
pub struct Opts {
    /// SQLite database the rows are read from.
    pub conn_string: Option<String>,
    /// Optional second database compared page by page against the first.
    pub compare_conn_string: Option<String>,
    pub table_name: String,
    pub index_field: String,
    /// Query returning the total row count. When None, `SELECT COUNT(*)` over the table.
    pub total_rows_query: Option<String>,
    /// Rows per page. 0 uses the default page size.
    pub page_size: usize,
    /// Worker count. When None, rayon's thread count.
    pub process_limit: Option<usize>,
    pub page_range: Range,
    pub error_policy: ErrorPolicy,
    /// Debug logging and progress bar.
    pub verbose: bool,
    /// Log wall time and memory around the run.
    pub profile: bool,
    /// Write collected rows here as CSV.
    pub csv_path: Option<PathBuf>,
    /// Print the run summary as JSON on stdout.
    pub json: bool,
}
