//! Event capture for offline analysis of market runs.
//!
//! The engine emits `tracing` events with a target per event family
//! (`quote`, `trade`, `learning`, `tick`, `narration`). [`EventSubscriber`]
//! keeps every event as a row in a per-target [`EventTable`]; rows are turned
//! into polars frames only when a test asks for them, with absent fields left
//! null.
//!
//! ```ignore
//! instrument::install_subscriber();
//! // ... run ticks ...
//! let frames = instrument::drain_to_dataframes();
//! let trades = &frames["trade"];
//! ```
//!
//! Capture is per thread, so parallel tests never see each other's rows.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Level, Metadata, Subscriber};

/// One recorded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U64(u64),
    I64(i64),
    F64(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::U64(v) => Some(*v as f64),
            Value::I64(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            Value::Bool(_) | Value::Str(_) => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::U64(v) => i64::try_from(*v).ok(),
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::U64(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
        }
    }
}

/// Fields of a single event, in emission order.
pub type Row = Vec<(String, Value)>;

/// All rows recorded under one tracing target.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    rows: Vec<Row>,
}

impl EventTable {
    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Field names across all rows, first-seen order.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for row in &self.rows {
            for (name, _) in row {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Every value of `field`, `None` where a row lacks it.
    pub fn values(&self, field: &str) -> Vec<Option<&Value>> {
        self.rows
            .iter()
            .map(|row| row.iter().find(|(n, _)| n == field).map(|(_, v)| v))
            .collect()
    }

    /// Column-wise view for analysis. Column type follows the widest value
    /// seen: any float makes the column f64, mixed signed and unsigned
    /// integers become i64, and anything else falls back to strings.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let columns = self
            .field_names()
            .into_iter()
            .map(|name| build_column(name, &self.values(name)))
            .collect();
        DataFrame::new(columns)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    U64,
    I64,
    F64,
    Bool,
    Str,
}

fn widen(acc: Option<ColumnKind>, value: &Value) -> ColumnKind {
    let next = match value {
        Value::U64(_) => ColumnKind::U64,
        Value::I64(_) => ColumnKind::I64,
        Value::F64(_) => ColumnKind::F64,
        Value::Bool(_) => ColumnKind::Bool,
        Value::Str(_) => ColumnKind::Str,
    };
    match (acc, next) {
        (None, k) => k,
        (Some(a), k) if a == k => a,
        (Some(ColumnKind::U64 | ColumnKind::I64), ColumnKind::U64 | ColumnKind::I64) => {
            ColumnKind::I64
        }
        (
            Some(ColumnKind::U64 | ColumnKind::I64 | ColumnKind::F64),
            ColumnKind::U64 | ColumnKind::I64 | ColumnKind::F64,
        ) => ColumnKind::F64,
        _ => ColumnKind::Str,
    }
}

fn build_column(name: &str, values: &[Option<&Value>]) -> Column {
    let kind = values
        .iter()
        .flatten()
        .fold(None, |acc, v| Some(widen(acc, v)))
        .unwrap_or(ColumnKind::Str);

    match kind {
        ColumnKind::U64 => {
            let data: Vec<Option<u64>> = values
                .iter()
                .map(|v| match v {
                    Some(Value::U64(x)) => Some(*x),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), data)
        }
        ColumnKind::I64 => {
            let data: Vec<Option<i64>> = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
            Column::new(name.into(), data)
        }
        ColumnKind::F64 => {
            let data: Vec<Option<f64>> = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
            Column::new(name.into(), data)
        }
        ColumnKind::Bool => {
            let data: Vec<Option<bool>> = values
                .iter()
                .map(|v| match v {
                    Some(Value::Bool(b)) => Some(*b),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), data)
        }
        ColumnKind::Str => {
            let data: Vec<Option<String>> =
                values.iter().map(|v| v.map(|x| x.to_string())).collect();
            Column::new(name.into(), data)
        }
    }
}

/// Tables keyed by tracing target.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub tables: HashMap<String, EventTable>,
}

impl Recorder {
    pub fn table(&self, target: &str) -> Option<&EventTable> {
        self.tables.get(target)
    }

    /// Rows recorded under `target`, zero if it never fired.
    pub fn count(&self, target: &str) -> usize {
        self.tables.get(target).map_or(0, EventTable::len)
    }

    /// Tables that fail to convert are skipped.
    pub fn to_dataframes(&self) -> HashMap<String, DataFrame> {
        self.tables
            .iter()
            .filter_map(|(name, table)| table.to_dataframe().ok().map(|df| (name.clone(), df)))
            .collect()
    }
}

thread_local! {
    static RECORDER: RefCell<Recorder> = RefCell::default();
}

#[derive(Default)]
struct RowVisitor {
    row: Row,
}

impl RowVisitor {
    fn put(&mut self, field: &Field, value: Value) {
        self.row.push((field.name().to_string(), value));
    }
}

impl Visit for RowVisitor {
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::U64(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::I64(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, Value::F64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::Str(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, Value::Str(format!("{value:?}")));
    }
}

/// Collects events at or above `max_level` into the thread-local recorder.
/// Spans are ignored.
pub struct EventSubscriber {
    max_level: Level,
    targets: Option<Vec<&'static str>>,
}

impl Default for EventSubscriber {
    fn default() -> Self {
        Self {
            max_level: Level::INFO,
            targets: None,
        }
    }
}

impl EventSubscriber {
    /// Also keep debug events (mode changes and the like).
    pub fn verbose() -> Self {
        Self {
            max_level: Level::DEBUG,
            ..Self::default()
        }
    }

    /// Restrict capture to the named targets.
    pub fn only(mut self, targets: &[&'static str]) -> Self {
        self.targets = Some(targets.to_vec());
        self
    }
}

impl Subscriber for EventSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        if !metadata.is_event() || *metadata.level() > self.max_level {
            return false;
        }
        match &self.targets {
            Some(targets) => targets.contains(&metadata.target()),
            None => true,
        }
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut visitor = RowVisitor::default();
        event.record(&mut visitor);
        let target = event.metadata().target().to_string();
        RECORDER.with(|r| {
            r.borrow_mut()
                .tables
                .entry(target)
                .or_default()
                .push(visitor.row)
        });
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Install [`EventSubscriber`] globally. Later calls are ignored.
pub fn install_subscriber() {
    let _ = tracing::subscriber::set_global_default(EventSubscriber::default());
}

pub fn drain() -> Recorder {
    RECORDER.with(|r| std::mem::take(&mut *r.borrow_mut()))
}

pub fn clear() {
    RECORDER.with(|r| *r.borrow_mut() = Recorder::default());
}

pub fn drain_to_dataframes() -> HashMap<String, DataFrame> {
    drain().to_dataframes()
}

fn io_error(e: std::io::Error) -> PolarsError {
    PolarsError::IO {
        error: e.into(),
        msg: None,
    }
}

/// Write each frame to `{dir}/{target}.parquet`.
pub fn save_parquet(frames: &mut HashMap<String, DataFrame>, dir: &Path) -> PolarsResult<()> {
    std::fs::create_dir_all(dir).map_err(io_error)?;
    for (target, df) in frames.iter_mut() {
        let file = std::fs::File::create(dir.join(format!("{target}.parquet"))).map_err(io_error)?;
        ParquetWriter::new(file).finish(df)?;
    }
    Ok(())
}

/// Directory-safe form of a run label.
fn slug(label: &str) -> String {
    label
        .chars()
        .take(60)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Captures one run and persists it as parquet when dropped.
///
/// Creation clears this thread's recorder and installs the subscriber.
/// `frames()` drains once and caches; on drop the frames go to
/// `{parent}/{label}_{unix_secs}/` followed by an empty `_ready` marker.
///
/// ```ignore
/// let mut run = instrument::ScopedRecorder::new("data", "day_night");
/// // ... run ticks ...
/// let frames = run.frames();
/// ```
pub struct ScopedRecorder {
    run_dir: PathBuf,
    frames: Option<HashMap<String, DataFrame>>,
    persist: bool,
}

impl ScopedRecorder {
    pub fn new(parent: impl Into<PathBuf>, label: &str) -> Self {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let run_dir = parent.into().join(format!("{}_{secs}", slug(label)));
        clear();
        install_subscriber();
        Self {
            run_dir,
            frames: None,
            persist: true,
        }
    }

    /// Same capture, nothing written on drop.
    pub fn in_memory(label: &str) -> Self {
        let mut recorder = Self::new(std::env::temp_dir(), label);
        recorder.persist = false;
        recorder
    }

    pub fn frames(&mut self) -> &HashMap<String, DataFrame> {
        self.frames.get_or_insert_with(drain_to_dataframes)
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }
}

impl Drop for ScopedRecorder {
    fn drop(&mut self) {
        let mut frames = self.frames.take().unwrap_or_else(drain_to_dataframes);
        if !self.persist || frames.is_empty() {
            return;
        }
        let written = save_parquet(&mut frames, &self.run_dir)
            .and_then(|_| std::fs::File::create(self.run_dir.join("_ready")).map_err(io_error));
        match written {
            Ok(_) => eprintln!(
                "ScopedRecorder: {} tables -> {}",
                frames.len(),
                self.run_dir.display()
            ),
            Err(e) => eprintln!("ScopedRecorder({}): {e}", self.run_dir.display()),
        }
    }
}
