//! Query results and dataset descriptors

use serde::{Deserialize, Serialize};
use tsify::Tsify;

/// A decoded result row, keyed by column name in select order
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Result of a SQL query
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct QueryResult {
    /// Column names, taken from the first row
    pub headers: Vec<String>,
    /// Row data as JSON objects
    #[tsify(type = "Record<string, unknown>[]")]
    pub rows: Vec<Row>,
}

impl QueryResult {
    /// Empty result: no headers, no rows
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a result whose headers are the first row's keys.
    ///
    /// Later rows are not consulted, so rows with a different key set keep
    /// their extra columns but they never show up in `headers`.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let headers = rows
            .first()
            .map(|first| first.keys().cloned().collect())
            .unwrap_or_default();
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when both headers and rows are present
    pub fn is_renderable(&self) -> bool {
        !self.headers.is_empty() && !self.rows.is_empty()
    }
}

/// The datasets the explorer ships with
#[derive(Tsify, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum DatasetKind {
    /// WebRTC stats log loaded from Parquet
    RtcStats,
    /// USD/JPY exchange rates loaded from a JSON API
    ExchangeRate,
}

impl DatasetKind {
    /// Page path serving this dataset
    pub fn route(&self) -> &'static str {
        match self {
            DatasetKind::RtcStats => "/",
            DatasetKind::ExchangeRate => "/exchangerate",
        }
    }

    /// Navigation label
    pub fn label(&self) -> &'static str {
        match self {
            DatasetKind::RtcStats => "Home",
            DatasetKind::ExchangeRate => "Exchangerate",
        }
    }

    /// Resolves a location path, falling back to the home page
    pub fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/exchangerate" => DatasetKind::ExchangeRate,
            _ => DatasetKind::RtcStats,
        }
    }

    pub fn all() -> [DatasetKind; 2] {
        [DatasetKind::RtcStats, DatasetKind::ExchangeRate]
    }
}

/// Snapshot of what the status panel shows
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct SessionStatus {
    /// Version reported by the engine, empty until initialized
    #[serde(default)]
    pub engine_version: String,
    /// Packaged version of the engine library
    #[serde(default)]
    pub runtime_version: String,
    /// Whether the dataset was loaded into OPFS-backed storage
    #[serde(default)]
    pub opfs: bool,
    /// Rows in the dataset table
    #[serde(default)]
    pub record_count: u64,
}

impl SessionStatus {
    /// Controls are usable once the engine has reported its version
    pub fn is_ready(&self) -> bool {
        !self.engine_version.is_empty()
    }
}
