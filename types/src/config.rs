//! Static configuration records for a dataset page and the engine bundle

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tsify::Tsify;

/// Public Parquet file with WebRTC stats samples
pub const RTC_STATS_SOURCE_URL: &str =
    "https://duckdb-wasm.shiguredo.jp/P78BHZM3MD3MV47JDZG47PB8PW.parquet";

/// Daily USD/JPY rates for 2023-2024
pub const EXCHANGE_RATE_SOURCE_URL: &str =
    "https://api.frankfurter.dev/v1/2023-01-01..2024-12-31?from=USD&to=JPY";

/// Per-page dataset configuration, supplied once and never mutated
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct DatasetConfig {
    /// Database location, e.g. `opfs://example.db`
    pub db_path: String,
    /// Name of the source file in OPFS and in the engine's virtual file space
    #[serde(default)]
    pub parquet_file_name: String,
    /// Name of the exported sample file
    pub sample_parquet_file_name: String,
    /// Where the source dataset is fetched from
    #[serde(default)]
    pub source_url: String,
}

/// Required configuration field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigField {
    DbPath,
    ParquetFileName,
    SampleParquetFileName,
    SourceUrl,
}

impl ConfigField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigField::DbPath => "db_path",
            ConfigField::ParquetFileName => "parquet_file_name",
            ConfigField::SampleParquetFileName => "sample_parquet_file_name",
            ConfigField::SourceUrl => "source_url",
        }
    }
}

/// Configuration validation errors
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{} is required", .0.as_str())]
    MissingField(ConfigField),
}

impl DatasetConfig {
    /// RTC stats log dataset
    pub fn rtc_stats() -> Self {
        Self {
            db_path: "opfs://duckdbwasm-example.db".to_string(),
            parquet_file_name: "rtc_stats.parquet".to_string(),
            sample_parquet_file_name: "samples.parquet".to_string(),
            source_url: RTC_STATS_SOURCE_URL.to_string(),
        }
    }

    /// Exchange rate dataset
    pub fn exchange_rate() -> Self {
        Self {
            db_path: "opfs://duckdbwasm-exchangerate-example.db".to_string(),
            parquet_file_name: "exrate.parquet".to_string(),
            sample_parquet_file_name: "exrate_sample.parquet".to_string(),
            source_url: EXCHANGE_RATE_SOURCE_URL.to_string(),
        }
    }

    /// Rejects the record if any of `required` is empty
    pub fn validate(&self, required: &[ConfigField]) -> Result<(), ConfigError> {
        for field in required {
            if self.field(*field).trim().is_empty() {
                return Err(ConfigError::MissingField(*field));
            }
        }
        Ok(())
    }

    pub fn field(&self, field: ConfigField) -> &str {
        match field {
            ConfigField::DbPath => &self.db_path,
            ConfigField::ParquetFileName => &self.parquet_file_name,
            ConfigField::SampleParquetFileName => &self.sample_parquet_file_name,
            ConfigField::SourceUrl => &self.source_url,
        }
    }
}

/// DuckDB access modes, with the numeric values the JS enum uses
#[derive(Tsify, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum AccessMode {
    Undefined,
    Automatic,
    ReadOnly,
    ReadWrite,
}

impl AccessMode {
    pub fn as_js_value(&self) -> u32 {
        match self {
            AccessMode::Undefined => 0,
            AccessMode::Automatic => 1,
            AccessMode::ReadOnly => 2,
            AccessMode::ReadWrite => 3,
        }
    }
}

impl Default for AccessMode {
    fn default() -> Self {
        Self::ReadWrite
    }
}

/// Locations of the DuckDB-WASM module and its worker script
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct EngineBundle {
    /// URL of the `.wasm` module
    #[serde(default = "default_main_module")]
    pub main_module: String,
    /// URL of the worker script
    #[serde(default = "default_main_worker")]
    pub main_worker: String,
}

fn default_main_module() -> String {
    "/duckdb/duckdb-eh.wasm".to_string()
}
fn default_main_worker() -> String {
    "/duckdb/duckdb-browser-eh.worker.js".to_string()
}

impl Default for EngineBundle {
    fn default() -> Self {
        Self {
            main_module: default_main_module(),
            main_worker: default_main_worker(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_pass_their_own_validation() {
        let all = [
            ConfigField::DbPath,
            ConfigField::ParquetFileName,
            ConfigField::SampleParquetFileName,
            ConfigField::SourceUrl,
        ];
        assert_eq!(DatasetConfig::rtc_stats().validate(&all), Ok(()));
        assert_eq!(DatasetConfig::exchange_rate().validate(&all), Ok(()));
    }

    #[test]
    fn blank_field_is_reported_by_name() {
        let mut config = DatasetConfig::rtc_stats();
        config.source_url = "   ".to_string();
        let err = config
            .validate(&[ConfigField::DbPath, ConfigField::SourceUrl])
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingField(ConfigField::SourceUrl));
        assert_eq!(err.to_string(), "source_url is required");
    }

    #[test]
    fn bundle_defaults_fill_missing_fields() {
        let bundle: EngineBundle =
            serde_json::from_str(r#"{"main_module":"/x.wasm"}"#).unwrap();
        assert_eq!(bundle.main_module, "/x.wasm");
        assert_eq!(bundle.main_worker, EngineBundle::default().main_worker);
    }

    #[test]
    fn access_mode_matches_duckdb_enum() {
        assert_eq!(AccessMode::default(), AccessMode::ReadWrite);
        assert_eq!(AccessMode::ReadWrite.as_js_value(), 3);
        assert_eq!(AccessMode::ReadOnly.as_js_value(), 2);
    }
}
