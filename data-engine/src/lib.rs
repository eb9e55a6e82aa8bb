//! DataEngine - DuckDB-WASM integration for SQL queries
//!
//! This crate drives an in-browser DuckDB instance: it opens an OPFS-backed
//! database, loads a dataset into it, runs SQL and exports Parquet samples.
//! Each dataset is a [`DatasetHandler`]; the page above it does not care
//! which one it holds.

pub mod cache;
pub mod duckdb;
pub mod engine;
pub mod error;
pub mod exchange_rate;
pub mod fetch;
pub mod handler;
pub mod opfs;
pub mod result;
pub mod rtc;
pub mod session;
pub mod sql;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cache::{BlobCache, Fetcher, FileStorage};
pub use duckdb::DuckDbWasm;
pub use error::{EngineError, Result};
pub use exchange_rate::ExchangeRateHandler;
pub use fetch::HttpFetcher;
pub use handler::DatasetHandler;
pub use opfs::OpfsStorage;
pub use rtc::RtcStatsHandler;
pub use session::Session;

// Re-export types
pub use explorer_types::*;

/// RTC stats handler running on DuckDB-WASM, OPFS and `fetch`
pub type BrowserRtcStatsHandler = RtcStatsHandler<DuckDbWasm, OpfsStorage, HttpFetcher>;

/// Exchange rate handler running on DuckDB-WASM and OPFS
pub type BrowserExchangeRateHandler = ExchangeRateHandler<DuckDbWasm, OpfsStorage>;

/// Builds the browser-backed RTC stats handler
pub fn rtc_stats_handler(bundle: EngineBundle, config: DatasetConfig) -> Result<BrowserRtcStatsHandler> {
    RtcStatsHandler::new(DuckDbWasm::new(bundle), OpfsStorage::new(), HttpFetcher, config)
}

/// Builds the browser-backed exchange rate handler
pub fn exchange_rate_handler(
    bundle: EngineBundle,
    config: DatasetConfig,
) -> Result<BrowserExchangeRateHandler> {
    ExchangeRateHandler::new(DuckDbWasm::new(bundle), OpfsStorage::new(), config)
}
