//! Boundary to the embedded analytical engine
//!
//! The adapter never executes SQL itself; it sequences calls on these traits.
//! [`crate::duckdb`] implements them over DuckDB-WASM, and
//! [`crate::testing`] provides an in-memory double.
//!
//! All futures are `!Send`: the engine lives on the browser's single thread.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use explorer_types::AccessMode;

/// Produces engine instances and reports the engine library's version
pub trait EngineRuntime {
    type Database: Database;

    /// Instantiate a fresh, unopened engine
    async fn instantiate(&self) -> Result<Self::Database>;

    /// Version string of the packaged engine library
    fn package_version(&self) -> String;
}

/// One engine instance
pub trait Database {
    type Connection: Connection;

    /// Open the database file at `path`
    async fn open(&self, path: &str, mode: AccessMode) -> Result<()>;

    async fn connect(&self) -> Result<Self::Connection>;

    /// Version reported by the running engine
    async fn version(&self) -> Result<String>;

    /// Expose `bytes` to SQL under `name` in the virtual file space
    async fn register_file_buffer(&self, name: &str, bytes: Vec<u8>) -> Result<()>;

    async fn drop_file(&self, name: &str) -> Result<()>;

    /// Read a file written by the engine (e.g. by `COPY ... TO`) out of the
    /// virtual file space
    async fn copy_file_to_buffer(&self, name: &str) -> Result<Vec<u8>>;

    /// Stop the engine. The instance must not be used afterwards.
    async fn terminate(&self) -> Result<()>;
}

/// A connection; every row comes back in its serialized JSON text form
pub trait Connection {
    async fn query(&self, sql: &str) -> Result<Vec<String>>;

    async fn close(self) -> Result<()>;
}
