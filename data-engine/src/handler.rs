//! The operation set every dataset page drives
//!
//! Precondition failures (`NotInitialized`, bad configuration) propagate.
//! Operational failures are logged and come back as empty results, zero
//! counts or `None`, so a bad query never takes the page down. Callers cannot
//! tell an empty result from a failed query.

#![allow(async_fn_in_trait)]

use crate::cache::FileStorage;
use crate::engine::{Database, EngineRuntime};
use crate::error::Result;
use crate::result::integer_column;
use crate::session::Session;
use crate::sql;
use explorer_types::{DatasetConfig, DatasetKind, QueryResult};
use log::{error, info};

pub trait DatasetHandler {
    fn kind(&self) -> DatasetKind;

    fn config(&self) -> &DatasetConfig;

    /// Starts the engine; no-op when already running
    async fn init(&self) -> Result<()>;

    /// Engine-reported version; needs a session
    async fn version(&self) -> Result<String>;

    /// Version of the packaged engine library
    fn runtime_version(&self) -> String;

    /// Fixed report query, also the editor's initial document
    fn default_query(&self) -> &'static str;

    /// Fixed 1% sample query behind the "samples" button
    fn sample_query(&self) -> &'static str;

    /// Ensures the dataset table exists
    async fn register(&self) -> Result<()>;

    async fn record_count(&self) -> Result<u64>;

    /// Runs `query` verbatim
    async fn execute_query(&self, query: &str) -> Result<QueryResult>;

    async fn search(&self, term: &str) -> Result<QueryResult>;

    /// Parquet bytes of the exported sample, `None` on failure
    async fn download_sample_parquet(&self) -> Result<Option<Vec<u8>>>;

    /// Tears the session down and removes its files
    async fn purge(&self) -> Result<()>;
}

pub(crate) async fn execute_query<R: EngineRuntime, S: FileStorage>(
    session: &Session<R, S>,
    query: &str,
) -> Result<QueryResult> {
    session.database()?;
    match session.query(query).await {
        Ok(rows) => Ok(QueryResult::from_rows(rows)),
        Err(err) if err.is_precondition() => Err(err),
        Err(err) => {
            error!("query failed: {}", err);
            Ok(QueryResult::empty())
        }
    }
}

/// Runs the search built by `build` unless `term` is blank
pub(crate) async fn search<R: EngineRuntime, S: FileStorage>(
    session: &Session<R, S>,
    term: &str,
    build: impl FnOnce(&str) -> String,
) -> Result<QueryResult> {
    session.database()?;
    if term.trim().is_empty() {
        return Ok(QueryResult::empty());
    }
    execute_query(session, &build(term)).await
}

pub(crate) async fn record_count<R: EngineRuntime, S: FileStorage>(
    session: &Session<R, S>,
    table: &str,
) -> Result<u64> {
    session.database()?;
    match session.query(&sql::count_rows(table)).await {
        Ok(rows) => Ok(rows
            .first()
            .and_then(|row| integer_column(row, "cnt"))
            .unwrap_or(0)),
        Err(err) if err.is_precondition() => Err(err),
        Err(err) => {
            error!("failed to count {}: {}", table, err);
            Ok(0)
        }
    }
}

/// Writes `select` to the sample file and reads it back out
pub(crate) async fn export_parquet<R: EngineRuntime, S: FileStorage>(
    session: &Session<R, S>,
    select: &str,
) -> Result<Option<Vec<u8>>> {
    let db = session.database()?;
    let file = &session.config().sample_parquet_file_name;
    let exported = async {
        session.query(&sql::copy_to_parquet(select, file)).await?;
        db.copy_file_to_buffer(file).await
    };
    match exported.await {
        Ok(bytes) => {
            info!("exported {} ({} bytes)", file, bytes.len());
            Ok(Some(bytes))
        }
        Err(err) => {
            error!("failed to export {}: {}", file, err);
            Ok(None)
        }
    }
}
