//! USD/JPY exchange rate dataset (`exchange_rates`), loaded straight from a
//! JSON API by the engine's JSON reader

use crate::cache::FileStorage;
use crate::engine::EngineRuntime;
use crate::error::Result;
use crate::handler::{self, DatasetHandler};
use crate::session::Session;
use crate::sql;
use explorer_types::{ConfigField, DatasetConfig, DatasetKind, QueryResult};
use log::error;

pub const TABLE: &str = "exchange_rates";

pub const DEFAULT_QUERY: &str = "SELECT
  date,
  rate
FROM exchange_rates
ORDER BY date;";

pub const SAMPLE_QUERY: &str = "SELECT date, rate
FROM exchange_rates
USING SAMPLE 1 PERCENT (bernoulli);";

/// The API answers `{"rates": {"<date>": {"JPY": <rate>}, ...}}`; each map
/// entry becomes one `(date, rate)` row
pub fn create_table(source_url: &str) -> String {
    format!(
        "CREATE TABLE {TABLE} AS
SELECT
  date_str::DATE AS date,
  rate.jpy AS rate
FROM (
  SELECT
    unnest(map_keys(rates)) AS date_str,
    unnest(map_values(rates)) AS rate
  FROM
    read_json_auto('{source_url}')
);"
    )
}

/// Dates whose text contains `term`
pub fn search_query(term: &str) -> String {
    format!(
        "SELECT date, rate
FROM exchange_rates
WHERE CAST(date AS TEXT) LIKE {}
ORDER BY date;",
        sql::contains_pattern(term)
    )
}

const REQUIRED: [ConfigField; 3] = [
    ConfigField::DbPath,
    ConfigField::SampleParquetFileName,
    ConfigField::SourceUrl,
];

pub struct ExchangeRateHandler<R: EngineRuntime, S> {
    session: Session<R, S>,
}

impl<R: EngineRuntime, S: FileStorage> ExchangeRateHandler<R, S> {
    pub fn new(runtime: R, storage: S, config: DatasetConfig) -> Result<Self> {
        config.validate(&REQUIRED)?;
        Ok(Self {
            session: Session::new(runtime, storage, config),
        })
    }
}

impl<R: EngineRuntime, S: FileStorage> DatasetHandler for ExchangeRateHandler<R, S> {
    fn kind(&self) -> DatasetKind {
        DatasetKind::ExchangeRate
    }

    fn config(&self) -> &DatasetConfig {
        self.session.config()
    }

    async fn init(&self) -> Result<()> {
        self.session.init().await
    }

    async fn version(&self) -> Result<String> {
        self.session.version().await
    }

    fn runtime_version(&self) -> String {
        self.session.runtime_version()
    }

    fn default_query(&self) -> &'static str {
        DEFAULT_QUERY
    }

    fn sample_query(&self) -> &'static str {
        SAMPLE_QUERY
    }

    async fn register(&self) -> Result<()> {
        self.session.database()?;
        let create = create_table(&self.session.config().source_url);
        match self.session.create_table_if_absent(TABLE, &create).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_precondition() => Err(err),
            Err(err) => {
                error!("failed to create {}: {}", TABLE, err);
                Ok(())
            }
        }
    }

    async fn record_count(&self) -> Result<u64> {
        handler::record_count(&self.session, TABLE).await
    }

    async fn execute_query(&self, query: &str) -> Result<QueryResult> {
        handler::execute_query(&self.session, query).await
    }

    async fn search(&self, term: &str) -> Result<QueryResult> {
        handler::search(&self.session, term, search_query).await
    }

    /// Exports the whole table; it holds a few hundred rows
    async fn download_sample_parquet(&self) -> Result<Option<Vec<u8>>> {
        handler::export_parquet(&self.session, &format!("SELECT * FROM {TABLE}")).await
    }

    async fn purge(&self) -> Result<()> {
        self.session.purge().await
    }
}
