//! WebRTC stats log dataset (`rtc_stats`), loaded from a Parquet file

use crate::cache::{BlobCache, Fetcher, FileStorage};
use crate::engine::{Database, EngineRuntime};
use crate::error::Result;
use crate::handler::{self, DatasetHandler};
use crate::session::Session;
use crate::sql;
use explorer_types::{ConfigField, DatasetConfig, DatasetKind, QueryResult};
use log::{debug, error, warn};

pub const TABLE: &str = "rtc_stats";

/// Per-connection transport counters bucketed to 15 seconds, diffed against
/// the previous bucket. The first bucket of every connection has no previous
/// value and is filtered out.
pub const DEFAULT_QUERY: &str = "SELECT
    time_bucket,
    channel_id,
    session_id,
    connection_id,
    bytes_sent_diff,
    bytes_received_diff,
    packets_sent_diff,
    packets_received_diff
  FROM (
    SELECT
      time_bucket,
      channel_id,
      session_id,
      connection_id,
      bytes_sent - LAG(bytes_sent) OVER (PARTITION BY channel_id, session_id, connection_id ORDER BY time_bucket) AS bytes_sent_diff,
      bytes_received - LAG(bytes_received) OVER (PARTITION BY channel_id, session_id, connection_id ORDER BY time_bucket) AS bytes_received_diff,
      packets_sent - LAG(packets_sent) OVER (PARTITION BY channel_id, session_id, connection_id ORDER BY time_bucket) AS packets_sent_diff,
      packets_received - LAG(packets_received) OVER (PARTITION BY channel_id, session_id, connection_id ORDER BY time_bucket) AS packets_received_diff
    FROM (
      SELECT
        strftime(time_bucket('15 seconds', strptime(timestamp, '%Y-%m-%dT%H:%M:%S.%fZ')), '%Y-%m-%d %H:%M:%S') AS time_bucket,
        channel_id,
        session_id,
        connection_id,
        MAX(CAST(rtc_data->'$.bytesSent' AS BIGINT)) AS bytes_sent,
        MAX(CAST(rtc_data->'$.bytesReceived' AS BIGINT)) AS bytes_received,
        MAX(CAST(rtc_data->'$.packetsSent' AS BIGINT)) AS packets_sent,
        MAX(CAST(rtc_data->'$.packetsReceived' AS BIGINT)) AS packets_received
      FROM rtc_stats
      WHERE rtc_type = 'transport'
      GROUP BY time_bucket, channel_id, session_id, connection_id
    )
  )
  WHERE
    bytes_sent_diff IS NOT NULL AND
    bytes_received_diff IS NOT NULL AND
    packets_sent_diff IS NOT NULL AND
    packets_received_diff IS NOT NULL
  ORDER BY time_bucket ASC;";

pub const SAMPLE_QUERY: &str = "SELECT timestamp, connection_id, rtc_type
FROM rtc_stats
USING SAMPLE 1 PERCENT (bernoulli);";

pub fn create_table(parquet_file: &str) -> String {
    format!("CREATE TABLE {TABLE} AS SELECT * FROM read_parquet('{parquet_file}');")
}

/// Sampled match of `term` against the id, timestamp and type columns
pub fn search_query(term: &str) -> String {
    let pattern = sql::contains_pattern(term);
    format!(
        "SELECT timestamp, connection_id, rtc_type
FROM rtc_stats
WHERE connection_id LIKE {pattern}
   OR channel_id LIKE {pattern}
   OR timestamp LIKE {pattern}
   OR rtc_type LIKE {pattern}
{};",
        sql::BERNOULLI_ONE_PERCENT
    )
}

fn sample_export_select() -> String {
    format!("SELECT * FROM {TABLE} {}", sql::BERNOULLI_ONE_PERCENT)
}

const REQUIRED: [ConfigField; 4] = [
    ConfigField::DbPath,
    ConfigField::ParquetFileName,
    ConfigField::SampleParquetFileName,
    ConfigField::SourceUrl,
];

pub struct RtcStatsHandler<R: EngineRuntime, S, F> {
    session: Session<R, S>,
    cache: BlobCache<S, F>,
}

impl<R, S, F> RtcStatsHandler<R, S, F>
where
    R: EngineRuntime,
    S: FileStorage + Clone,
    F: Fetcher,
{
    /// Fails when any configuration field is empty
    pub fn new(runtime: R, storage: S, fetcher: F, config: DatasetConfig) -> Result<Self> {
        config.validate(&REQUIRED)?;
        let cache = BlobCache::new(storage.clone(), fetcher, config.parquet_file_name.clone());
        Ok(Self {
            session: Session::new(runtime, storage, config),
            cache,
        })
    }

    async fn load_table(&self) -> Result<()> {
        if self.session.table_exists(TABLE).await? {
            debug!("{} already registered", TABLE);
            return Ok(());
        }
        let config = self.session.config();
        let bytes = self.cache.load(&config.source_url).await?;
        let db = self.session.database()?;
        db.register_file_buffer(&config.parquet_file_name, bytes).await?;
        let created = self
            .session
            .create_table_if_absent(TABLE, &create_table(&config.parquet_file_name))
            .await;
        if let Err(err) = db.drop_file(&config.parquet_file_name).await {
            warn!("failed to drop {}: {}", config.parquet_file_name, err);
        }
        created.map(|_| ())
    }
}

impl<R, S, F> DatasetHandler for RtcStatsHandler<R, S, F>
where
    R: EngineRuntime,
    S: FileStorage + Clone,
    F: Fetcher,
{
    fn kind(&self) -> DatasetKind {
        DatasetKind::RtcStats
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
        match self.load_table().await {
            Err(err) if err.is_precondition() => Err(err),
            Err(err) => {
                error!("failed to load {}: {}", self.session.config().source_url, err);
                Ok(())
            }
            Ok(()) => Ok(()),
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

    async fn download_sample_parquet(&self) -> Result<Option<Vec<u8>>> {
        handler::export_parquet(&self.session, &sample_export_select()).await
    }

    async fn purge(&self) -> Result<()> {
        self.session.purge().await?;
        if let Err(err) = self.cache.evict().await {
            warn!("failed to evict cached {}: {}", self.cache.entry(), err);
        }
        Ok(())
    }
}
