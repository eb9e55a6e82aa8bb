//! Engine session: one engine instance bound to one database path
//!
//! `Uninitialized -> Ready` via [`Session::init`], back via
//! [`Session::purge`]. Every query opens its own connection and closes it on
//! both the success and the error path.

use crate::cache::FileStorage;
use crate::engine::{Connection, Database, EngineRuntime};
use crate::error::{EngineError, Result};
use crate::result::{bool_column, decode_rows};
use crate::sql;
use explorer_types::{opfs_entry_name, opfs_wal_entry_name, AccessMode, DatasetConfig, Row};
use log::{debug, info, warn};
use std::cell::RefCell;
use std::rc::Rc;

pub struct Session<R: EngineRuntime, S> {
    runtime: R,
    storage: S,
    config: DatasetConfig,
    db: RefCell<Option<Rc<R::Database>>>,
}

impl<R: EngineRuntime, S: FileStorage> Session<R, S> {
    pub fn new(runtime: R, storage: S, config: DatasetConfig) -> Self {
        Self {
            runtime,
            storage,
            config,
            db: RefCell::new(None),
        }
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.db.borrow().is_some()
    }

    /// The live instance, or `NotInitialized`
    pub fn database(&self) -> Result<Rc<R::Database>> {
        self.db.borrow().clone().ok_or(EngineError::NotInitialized)
    }

    /// Instantiates and opens the engine unless a session already exists
    pub async fn init(&self) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }
        let db = self.runtime.instantiate().await?;
        if let Err(err) = prepare(&db, &self.config.db_path).await {
            if let Err(term) = db.terminate().await {
                warn!("failed to terminate half-open engine: {}", term);
            }
            return Err(err);
        }
        *self.db.borrow_mut() = Some(Rc::new(db));
        info!("engine ready at {}", self.config.db_path);
        Ok(())
    }

    pub async fn version(&self) -> Result<String> {
        self.database()?.version().await
    }

    pub fn runtime_version(&self) -> String {
        self.runtime.package_version()
    }

    /// Runs `sql` on a fresh connection and decodes the rows
    pub async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let db = self.database()?;
        let conn = db.connect().await?;
        let raw = conn.query(sql).await;
        close_quietly(conn).await;
        decode_rows(&raw?)
    }

    /// Runs `create` unless `table` already exists, on one connection.
    /// Returns whether the table was created.
    pub async fn create_table_if_absent(&self, table: &str, create: &str) -> Result<bool> {
        let db = self.database()?;
        let conn = db.connect().await?;
        let outcome = create_if_absent(&conn, table, create).await;
        close_quietly(conn).await;
        outcome
    }

    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        let rows = self.query(&sql::table_exists(table)).await?;
        Ok(rows
            .first()
            .and_then(|row| bool_column(row, "exists_flag"))
            .unwrap_or(false))
    }

    /// Terminates the engine and best-effort removes the database files.
    /// The session is uninitialized afterwards even if termination fails.
    pub async fn purge(&self) -> Result<()> {
        let db = self.db.borrow_mut().take();
        if let Some(db) = db {
            match db.terminate().await {
                Ok(()) => info!("engine terminated"),
                Err(err) => warn!("failed to terminate engine: {}", err),
            }
        }
        self.remove_quietly(opfs_entry_name(&self.config.db_path)).await;
        self.remove_quietly(&opfs_wal_entry_name(&self.config.db_path)).await;
        Ok(())
    }

    async fn remove_quietly(&self, name: &str) {
        match self.storage.remove(name).await {
            Ok(()) => debug!("removed {}", name),
            Err(err) => warn!("failed to remove {}: {}", name, err),
        }
    }
}

async fn prepare<D: Database>(db: &D, path: &str) -> Result<()> {
    db.open(path, AccessMode::ReadWrite).await?;
    let conn = db.connect().await?;
    let loaded = conn.query(sql::LOAD_EXTENSIONS).await;
    close_quietly(conn).await;
    loaded.map(|_| ())
}

async fn create_if_absent<C: Connection>(conn: &C, table: &str, create: &str) -> Result<bool> {
    let rows = decode_rows(&conn.query(&sql::table_exists(table)).await?)?;
    let exists = rows
        .first()
        .and_then(|row| bool_column(row, "exists_flag"))
        .unwrap_or(false);
    if exists {
        debug!("table {} already exists", table);
        return Ok(false);
    }
    conn.query(create).await?;
    info!("created table {}", table);
    Ok(true)
}

pub(crate) async fn close_quietly<C: Connection>(conn: C) {
    if let Err(err) = conn.close().await {
        warn!("failed to close connection: {}", err);
    }
}
