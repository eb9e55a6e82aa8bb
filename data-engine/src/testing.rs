//! In-memory stand-ins for the engine, OPFS and the network
//!
//! [`FakeHost`] owns the shared state and hands out a [`FakeRuntime`],
//! [`FakeStorage`] and [`FakeFetcher`] wired to it. The fake engine records
//! every statement and understands just the statement shapes the handlers
//! issue: existence probes, `CREATE TABLE ... AS`, `COUNT(*)` and
//! `COPY ... TO`. Anything else returns no rows unless scripted with
//! [`FakeHost::respond`].
//!
//! A fake Parquet file is the JSON array of its rows.

use crate::cache::{FileStorage, Fetcher};
use crate::engine::{Connection, Database, EngineRuntime};
use crate::error::{EngineError, Result};
use explorer_types::{opfs_entry_name, AccessMode, Row};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

pub const FAKE_ENGINE_VERSION: &str = "v1.1.3";
pub const FAKE_PACKAGE_VERSION: &str = "1.29.0";

#[derive(Default)]
struct HostState {
    statements: Vec<String>,
    instantiations: usize,
    terminations: usize,
    open_connections: isize,
    fail_instantiate: bool,
    fail_terminate: bool,
    failing: Vec<String>,
    scripted: Vec<(String, Vec<Row>)>,
    sources: HashMap<String, Vec<Row>>,
    // tables per database file, surviving engine restarts like OPFS would
    disks: HashMap<String, BTreeMap<String, Vec<Row>>>,
    opfs: BTreeMap<String, Vec<u8>>,
    read_only_storage: bool,
    fail_reads: bool,
    fail_writes: bool,
    served: HashMap<String, Vec<u8>>,
    fetches: Vec<String>,
}

/// Shared state behind every fake
#[derive(Clone, Default)]
pub struct FakeHost {
    state: Rc<RefCell<HostState>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runtime(&self) -> FakeRuntime {
        FakeRuntime { state: self.state.clone() }
    }

    pub fn storage(&self) -> FakeStorage {
        FakeStorage { state: self.state.clone() }
    }

    pub fn fetcher(&self) -> FakeFetcher {
        FakeFetcher { state: self.state.clone() }
    }

    /// Encodes rows as a fake Parquet file
    pub fn parquet(rows: &[Value]) -> Vec<u8> {
        serde_json::to_vec(rows).unwrap_or_default()
    }

    /// Decodes a fake Parquet file
    pub fn read_parquet(bytes: &[u8]) -> Vec<Row> {
        serde_json::from_slice::<Vec<Value>>(bytes)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect()
    }

    /// Serve `bytes` at `url`; other URLs answer 404
    pub fn serve(&self, url: &str, bytes: Vec<u8>) {
        self.state.borrow_mut().served.insert(url.to_string(), bytes);
    }

    /// Rows a `CREATE TABLE <table> AS ...` without `read_parquet` produces
    pub fn seed_source(&self, table: &str, rows: Vec<Value>) {
        let rows = rows.into_iter().filter_map(|v| v.as_object().cloned()).collect();
        self.state.borrow_mut().sources.insert(table.to_string(), rows);
    }

    /// Statements containing `pattern` return `rows`
    pub fn respond(&self, pattern: &str, rows: Vec<Value>) {
        let rows = rows.into_iter().filter_map(|v| v.as_object().cloned()).collect();
        self.state.borrow_mut().scripted.push((pattern.to_string(), rows));
    }

    /// Statements containing `pattern` fail
    pub fn fail_queries_containing(&self, pattern: &str) {
        self.state.borrow_mut().failing.push(pattern.to_string());
    }

    pub fn fail_instantiate(&self, fail: bool) {
        self.state.borrow_mut().fail_instantiate = fail;
    }

    pub fn fail_terminate(&self, fail: bool) {
        self.state.borrow_mut().fail_terminate = fail;
    }

    pub fn set_storage_writable(&self, writable: bool) {
        self.state.borrow_mut().read_only_storage = !writable;
    }

    pub fn fail_storage_reads(&self, fail: bool) {
        self.state.borrow_mut().fail_reads = fail;
    }

    pub fn fail_storage_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    pub fn put_opfs_entry(&self, name: &str, bytes: Vec<u8>) {
        self.state.borrow_mut().opfs.insert(name.to_string(), bytes);
    }

    pub fn opfs_entry(&self, name: &str) -> Option<Vec<u8>> {
        self.state.borrow().opfs.get(name).cloned()
    }

    /// Rows of `table` in the database file at `db_path`
    pub fn table_rows(&self, db_path: &str, table: &str) -> Option<Vec<Row>> {
        let state = self.state.borrow();
        state.disks.get(opfs_entry_name(db_path))?.get(table).cloned()
    }

    pub fn statements(&self) -> Vec<String> {
        self.state.borrow().statements.clone()
    }

    pub fn clear_statements(&self) {
        self.state.borrow_mut().statements.clear();
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.state.borrow().fetches.iter().filter(|u| *u == url).count()
    }

    pub fn instantiations(&self) -> usize {
        self.state.borrow().instantiations
    }

    pub fn terminations(&self) -> usize {
        self.state.borrow().terminations
    }

    pub fn open_connections(&self) -> isize {
        self.state.borrow().open_connections
    }
}

fn fake_error(message: impl Into<String>) -> EngineError {
    EngineError::Js {
        context: "fake engine",
        message: message.into(),
    }
}

fn between<'a>(text: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = text.find(start)? + start.len();
    let len = text[from..].find(end)?;
    Some(&text[from..from + len])
}

fn first_word(text: &str) -> &str {
    text.split(|c: char| c.is_whitespace() || c == ';' || c == ')')
        .find(|w| !w.is_empty())
        .unwrap_or("")
}

fn encode(rows: &[Row]) -> Vec<String> {
    rows.iter().map(|row| Value::Object(row.clone()).to_string()).collect()
}

#[derive(Clone)]
pub struct FakeRuntime {
    state: Rc<RefCell<HostState>>,
}

impl EngineRuntime for FakeRuntime {
    type Database = FakeDatabase;

    async fn instantiate(&self) -> Result<FakeDatabase> {
        let mut state = self.state.borrow_mut();
        if state.fail_instantiate {
            return Err(fake_error("instantiate failed"));
        }
        state.instantiations += 1;
        Ok(FakeDatabase {
            instance: Rc::new(Instance {
                state: self.state.clone(),
                disk: RefCell::new(None),
                files: RefCell::new(HashMap::new()),
                terminated: Cell::new(false),
            }),
        })
    }

    fn package_version(&self) -> String {
        FAKE_PACKAGE_VERSION.to_string()
    }
}

struct Instance {
    state: Rc<RefCell<HostState>>,
    disk: RefCell<Option<String>>,
    files: RefCell<HashMap<String, Vec<u8>>>,
    terminated: Cell<bool>,
}

impl Instance {
    fn check_alive(&self) -> Result<()> {
        if self.terminated.get() {
            return Err(fake_error("database has been terminated"));
        }
        Ok(())
    }

    fn execute(&self, sql: &str) -> Result<Vec<String>> {
        let sql = sql.trim();
        let mut state = self.state.borrow_mut();
        state.statements.push(sql.to_string());
        self.check_alive()?;

        if let Some(pattern) = state.failing.iter().find(|p| sql.contains(p.as_str())) {
            return Err(fake_error(format!("statement matched failing pattern {pattern}")));
        }
        if let Some((_, rows)) = state.scripted.iter().find(|(p, _)| sql.contains(p.as_str())) {
            return Ok(encode(rows));
        }

        let disk_name = self.disk.borrow().clone().unwrap_or_default();
        let HostState { disks, sources, .. } = &mut *state;
        let disk = disks.entry(disk_name).or_default();

        if sql.contains("information_schema.tables") {
            let table = between(sql, "table_name = '", "'").unwrap_or("");
            let exists = disk.contains_key(table);
            return Ok(vec![serde_json::json!({ "exists_flag": exists }).to_string()]);
        }

        if let Some(rest) = sql.strip_prefix("CREATE TABLE ") {
            let table = first_word(rest).to_string();
            if disk.contains_key(&table) {
                return Err(fake_error(format!("Table with name {table} already exists!")));
            }
            let rows = match between(sql, "read_parquet('", "')") {
                Some(file) => {
                    let files = self.files.borrow();
                    let bytes = files
                        .get(file)
                        .ok_or_else(|| fake_error(format!("No files found that match the pattern \"{file}\"")))?;
                    FakeHost::read_parquet(bytes)
                }
                None => sources.get(&table).cloned().unwrap_or_default(),
            };
            disk.insert(table, rows);
            return Ok(Vec::new());
        }

        if let Some(rest) = sql.strip_prefix("SELECT COUNT(*) AS cnt FROM ") {
            let table = first_word(rest);
            let rows = disk
                .get(table)
                .ok_or_else(|| fake_error(format!("Table with name {table} does not exist!")))?;
            return Ok(vec![serde_json::json!({ "cnt": rows.len() }).to_string()]);
        }

        if sql.starts_with("COPY (") {
            let table = between(sql, "FROM ", " ").map(first_word).unwrap_or("");
            let rows = disk
                .get(table)
                .ok_or_else(|| fake_error(format!("Table with name {table} does not exist!")))?;
            let kept: Vec<Value> = rows
                .iter()
                .enumerate()
                .filter(|(i, _)| !sql.contains("USING SAMPLE") || i % 100 == 0)
                .map(|(_, row)| Value::Object(row.clone()))
                .collect();
            let file = between(sql, "TO '", "'").unwrap_or("out.parquet");
            self.files
                .borrow_mut()
                .insert(file.to_string(), FakeHost::parquet(&kept));
            return Ok(Vec::new());
        }

        Ok(Vec::new())
    }
}

pub struct FakeDatabase {
    instance: Rc<Instance>,
}

impl Database for FakeDatabase {
    type Connection = FakeConnection;

    async fn open(&self, path: &str, _mode: AccessMode) -> Result<()> {
        self.instance.check_alive()?;
        let name = opfs_entry_name(path).to_string();
        let mut state = self.instance.state.borrow_mut();
        state.disks.entry(name.clone()).or_default();
        state.opfs.entry(name.clone()).or_insert_with(|| b"duckdb".to_vec());
        *self.instance.disk.borrow_mut() = Some(name);
        Ok(())
    }

    async fn connect(&self) -> Result<FakeConnection> {
        self.instance.check_alive()?;
        self.instance.state.borrow_mut().open_connections += 1;
        Ok(FakeConnection {
            instance: self.instance.clone(),
        })
    }

    async fn version(&self) -> Result<String> {
        self.instance.check_alive()?;
        Ok(FAKE_ENGINE_VERSION.to_string())
    }

    async fn register_file_buffer(&self, name: &str, bytes: Vec<u8>) -> Result<()> {
        self.instance.check_alive()?;
        self.instance.files.borrow_mut().insert(name.to_string(), bytes);
        Ok(())
    }

    async fn drop_file(&self, name: &str) -> Result<()> {
        self.instance.files.borrow_mut().remove(name);
        Ok(())
    }

    async fn copy_file_to_buffer(&self, name: &str) -> Result<Vec<u8>> {
        self.instance
            .files
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| fake_error(format!("file {name} not found")))
    }

    async fn terminate(&self) -> Result<()> {
        self.instance.check_alive()?;
        if self.instance.state.borrow().fail_terminate {
            return Err(fake_error("terminate failed"));
        }
        self.instance.terminated.set(true);
        self.instance.state.borrow_mut().terminations += 1;
        Ok(())
    }
}

pub struct FakeConnection {
    instance: Rc<Instance>,
}

impl Connection for FakeConnection {
    async fn query(&self, sql: &str) -> Result<Vec<String>> {
        self.instance.execute(sql)
    }

    async fn close(self) -> Result<()> {
        self.instance.state.borrow_mut().open_connections -= 1;
        Ok(())
    }
}

/// OPFS stand-in; removing a database file also drops its tables
#[derive(Clone)]
pub struct FakeStorage {
    state: Rc<RefCell<HostState>>,
}

impl FileStorage for FakeStorage {
    fn supports_write(&self) -> bool {
        !self.state.borrow().read_only_storage
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let state = self.state.borrow();
        if state.fail_reads {
            return Err(EngineError::Storage(format!("cannot read {name}")));
        }
        Ok(state.opfs.get(name).cloned())
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_writes {
            return Err(EngineError::Storage(format!("cannot write {name}")));
        }
        state.opfs.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.disks.remove(name);
        state
            .opfs
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| EngineError::Storage(format!("NotFoundError: {name}")))
    }
}

#[derive(Clone)]
pub struct FakeFetcher {
    state: Rc<RefCell<HostState>>,
}

impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut state = self.state.borrow_mut();
        state.fetches.push(url.to_string());
        state.served.get(url).cloned().ok_or_else(|| EngineError::Network {
            url: url.to_string(),
            status: 404,
        })
    }
}
