//! DuckDB-WASM bindings
//!
//! Binds the `@duckdb/duckdb-wasm` ES module and implements the engine
//! boundary traits on top of it. Each instance runs in its own web worker.

use crate::engine::{Connection, Database, EngineRuntime};
use crate::error::{EngineError, Result};
use explorer_types::{AccessMode, EngineBundle};
use js_sys::{Array, Function, Object, Reflect, Uint8Array, JSON};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[wasm_bindgen(module = "@duckdb/duckdb-wasm")]
extern "C" {
    #[wasm_bindgen(thread_local_v2)]
    static PACKAGE_VERSION: js_sys::JsString;

    #[wasm_bindgen(js_name = ConsoleLogger)]
    type ConsoleLogger;

    #[wasm_bindgen(constructor, js_class = "ConsoleLogger")]
    fn new() -> ConsoleLogger;

    #[wasm_bindgen(js_name = AsyncDuckDB)]
    type AsyncDuckDb;

    #[wasm_bindgen(constructor, js_class = "AsyncDuckDB")]
    fn new(logger: &ConsoleLogger, worker: &web_sys::Worker) -> AsyncDuckDb;

    #[wasm_bindgen(method, catch)]
    async fn instantiate(this: &AsyncDuckDb, main_module: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch)]
    async fn open(this: &AsyncDuckDb, config: &Object) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch)]
    async fn connect(this: &AsyncDuckDb) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = getVersion)]
    async fn get_version(this: &AsyncDuckDb) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = registerFileBuffer)]
    async fn register_file_buffer(
        this: &AsyncDuckDb,
        name: &str,
        buffer: Uint8Array,
    ) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = dropFile)]
    async fn drop_file(this: &AsyncDuckDb, name: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = copyFileToBuffer)]
    async fn copy_file_to_buffer(this: &AsyncDuckDb, name: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch)]
    async fn terminate(this: &AsyncDuckDb) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = AsyncDuckDBConnection)]
    type AsyncDuckDbConnection;

    #[wasm_bindgen(method, catch)]
    async fn query(this: &AsyncDuckDbConnection, sql: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch)]
    async fn close(this: &AsyncDuckDbConnection) -> std::result::Result<JsValue, JsValue>;
}

#[wasm_bindgen]
extern "C" {
    /// Arrow table returned by `conn.query`
    type ArrowTable;

    #[wasm_bindgen(method, js_name = toArray)]
    fn to_array(this: &ArrowTable) -> Array;
}

/// Creates DuckDB-WASM instances from a bundle
#[derive(Clone, Debug, Default)]
pub struct DuckDbWasm {
    bundle: EngineBundle,
}

impl DuckDbWasm {
    pub fn new(bundle: EngineBundle) -> Self {
        Self { bundle }
    }
}

impl EngineRuntime for DuckDbWasm {
    type Database = WasmDatabase;

    async fn instantiate(&self) -> Result<WasmDatabase> {
        let worker = web_sys::Worker::new(&self.bundle.main_worker)
            .map_err(EngineError::js("spawn duckdb worker"))?;
        let db = AsyncDuckDb::new(&ConsoleLogger::new(), &worker);
        if let Err(err) = db.instantiate(&self.bundle.main_module).await {
            worker.terminate();
            return Err(EngineError::js("instantiate duckdb")(err));
        }
        Ok(WasmDatabase { db })
    }

    fn package_version(&self) -> String {
        PACKAGE_VERSION.with(|v| String::from(v))
    }
}

/// A running DuckDB-WASM instance
pub struct WasmDatabase {
    db: AsyncDuckDb,
}

impl Database for WasmDatabase {
    type Connection = WasmConnection;

    async fn open(&self, path: &str, mode: AccessMode) -> Result<()> {
        let config = Object::new();
        Reflect::set(&config, &"path".into(), &path.into()).map_err(EngineError::js("open config"))?;
        Reflect::set(
            &config,
            &"accessMode".into(),
            &JsValue::from(mode.as_js_value()),
        )
        .map_err(EngineError::js("open config"))?;
        self.db.open(&config).await.map_err(EngineError::js("open database"))?;
        Ok(())
    }

    async fn connect(&self) -> Result<WasmConnection> {
        let conn = self.db.connect().await.map_err(EngineError::js("connect"))?;
        Ok(WasmConnection {
            conn: conn.unchecked_into(),
        })
    }

    async fn version(&self) -> Result<String> {
        let version = self.db.get_version().await.map_err(EngineError::js("get version"))?;
        version
            .as_string()
            .ok_or_else(|| EngineError::Storage("engine returned a non-string version".into()))
    }

    async fn register_file_buffer(&self, name: &str, bytes: Vec<u8>) -> Result<()> {
        let buffer = Uint8Array::from(bytes.as_slice());
        self.db
            .register_file_buffer(name, buffer)
            .await
            .map_err(EngineError::js("register file buffer"))?;
        Ok(())
    }

    async fn drop_file(&self, name: &str) -> Result<()> {
        self.db.drop_file(name).await.map_err(EngineError::js("drop file"))?;
        Ok(())
    }

    async fn copy_file_to_buffer(&self, name: &str) -> Result<Vec<u8>> {
        let buffer = self
            .db
            .copy_file_to_buffer(name)
            .await
            .map_err(EngineError::js("copy file to buffer"))?;
        Ok(buffer.unchecked_into::<Uint8Array>().to_vec())
    }

    async fn terminate(&self) -> Result<()> {
        self.db.terminate().await.map_err(EngineError::js("terminate"))?;
        Ok(())
    }
}

/// A connection to a [`WasmDatabase`]
pub struct WasmConnection {
    conn: AsyncDuckDbConnection,
}

impl Connection for WasmConnection {
    async fn query(&self, sql: &str) -> Result<Vec<String>> {
        log::debug!("query: {}", sql.trim());
        let table: ArrowTable = self
            .conn
            .query(sql)
            .await
            .map_err(EngineError::js("query"))?
            .unchecked_into();
        let replacer = bigint_replacer();
        table
            .to_array()
            .iter()
            .map(|row| {
                JSON::stringify_with_replacer(&row, &replacer)
                    .map(String::from)
                    .map_err(EngineError::js("serialize row"))
            })
            .collect()
    }

    async fn close(self) -> Result<()> {
        self.conn.close().await.map_err(EngineError::js("close connection"))?;
        Ok(())
    }
}

thread_local! {
    static BIGINT_REPLACER: Function = Function::new_with_args(
        "_key, value",
        "if (typeof value !== 'bigint') return value; \
         const n = Number(value); \
         return Number.isSafeInteger(n) ? n : value.toString();",
    );
}

/// `JSON.stringify` replacer turning BIGINT columns into numbers, or into
/// strings when they do not fit a double
fn bigint_replacer() -> JsValue {
    BIGINT_REPLACER.with(|f| f.clone().into())
}
