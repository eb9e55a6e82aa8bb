//! OPFS store and blob cache against a real browser

#![cfg(target_arch = "wasm32")]

use data_engine::{BlobCache, EngineError, Fetcher, FileStorage, OpfsStorage, Result};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

struct CountingFetcher {
    calls: Rc<Cell<usize>>,
}

impl Fetcher for CountingFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
        self.calls.set(self.calls.get() + 1);
        Ok(b"PAR1 test PAR1".to_vec())
    }
}

#[wasm_bindgen_test]
async fn write_read_remove_round() {
    assert!(OpfsStorage::is_available());
    let storage = OpfsStorage::new();
    assert!(storage.supports_write());

    storage.write("opfs-test.bin", &[1, 2, 3]).await.unwrap();
    assert_eq!(storage.read("opfs-test.bin").await.unwrap(), Some(vec![1, 2, 3]));

    storage.remove("opfs-test.bin").await.unwrap();
    assert_eq!(storage.read("opfs-test.bin").await.unwrap(), None);
    assert!(matches!(
        storage.remove("opfs-test.bin").await,
        Err(EngineError::Js { .. })
    ));
}

#[wasm_bindgen_test]
async fn cache_fetches_once() {
    let calls = Rc::new(Cell::new(0));
    let fetcher = CountingFetcher { calls: calls.clone() };
    let cache = BlobCache::new(OpfsStorage::new(), fetcher, "cache-test.parquet");
    let _ = cache.evict().await;

    let first = cache.load("https://example.invalid/x.parquet").await.unwrap();
    let second = cache.load("https://example.invalid/x.parquet").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(calls.get(), 1);

    cache.evict().await.unwrap();
}
