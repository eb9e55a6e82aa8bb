//! Network fetch through the window's `fetch`

use crate::cache::Fetcher;
use crate::error::{EngineError, Result};
use js_sys::Uint8Array;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

#[derive(Clone, Copy, Debug, Default)]
pub struct HttpFetcher;

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let window = web_sys::window().ok_or(EngineError::Unsupported("window"))?;
        let response: Response = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(EngineError::js("fetch"))?
            .unchecked_into();
        if !response.ok() {
            return Err(EngineError::Network {
                url: url.to_string(),
                status: response.status(),
            });
        }
        let body = response.array_buffer().map_err(EngineError::js("read body"))?;
        let buffer = JsFuture::from(body).await.map_err(EngineError::js("read body"))?;
        Ok(Uint8Array::new(&buffer).to_vec())
    }
}
