//! Browser download of exported Parquet bytes

use js_sys::{Array, Uint8Array};
use std::cell::RefCell;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Blob, BlobPropertyBag, Document, HtmlAnchorElement, Url};

const MIME_TYPE: &str = "application/octet-stream";

/// Offers byte buffers as file downloads
///
/// Holds on to the last object URL and revokes it before the next one is
/// created.
#[derive(Default)]
pub struct Downloader {
    last_url: RefCell<Option<String>>,
}

impl Downloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&self, document: &Document, bytes: &[u8], file_name: &str) -> Result<(), JsValue> {
        self.revoke();

        let parts = Array::new();
        parts.push(&Uint8Array::from(bytes));
        let options = BlobPropertyBag::new();
        options.set_type(MIME_TYPE);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
        let url = Url::create_object_url_with_blob(&blob)?;
        self.last_url.replace(Some(url.clone()));

        let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
        anchor.set_href(&url);
        anchor.set_download(file_name);
        anchor.style().set_property("display", "none")?;

        let body = document.body().ok_or_else(|| JsValue::from_str("document has no body"))?;
        body.append_child(&anchor)?;
        anchor.click();
        body.remove_child(&anchor)?;
        Ok(())
    }

    fn revoke(&self) {
        if let Some(url) = self.last_url.take() {
            if let Err(err) = Url::revoke_object_url(&url) {
                log::warn!("failed to revoke {}: {:?}", url, err);
            }
        }
    }
}

impl Drop for Downloader {
    fn drop(&mut self) {
        self.revoke();
    }
}
