//! Origin Private File System store
//!
//! Files live directly under the OPFS root: the cached source blob and the
//! engine's database file pair (`<db>` and `<db>.wal`).

use crate::cache::FileStorage;
use crate::error::{EngineError, Result};
use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    File, FileSystemDirectoryHandle, FileSystemFileHandle, FileSystemGetFileOptions,
    FileSystemWritableFileStream, StorageManager,
};

/// [`FileStorage`] over the OPFS root directory
#[derive(Clone, Copy, Debug, Default)]
pub struct OpfsStorage;

impl OpfsStorage {
    pub fn new() -> Self {
        Self
    }

    /// Whether `navigator.storage.getDirectory` exists
    pub fn is_available() -> bool {
        storage_manager().is_ok()
    }
}

fn storage_manager() -> Result<StorageManager> {
    let window = web_sys::window().ok_or(EngineError::Unsupported("window"))?;
    let storage = window.navigator().storage();
    if !Reflect::has(&storage, &"getDirectory".into()).unwrap_or(false) {
        return Err(EngineError::Unsupported("OPFS"));
    }
    Ok(storage)
}

async fn root() -> Result<FileSystemDirectoryHandle> {
    let dir = JsFuture::from(storage_manager()?.get_directory())
        .await
        .map_err(EngineError::js("open OPFS root"))?;
    Ok(dir.unchecked_into())
}

fn is_not_found(err: &JsValue) -> bool {
    Reflect::get(err, &"name".into())
        .ok()
        .and_then(|name| name.as_string())
        .map_or(false, |name| name == "NotFoundError")
}

impl FileStorage for OpfsStorage {
    fn supports_write(&self) -> bool {
        Reflect::get(&js_sys::global(), &"FileSystemFileHandle".into())
            .ok()
            .filter(|ctor| !ctor.is_undefined())
            .and_then(|ctor| Reflect::get(&ctor, &"prototype".into()).ok())
            .map_or(false, |proto| {
                Reflect::has(&proto, &"createWritable".into()).unwrap_or(false)
            })
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let root = root().await?;
        let handle: FileSystemFileHandle = match JsFuture::from(root.get_file_handle(name)).await {
            Ok(handle) => handle.unchecked_into(),
            Err(err) if is_not_found(&err) => return Ok(None),
            Err(err) => return Err(EngineError::js("open OPFS entry")(err)),
        };
        let file: File = JsFuture::from(handle.get_file())
            .await
            .map_err(EngineError::js("read OPFS entry"))?
            .unchecked_into();
        let buffer = JsFuture::from(file.array_buffer())
            .await
            .map_err(EngineError::js("read OPFS entry"))?;
        let bytes = Uint8Array::new(&buffer).to_vec();
        // an empty entry is what an interrupted write leaves behind
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(bytes))
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let root = root().await?;
        let options = FileSystemGetFileOptions::new();
        options.set_create(true);
        let handle: FileSystemFileHandle =
            JsFuture::from(root.get_file_handle_with_options(name, &options))
                .await
                .map_err(EngineError::js("create OPFS entry"))?
                .unchecked_into();
        let writable: FileSystemWritableFileStream = JsFuture::from(handle.create_writable())
            .await
            .map_err(EngineError::js("open OPFS writer"))?
            .unchecked_into();
        let data = Uint8Array::from(bytes);
        let written = writable
            .write_with_buffer_source(&data)
            .map_err(EngineError::js("write OPFS entry"))?;
        JsFuture::from(written)
            .await
            .map_err(EngineError::js("write OPFS entry"))?;
        JsFuture::from(writable.close())
            .await
            .map_err(EngineError::js("close OPFS writer"))?;
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let root = root().await?;
        JsFuture::from(root.remove_entry(name))
            .await
            .map_err(EngineError::js("remove OPFS entry"))?;
        Ok(())
    }
}
