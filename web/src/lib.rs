//! Explorer web front end
//!
//! Mounts the page matching the current location: RTC stats on `/`, exchange
//! rates on `/exchangerate`. A header nav links both.

pub mod controller;
pub mod download;
pub mod editor;
pub mod page;
pub mod view;

use data_engine::{
    BrowserExchangeRateHandler, BrowserRtcStatsHandler, DatasetConfig, DatasetKind, EngineBundle, OpfsStorage,
};
use page::Page;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::Element;

pub use controller::{PageController, PageState};

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
    log::info!("Explorer initialized");
}

enum MountedPage {
    RtcStats(Rc<Page<BrowserRtcStatsHandler>>),
    ExchangeRate(Rc<Page<BrowserExchangeRateHandler>>),
}

struct Mounted {
    shell: Element,
    page: MountedPage,
}

impl Mounted {
    fn unmount(self) {
        match &self.page {
            MountedPage::RtcStats(page) => page.unmount(),
            MountedPage::ExchangeRate(page) => page.unmount(),
        }
        self.shell.remove();
    }
}

thread_local! {
    static MOUNTED: RefCell<Option<Mounted>> = const { RefCell::new(None) };
}

/// Mounts the page for `location.pathname` into `#app`, or `<body>` when
/// there is no such element. Bundle URLs default to the `/duckdb/` build.
#[wasm_bindgen]
pub fn mount(main_module: Option<String>, main_worker: Option<String>) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
    let host: Element = match document.get_element_by_id("app") {
        Some(app) => app,
        None => document
            .body()
            .map(Element::from)
            .ok_or_else(|| JsValue::from_str("document has no body"))?,
    };

    let mut bundle = EngineBundle::default();
    if let Some(url) = main_module {
        bundle.main_module = url;
    }
    if let Some(url) = main_worker {
        bundle.main_worker = url;
    }

    unmount();

    if !OpfsStorage::is_available() {
        log::warn!("OPFS is not available; datasets will be fetched on every load");
    }

    let kind = DatasetKind::from_path(&window.location().pathname()?);
    let shell = document.create_element("div")?;
    shell.set_class_name("app");
    let nav = view::header(&document, kind)?;
    shell.append_child(&nav)?;
    host.append_child(&shell)?;

    let page = match kind {
        DatasetKind::RtcStats => {
            let handler = data_engine::rtc_stats_handler(bundle, DatasetConfig::rtc_stats())?;
            MountedPage::RtcStats(Page::mount(&document, &shell, handler)?)
        }
        DatasetKind::ExchangeRate => {
            let handler = data_engine::exchange_rate_handler(bundle, DatasetConfig::exchange_rate())?;
            MountedPage::ExchangeRate(Page::mount(&document, &shell, handler)?)
        }
    };
    log::info!("mounted {:?} page", kind);

    MOUNTED.with(|mounted| mounted.replace(Some(Mounted { shell, page })));
    Ok(())
}

/// Tears down the mounted page, if any
#[wasm_bindgen]
pub fn unmount() {
    if let Some(mounted) = MOUNTED.with(|mounted| mounted.take()) {
        mounted.unmount();
    }
}
