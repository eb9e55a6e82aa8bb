//! Page behavior, independent of the DOM
//!
//! Every action catches and logs its own failures; the page keeps whatever
//! it showed before.

use data_engine::DatasetHandler;
use explorer_types::{EditorOptions, KeyBindingMode, QueryResult, SessionStatus};
use log::error;
use std::cell::{Ref, RefCell};

/// Everything the page renders
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageState {
    pub status: SessionStatus,
    /// Document the editor is (re)built with
    pub initial_document: String,
    /// Current editor text
    pub editor_value: String,
    pub key_binding: KeyBindingMode,
    pub result: QueryResult,
    pub search_term: String,
}

impl PageState {
    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions {
            document: self.initial_document.clone(),
            key_binding: self.key_binding,
            line_wrapping: true,
        }
    }
}

pub struct PageController<H> {
    handler: H,
    state: RefCell<PageState>,
}

impl<H: DatasetHandler> PageController<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            state: RefCell::new(PageState::default()),
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn state(&self) -> Ref<'_, PageState> {
        self.state.borrow()
    }

    /// Start the engine, seed the editor and load the dataset
    pub async fn mount(&self) {
        if let Err(err) = self.try_mount().await {
            error!("failed to initialize DuckDB: {}", err);
        }
    }

    async fn try_mount(&self) -> data_engine::Result<()> {
        self.handler.init().await?;

        let version = self.handler.version().await?;
        let default_query = self.handler.default_query().to_string();
        {
            let mut state = self.state.borrow_mut();
            state.status.engine_version = version;
            state.status.runtime_version = self.handler.runtime_version();
            state.initial_document = default_query.clone();
            state.editor_value = default_query;
        }

        self.handler.register().await?;
        let count = self.handler.record_count().await?;

        let mut state = self.state.borrow_mut();
        state.status.record_count = count;
        state.status.opfs = true;
        Ok(())
    }

    /// (Re)load the dataset and refresh the count
    pub async fn fetch_parquet(&self) {
        let loaded = async {
            self.handler.register().await?;
            self.handler.record_count().await
        };
        match loaded.await {
            Ok(count) => {
                let mut state = self.state.borrow_mut();
                state.status.record_count = count;
                state.status.opfs = true;
            }
            Err(err) => error!("fetch-parquet failed: {}", err),
        }
    }

    pub async fn samples(&self) {
        self.execute(self.handler.sample_query()).await;
    }

    pub async fn aggregation(&self) {
        self.execute(self.handler.default_query()).await;
    }

    /// Parquet bytes to offer as a download
    pub async fn download_parquet(&self) -> Option<Vec<u8>> {
        match self.handler.download_sample_parquet().await {
            Ok(bytes) => bytes,
            Err(err) => {
                error!("parquet download failed: {}", err);
                None
            }
        }
    }

    pub async fn purge(&self) {
        self.state.borrow_mut().result = QueryResult::empty();
        if let Err(err) = self.handler.purge().await {
            error!("purge failed: {}", err);
        }
        let mut state = self.state.borrow_mut();
        state.status = SessionStatus::default();
    }

    /// Search as the user types; a blank term clears the table
    pub async fn search_input(&self, value: String) {
        let blank = value.trim().is_empty();
        self.state.borrow_mut().search_term = value.clone();
        if blank {
            self.state.borrow_mut().result = QueryResult::empty();
            return;
        }
        let result = match self.handler.search(&value).await {
            Ok(result) => result,
            Err(err) => {
                error!("search failed: {}", err);
                QueryResult::empty()
            }
        };
        let mut state = self.state.borrow_mut();
        // a slower search for an older term must not overwrite a newer one
        if state.search_term == value {
            state.result = result;
        }
    }

    /// Switch key bindings; the rebuilt editor starts from the live text
    pub fn toggle_vim(&self) {
        let mut state = self.state.borrow_mut();
        state.key_binding = state.key_binding.toggled();
        state.initial_document = state.editor_value.clone();
    }

    pub fn set_editor_value(&self, text: String) {
        self.state.borrow_mut().editor_value = text;
    }

    /// Run the editor's current text; nothing to do when it is empty
    pub async fn run_editor_query(&self) {
        let query = self.state.borrow().editor_value.clone();
        if query.is_empty() {
            return;
        }
        self.execute(&query).await;
    }

    async fn execute(&self, query: &str) {
        match self.handler.execute_query(query).await {
            Ok(result) => self.state.borrow_mut().result = result,
            Err(err) => error!("query failed: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_engine::testing::{FakeFetcher, FakeHost, FakeRuntime, FakeStorage, FAKE_ENGINE_VERSION};
    use data_engine::{DatasetConfig, RtcStatsHandler};
    use futures::executor::block_on;
    use serde_json::json;

    type Controller = PageController<RtcStatsHandler<FakeRuntime, FakeStorage, FakeFetcher>>;

    fn controller(host: &FakeHost) -> Controller {
        let handler = RtcStatsHandler::new(
            host.runtime(),
            host.storage(),
            host.fetcher(),
            DatasetConfig::rtc_stats(),
        )
        .unwrap();
        PageController::new(handler)
    }

    fn serve_rows(host: &FakeHost, n: usize) {
        let rows: Vec<_> = (0..n)
            .map(|i| json!({"timestamp": format!("t{i}"), "connection_id": "c", "rtc_type": "transport"}))
            .collect();
        host.serve(&DatasetConfig::rtc_stats().source_url, FakeHost::parquet(&rows));
    }

    #[test]
    fn mount_fills_status_and_editor() {
        let host = FakeHost::new();
        serve_rows(&host, 12);
        let controller = controller(&host);
        block_on(controller.mount());

        let state = controller.state();
        assert_eq!(state.status.engine_version, FAKE_ENGINE_VERSION);
        assert!(!state.status.runtime_version.is_empty());
        assert!(state.status.opfs);
        assert_eq!(state.status.record_count, 12);
        assert_eq!(state.initial_document, controller.handler().default_query());
        assert_eq!(state.editor_value, state.initial_document);
    }

    #[test]
    fn failed_mount_leaves_page_disabled() {
        let host = FakeHost::new();
        host.fail_instantiate(true);
        let controller = controller(&host);
        block_on(controller.mount());
        assert!(!controller.state().status.is_ready());
    }

    #[test]
    fn run_editor_query_ignores_empty_text() {
        let host = FakeHost::new();
        let controller = controller(&host);
        block_on(controller.mount());
        controller.set_editor_value(String::new());
        host.clear_statements();

        block_on(controller.run_editor_query());
        assert!(host.statements().is_empty());
    }

    #[test]
    fn editor_text_is_executed() {
        let host = FakeHost::new();
        host.respond("SELECT 42 AS answer", vec![json!({"answer": 42})]);
        let controller = controller(&host);
        block_on(controller.mount());

        controller.set_editor_value("SELECT 42 AS answer".to_string());
        block_on(controller.run_editor_query());
        let state = controller.state();
        assert_eq!(state.result.headers, vec!["answer"]);
        // typing does not rebuild the editor
        assert_eq!(state.initial_document, controller.handler().default_query());
    }

    #[test]
    fn blank_search_clears_results() {
        let host = FakeHost::new();
        host.respond("USING SAMPLE", vec![json!({"timestamp": "t0", "connection_id": "c", "rtc_type": "transport"})]);
        let controller = controller(&host);
        block_on(controller.mount());

        block_on(controller.samples());
        assert!(controller.state().result.is_renderable());

        block_on(controller.search_input("  ".to_string()));
        assert_eq!(controller.state().result, QueryResult::empty());
        assert_eq!(controller.state().search_term, "  ");
    }

    #[test]
    fn purge_resets_status_and_results() {
        let host = FakeHost::new();
        serve_rows(&host, 3);
        host.respond("USING SAMPLE", vec![json!({"timestamp": "t0"})]);
        let controller = controller(&host);
        block_on(controller.mount());
        block_on(controller.samples());

        block_on(controller.purge());
        let state = controller.state();
        assert_eq!(state.status, SessionStatus::default());
        assert!(state.result.is_empty());
        assert!(!state.status.is_ready());
    }

    #[test]
    fn download_returns_bytes() {
        let host = FakeHost::new();
        serve_rows(&host, 3);
        let controller = controller(&host);
        block_on(controller.mount());
        assert!(block_on(controller.download_parquet()).is_some());
    }

    #[test]
    fn download_before_init_is_none() {
        let host = FakeHost::new();
        let controller = controller(&host);
        assert!(block_on(controller.download_parquet()).is_none());
    }

    #[test]
    fn toggle_switches_editor_configuration() {
        let controller = controller(&FakeHost::new());
        let before = controller.state().editor_options();
        controller.toggle_vim();
        let after = controller.state().editor_options();
        assert_eq!(before.key_binding, KeyBindingMode::Vim);
        assert_eq!(after.key_binding, KeyBindingMode::Normal);
        assert_ne!(before, after);
    }

    #[test]
    fn toggle_keeps_typed_text() {
        let host = FakeHost::new();
        host.respond("SELECT 42 AS typed", vec![json!({"typed": 42})]);
        let controller = controller(&host);
        block_on(controller.mount());

        controller.set_editor_value("SELECT 42 AS typed".to_string());
        controller.toggle_vim();
        let options = controller.state().editor_options();
        assert_eq!(options.key_binding, KeyBindingMode::Normal);
        assert_eq!(options.document, "SELECT 42 AS typed");

        block_on(controller.run_editor_query());
        assert_eq!(controller.state().result.headers, vec!["typed"]);
    }

    #[test]
    fn fetch_parquet_refreshes_count() {
        let host = FakeHost::new();
        let controller = controller(&host);
        block_on(controller.mount());
        assert_eq!(controller.state().status.record_count, 0);

        serve_rows(&host, 4);
        block_on(controller.fetch_parquet());
        assert_eq!(controller.state().status.record_count, 4);
    }
}
