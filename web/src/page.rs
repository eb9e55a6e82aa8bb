//! DOM page for one dataset
//!
//! Listeners only hold weak references to the page; the page itself is owned
//! by whoever mounted it and torn down with [`Page::unmount`].

use crate::controller::PageController;
use crate::download::Downloader;
use crate::editor::SqlEditor;
use crate::view;
use data_engine::DatasetHandler;
use log::error;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, EventTarget, HtmlButtonElement, HtmlInputElement};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    FetchParquet,
    Samples,
    DownloadParquet,
    Aggregation,
    Purge,
    ToggleVim,
    RunQuery,
}

/// Dataset buttons, left to right
const DATASET_ACTIONS: [(Action, &str); 5] = [
    (Action::FetchParquet, "fetch-parquet"),
    (Action::Samples, "samples"),
    (Action::DownloadParquet, "download parquet"),
    (Action::Aggregation, "aggregation"),
    (Action::Purge, "purge"),
];

struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

pub struct Page<H: DatasetHandler + 'static> {
    controller: PageController<H>,
    document: Document,
    root: Element,
    status_panel: Element,
    editor_host: Element,
    result_panel: Element,
    search: HtmlInputElement,
    toggle: HtmlButtonElement,
    run: HtmlButtonElement,
    dataset_buttons: Vec<(Action, HtmlButtonElement)>,
    editor: RefCell<Option<SqlEditor>>,
    downloader: Downloader,
    listeners: RefCell<Vec<Listener>>,
}

fn button(document: &Document, label: &str) -> Result<HtmlButtonElement, JsValue> {
    let button: HtmlButtonElement = document.create_element("button")?.dyn_into()?;
    button.set_type("button");
    button.set_text_content(Some(label));
    button.set_disabled(true);
    Ok(button)
}

fn div(document: &Document, class: &str) -> Result<Element, JsValue> {
    let div = document.create_element("div")?;
    div.set_class_name(class);
    Ok(div)
}

impl<H: DatasetHandler + 'static> Page<H> {
    /// Builds the page under `parent` and starts the mount sequence
    pub fn mount(document: &Document, parent: &Element, handler: H) -> Result<Rc<Self>, JsValue> {
        let root = div(document, "page")?;

        let controls = div(document, "controls")?;
        let mut dataset_buttons = Vec::with_capacity(DATASET_ACTIONS.len());
        for (action, label) in DATASET_ACTIONS {
            let button = button(document, label)?;
            controls.append_child(&button)?;
            dataset_buttons.push((action, button));
        }
        let search: HtmlInputElement = document.create_element("input")?.dyn_into()?;
        search.set_type("search");
        search.set_placeholder("Search");
        search.set_disabled(true);
        controls.append_child(&search)?;
        root.append_child(&controls)?;

        let status_panel = div(document, "info")?;
        root.append_child(&status_panel)?;

        let editor_controls = div(document, "editor-controls")?;
        let toggle = button(document, "")?;
        toggle.set_disabled(false);
        let run = button(document, "Run Query")?;
        editor_controls.append_child(&toggle)?;
        editor_controls.append_child(&run)?;
        root.append_child(&editor_controls)?;

        let editor_host = div(document, "editor")?;
        root.append_child(&editor_host)?;
        let result_panel = div(document, "result")?;
        root.append_child(&result_panel)?;

        parent.append_child(&root)?;

        let page = Rc::new(Self {
            controller: PageController::new(handler),
            document: document.clone(),
            root,
            status_panel,
            editor_host,
            result_panel,
            search,
            toggle,
            run,
            dataset_buttons,
            editor: RefCell::new(None),
            downloader: Downloader::new(),
            listeners: RefCell::new(Vec::new()),
        });

        for (action, button) in &page.dataset_buttons {
            page.on_click(button, *action);
        }
        page.on_click(&page.toggle, Action::ToggleVim);
        page.on_click(&page.run, Action::RunQuery);
        page.on_search_input();
        page.render();

        let mounting = page.clone();
        spawn_local(async move {
            mounting.controller.mount().await;
            mounting.render();
        });
        Ok(page)
    }

    fn listen(&self, target: &EventTarget, event: &'static str, callback: Closure<dyn FnMut(Event)>) {
        if let Err(err) = target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref()) {
            error!("failed to listen for {}: {:?}", event, err);
            return;
        }
        self.listeners.borrow_mut().push(Listener {
            target: target.clone(),
            event,
            callback,
        });
    }

    fn on_click(self: &Rc<Self>, target: &EventTarget, action: Action) {
        let page = Rc::downgrade(self);
        let callback = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            if let Some(page) = page.upgrade() {
                spawn_local(page.perform(action));
            }
        });
        self.listen(target, "click", callback);
    }

    fn on_search_input(self: &Rc<Self>) {
        let page = Rc::downgrade(self);
        let callback = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            if let Some(page) = page.upgrade() {
                let value = page.search.value();
                spawn_local(async move {
                    page.controller.search_input(value).await;
                    page.render();
                });
            }
        });
        self.listen(&self.search, "input", callback);
    }

    async fn perform(self: Rc<Self>, action: Action) {
        match action {
            Action::FetchParquet => self.controller.fetch_parquet().await,
            Action::Samples => self.controller.samples().await,
            Action::Aggregation => self.controller.aggregation().await,
            Action::Purge => self.controller.purge().await,
            Action::ToggleVim => self.controller.toggle_vim(),
            Action::RunQuery => self.controller.run_editor_query().await,
            Action::DownloadParquet => {
                if let Some(bytes) = self.controller.download_parquet().await {
                    let file_name = &self.controller.handler().config().sample_parquet_file_name;
                    if let Err(err) = self.downloader.save(&self.document, &bytes, file_name) {
                        error!("failed to save {}: {:?}", file_name, err);
                    }
                }
            }
        }
        self.render();
    }

    /// Brings the DOM in line with the controller state
    pub fn render(self: &Rc<Self>) {
        if let Err(err) = self.try_render() {
            error!("render failed: {:?}", err);
        }
    }

    fn try_render(self: &Rc<Self>) -> Result<(), JsValue> {
        let (ready, options) = {
            let state = self.controller.state();
            view::render_status(&self.document, &self.status_panel, &state.status)?;
            view::render_result(&self.document, &self.result_panel, &state.result)?;
            self.toggle.set_text_content(Some(state.key_binding.toggle_label()));
            (state.status.is_ready(), state.editor_options())
        };

        for (_, button) in &self.dataset_buttons {
            button.set_disabled(!ready);
        }
        self.search.set_disabled(!ready);
        self.run.set_disabled(!ready);

        let stale = self
            .editor
            .borrow()
            .as_ref()
            .map_or(true, |editor| editor.options() != &options);
        if stale {
            // the old view must be gone before the new one attaches
            self.editor.replace(None);
            let editor = SqlEditor::new(&self.editor_host, options, self.change_handler())?;
            self.editor.replace(Some(editor));
        }
        Ok(())
    }

    fn change_handler(self: &Rc<Self>) -> Rc<dyn Fn(String)> {
        let page: Weak<Self> = Rc::downgrade(self);
        Rc::new(move |text: String| {
            if let Some(page) = page.upgrade() {
                page.controller.set_editor_value(text);
            }
        })
    }

    /// Removes listeners, the editor and the page's DOM
    pub fn unmount(&self) {
        for listener in self.listeners.borrow_mut().drain(..) {
            if let Err(err) = listener
                .target
                .remove_event_listener_with_callback(listener.event, listener.callback.as_ref().unchecked_ref())
            {
                log::warn!("failed to remove {} listener: {:?}", listener.event, err);
            }
        }
        self.editor.replace(None);
        self.root.remove();
    }
}
