//! CodeMirror 6 SQL editor
//!
//! The editor is built from [`EditorOptions`]; changing the options means
//! building a new one. Document edits are reported through a callback and
//! never cause a rebuild.

use explorer_types::{EditorOptions, KeyBindingMode};
use js_sys::{Array, Object, Reflect};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::Element;

#[wasm_bindgen(module = "codemirror")]
extern "C" {
    #[wasm_bindgen(thread_local_v2, js_name = basicSetup)]
    static BASIC_SETUP: JsValue;

    type EditorView;

    #[wasm_bindgen(constructor)]
    fn new(config: &Object) -> EditorView;

    #[wasm_bindgen(method)]
    fn destroy(this: &EditorView);

    #[wasm_bindgen(static_method_of = EditorView, getter = lineWrapping)]
    fn line_wrapping() -> JsValue;

    #[wasm_bindgen(static_method_of = EditorView, getter = updateListener)]
    fn update_listener() -> Facet;
}

#[wasm_bindgen(module = "@codemirror/state")]
extern "C" {
    type EditorState;

    #[wasm_bindgen(static_method_of = EditorState)]
    fn create(config: &Object) -> EditorState;
}

#[wasm_bindgen(module = "@codemirror/lang-sql")]
extern "C" {
    #[wasm_bindgen(js_name = sql)]
    fn sql_language() -> JsValue;
}

#[wasm_bindgen(module = "@replit/codemirror-vim")]
extern "C" {
    fn vim() -> JsValue;
}

#[wasm_bindgen]
extern "C" {
    type Facet;

    #[wasm_bindgen(method)]
    fn of(this: &Facet, value: &JsValue) -> JsValue;

    type ViewUpdate;

    #[wasm_bindgen(method, getter = docChanged)]
    fn doc_changed(this: &ViewUpdate) -> bool;

    #[wasm_bindgen(method, getter)]
    fn state(this: &ViewUpdate) -> EditorState;

    #[wasm_bindgen(method, getter)]
    fn doc(this: &EditorState) -> Text;

    type Text;

    #[wasm_bindgen(method, js_name = toString)]
    fn text(this: &Text) -> String;
}

/// Editor extensions, in the order they are installed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extension {
    /// Must precede the default keymaps
    Vim,
    BasicSetup,
    Sql,
    LineWrapping,
    ChangeListener,
}

pub fn extensions_for(options: &EditorOptions) -> Vec<Extension> {
    let mut extensions = Vec::with_capacity(5);
    if options.key_binding == KeyBindingMode::Vim {
        extensions.push(Extension::Vim);
    }
    extensions.push(Extension::BasicSetup);
    extensions.push(Extension::Sql);
    if options.line_wrapping {
        extensions.push(Extension::LineWrapping);
    }
    extensions.push(Extension::ChangeListener);
    extensions
}

/// Callback receiving the full document after every edit
pub type ChangeHandler = Rc<dyn Fn(String)>;

pub struct SqlEditor {
    view: EditorView,
    options: EditorOptions,
    _listener: Closure<dyn FnMut(ViewUpdate)>,
}

impl SqlEditor {
    pub fn new(parent: &Element, options: EditorOptions, on_change: ChangeHandler) -> Result<Self, JsValue> {
        let listener = Closure::<dyn FnMut(ViewUpdate)>::new(move |update: ViewUpdate| {
            if update.doc_changed() {
                on_change(update.state().doc().text());
            }
        });

        let extensions = Array::new();
        for extension in extensions_for(&options) {
            let value = match extension {
                Extension::Vim => vim(),
                Extension::BasicSetup => BASIC_SETUP.with(JsValue::clone),
                Extension::Sql => sql_language(),
                Extension::LineWrapping => EditorView::line_wrapping(),
                Extension::ChangeListener => EditorView::update_listener().of(listener.as_ref()),
            };
            extensions.push(&value);
        }

        let state_config = Object::new();
        Reflect::set(&state_config, &"doc".into(), &options.document.as_str().into())?;
        Reflect::set(&state_config, &"extensions".into(), &extensions)?;
        let state = EditorState::create(&state_config);

        let view_config = Object::new();
        Reflect::set(&view_config, &"state".into(), &state)?;
        Reflect::set(&view_config, &"parent".into(), parent)?;
        let view = EditorView::new(&view_config);

        Ok(Self {
            view,
            options,
            _listener: listener,
        })
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }
}

impl Drop for SqlEditor {
    fn drop(&mut self) {
        self.view.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vim_goes_first() {
        let options = EditorOptions::default();
        assert_eq!(
            extensions_for(&options),
            vec![
                Extension::Vim,
                Extension::BasicSetup,
                Extension::Sql,
                Extension::LineWrapping,
                Extension::ChangeListener,
            ]
        );
    }

    #[test]
    fn normal_mode_without_wrapping() {
        let options = EditorOptions {
            document: "SELECT 1;".into(),
            key_binding: KeyBindingMode::Normal,
            line_wrapping: false,
        };
        assert_eq!(
            extensions_for(&options),
            vec![Extension::BasicSetup, Extension::Sql, Extension::ChangeListener]
        );
    }
}
