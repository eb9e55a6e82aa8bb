//! SQL editor options

use serde::{Deserialize, Serialize};
use tsify::Tsify;

/// Key binding scheme of the editor
#[derive(Tsify, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum KeyBindingMode {
    /// Default CodeMirror bindings
    Normal,
    /// Modal vim bindings with a status line
    Vim,
}

impl KeyBindingMode {
    pub fn toggled(self) -> Self {
        match self {
            KeyBindingMode::Normal => KeyBindingMode::Vim,
            KeyBindingMode::Vim => KeyBindingMode::Normal,
        }
    }

    /// Label of the button that switches away from this mode
    pub fn toggle_label(&self) -> &'static str {
        match self {
            KeyBindingMode::Vim => "Normal Mode",
            KeyBindingMode::Normal => "Vim Mode",
        }
    }
}

impl Default for KeyBindingMode {
    fn default() -> Self {
        Self::Vim
    }
}

/// Everything that decides how an editor instance is built
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct EditorOptions {
    /// Initial document text
    #[serde(default)]
    pub document: String,
    /// Key binding scheme
    #[serde(default)]
    pub key_binding: KeyBindingMode,
    /// Wrap long lines
    #[serde(default = "default_true")]
    pub line_wrapping: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            document: String::new(),
            key_binding: KeyBindingMode::default(),
            line_wrapping: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_alternates_between_two_modes() {
        let mode = KeyBindingMode::default();
        assert_eq!(mode, KeyBindingMode::Vim);
        assert_eq!(mode.toggle_label(), "Normal Mode");
        assert_eq!(mode.toggled(), KeyBindingMode::Normal);
        assert_eq!(mode.toggled().toggled(), KeyBindingMode::Vim);
        assert_eq!(KeyBindingMode::Normal.toggle_label(), "Vim Mode");
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: EditorOptions = serde_json::from_str(r#"{"document":"SELECT 1"}"#).unwrap();
        assert_eq!(options.document, "SELECT 1");
        assert_eq!(options.key_binding, KeyBindingMode::Vim);
        assert!(options.line_wrapping);
    }
}
