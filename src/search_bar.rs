use serde::{Deserialize, Serialize};

/// Text of the search line and whether it currently has focus.
///
/// Submitting or clearing yields the term the controller should search for;
/// deciding between search and list mode is left to the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBar {
    text: String,
    editing: bool,
}

impl SearchBar {
    /// Trimmed input text.
    pub fn value(&self) -> &str {
        self.text.trim()
    }

    /// Raw text as typed, including surrounding whitespace.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_value(&mut self, value: &str) {
        self.text = value.to_string();
    }

    pub fn has_text(&self) -> bool {
        !self.value().is_empty()
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn start_editing(&mut self) -> bool {
        let changed = !self.editing;
        self.editing = true;
        changed
    }

    pub fn insert(&mut self, ch: char) {
        self.text.push(ch);
    }

    pub fn backspace(&mut self) -> bool {
        self.text.pop().is_some()
    }

    pub fn submit(&mut self) -> String {
        self.editing = false;
        self.value().to_string()
    }

    pub fn clear(&mut self) -> String {
        self.editing = false;
        self.text.clear();
        String::new()
    }
}
