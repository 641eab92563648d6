//! Input catalog: display name <-> two-character input code.
//!
//! Built from one `INST ?` reply (the list of codes) plus one `INNM ?`
//! query per code (the display name). Lookups are needed in both
//! directions: the poll engine maps the active input code to its name,
//! the control dispatcher maps a requested name back to its code. The
//! catalog preserves INST order for dropdown rendering.
//!
//! A refresh always builds a complete new catalog before the old one is
//! replaced, so observers never see a partially populated map.

use std::collections::HashMap;

/// Insertion-ordered bidirectional input map.
#[derive(Debug, Clone, Default)]
pub struct InputCatalog {
    /// Display names in INST order.
    names: Vec<String>,
    code_by_name: HashMap<String, String>,
    name_by_code: HashMap<String, String>,
}

impl InputCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        InputCatalog::default()
    }

    /// Add one (name, code) pair, keeping both directions in sync.
    pub fn insert(&mut self, name: &str, code: &str) {
        if !self.code_by_name.contains_key(name) {
            self.names.push(name.to_string());
        }
        self.code_by_name.insert(name.to_string(), code.to_string());
        self.name_by_code.insert(code.to_string(), name.to_string());
    }

    /// The input code for a display name.
    pub fn code_for(&self, name: &str) -> Option<&str> {
        self.code_by_name.get(name).map(String::as_str)
    }

    /// The display name for an input code.
    pub fn name_for(&self, code: &str) -> Option<&str> {
        self.name_by_code.get(code).map(String::as_str)
    }

    /// Display names in insertion order, for dropdown options.
    pub fn names(&self) -> Vec<String> {
        self.names.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}
