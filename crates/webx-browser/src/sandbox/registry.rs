//! Script contexts of the current page, in creation order.

use std::cell::RefCell;
use std::rc::Rc;

use super::engine::ScriptEngine;
use crate::page::Dialect;

pub type SharedRegistry = Rc<RefCell<ContextRegistry>>;

/// A registered context. `version` is the tag as the page declared it.
#[derive(Clone)]
pub struct ContextEntry {
    pub engine: Rc<dyn ScriptEngine>,
    pub dialect: Dialect,
    pub version: String,
    pub source: String,
}

#[derive(Default)]
pub struct ContextRegistry {
    entries: Vec<ContextEntry>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a context; returns its index.
    pub fn register(&mut self, entry: ContextEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&ContextEntry> {
        self.entries.get(index)
    }

    pub fn engine(&self, index: usize) -> Option<Rc<dyn ScriptEngine>> {
        self.entries.get(index).map(|e| Rc::clone(&e.engine))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Console selector lines: `"{index} ({dialect})"`.
    pub fn listing(&self) -> Vec<String> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{i} ({})", e.version))
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
