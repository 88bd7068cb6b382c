//! Memoized parsing
//!
//! Optional convenience for hosts that re-request views against
//! unchanged text: resolved models are cached keyed by a blake3 hash of
//! the source, so editing the text naturally invalidates the entry.
//! Correctness never depends on this cache; every miss is a full
//! parse-resolve pass.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{FileId, Model};

type Key = (FileId, [u8; 32]);

#[derive(Default)]
pub struct ModelCache {
    entries: HashMap<Key, Arc<Model>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `text`, reusing a cached model when the same text (for the
    /// same file) was parsed before.
    pub fn parse(&mut self, text: &str, file: FileId) -> Arc<Model> {
        let key = (file, *blake3::hash(text.as_bytes()).as_bytes());
        if let Some(model) = self.entries.get(&key) {
            return Arc::clone(model);
        }
        let model = Arc::new(super::parse(text, file));
        self.entries.insert(key, Arc::clone(&model));
        model
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
