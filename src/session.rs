use serde_json::Value;
use std::collections::HashMap;

/// Per-visitor key-value persistence supplied by the host environment.
///
/// The cart reads its structure once per request, writes it back on every
/// mutation, and flags the session dirty so surrounding middleware persists
/// it. Locking across concurrent requests is the host's concern.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<Value>;

    fn insert(&mut self, key: &str, value: Value);

    fn remove(&mut self, key: &str);

    /// Signal that the session must be persisted at the end of the request.
    fn mark_modified(&mut self);
}

/// In-process session backed by a plain map, with a dirty flag hosts (and
/// tests) can inspect.
#[derive(Debug, Default, Clone)]
pub struct MemorySession {
    values: HashMap<String, Value>,
    modified: bool,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Reset the dirty flag, as persistence middleware would after a save.
    pub fn reset_modified(&mut self) {
        self.modified = false;
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn insert(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }

    fn mark_modified(&mut self) {
        self.modified = true;
    }
}
