//! Persisted per-plugin state.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value as JsonValue;

/// Opaque persistence boundary for plugin state (enabled flags and stored
/// configurations). The pipeline knows nothing of its backing schema.
pub trait PluginStateStore: Send + Sync {
    /// Stored enabled flag, if one was ever written.
    fn enabled(&self, name: &str) -> Option<bool>;
    fn set_enabled(&self, name: &str, enabled: bool);

    /// Stored (already validated) configuration, if any.
    fn config(&self, name: &str) -> Option<JsonValue>;
    fn put_config(&self, name: &str, config: JsonValue);
}

#[derive(Debug, Default)]
struct PluginState {
    enabled: Option<bool>,
    config: Option<JsonValue>,
}

/// In-memory store for development and tests.
#[derive(Debug, Default)]
pub struct InMemoryPluginState {
    inner: Mutex<HashMap<String, PluginState>>,
}

impl InMemoryPluginState {
    pub fn new() -> InMemoryPluginState {
        InMemoryPluginState::default()
    }
}

impl PluginStateStore for InMemoryPluginState {
    fn enabled(&self, name: &str) -> Option<bool> {
        self.inner.lock().unwrap().get(name).and_then(|s| s.enabled)
    }

    fn set_enabled(&self, name: &str, enabled: bool) {
        self.inner
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .enabled = Some(enabled);
    }

    fn config(&self, name: &str) -> Option<JsonValue> {
        self.inner
            .lock()
            .unwrap()
            .get(name)
            .and_then(|s| s.config.clone())
    }

    fn put_config(&self, name: &str, config: JsonValue) {
        self.inner
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .config = Some(config);
    }
}
