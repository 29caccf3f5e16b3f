//! Per-request capability context.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Accumulating map of capabilities contributed by procedures during one
/// dispatch run.
///
/// The context is created by the dispatcher when a run starts and handed to
/// the terminal handler by value when it ends; nothing retains it past that.
/// Procedures see it read-only and extend it by returning a [`Contribution`].
/// Trait-object capabilities are stored as their `Arc` handle, e.g. a
/// provider goes in as `Arc<dyn AuthProvider>` and comes back out with
/// `get::<Arc<dyn AuthProvider>>(..)`.
#[derive(Default)]
pub struct Context {
    entries: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Context {
    pub fn new() -> Context {
        Context::default()
    }

    /// Typed view of a capability, if present under `name` with type `T`.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.entries.get(name).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge a contribution on top of this context, last write wins.
    ///
    /// An overwrite almost always means two procedures picked the same
    /// capability name, so each one is logged with the key and the procedure
    /// that caused it.
    pub fn merge(&mut self, contributed_by: &str, contribution: Contribution) {
        for (name, value) in contribution.entries {
            if self.entries.insert(name.clone(), value).is_some() {
                tracing::warn!(
                    key = %name,
                    procedure = %contributed_by,
                    "context capability overwritten; two procedures contribute the same key"
                );
            }
        }
    }
}

impl core::fmt::Debug for Context {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("Context").field("keys", &keys).finish()
    }
}

/// Partial context returned by a procedure: the capabilities it adds, in the
/// order it added them.
#[derive(Default)]
pub struct Contribution {
    entries: Vec<(String, Arc<dyn Any + Send + Sync>)>,
}

impl Contribution {
    pub fn new() -> Contribution {
        Contribution::default()
    }

    /// Add one capability under `name`.
    pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Contribution {
        self.entries.push((name.into(), Arc::new(value)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl core::fmt::Debug for Contribution {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let keys: Vec<&str> = self.entries.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("Contribution").field("keys", &keys).finish()
    }
}
