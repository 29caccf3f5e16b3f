//! Controllers group actions under a path prefix.

use thiserror::Error;

use crate::action::Action;
use crate::request::Method;

/// Startup configuration error. Route-table problems are raised when the
/// controller or dispatcher is built, never deferred to request time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("controller '{controller}' declares action '{action}' twice")]
    DuplicateAction { controller: String, action: String },

    #[error("route collision on {method} {path}")]
    DuplicateRoute { method: Method, path: String },

    #[error("invalid path template '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

/// Named group of actions sharing a path prefix. Constructed once at process
/// start, immutable thereafter, read by the dispatcher on every request.
pub struct Controller {
    name: String,
    prefix: String,
    actions: Vec<(String, Action)>,
}

impl Controller {
    /// Start building a controller. `prefix` is prepended to every action
    /// path (e.g. `/sessions`).
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> ControllerBuilder {
        ControllerBuilder {
            name: name.into(),
            prefix: prefix.into(),
            actions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub(crate) fn into_parts(self) -> (String, String, Vec<(String, Action)>) {
        (self.name, self.prefix, self.actions)
    }
}

impl core::fmt::Debug for Controller {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let actions: Vec<&str> = self.actions.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("Controller")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("actions", &actions)
            .finish()
    }
}

pub struct ControllerBuilder {
    name: String,
    prefix: String,
    actions: Vec<(String, Action)>,
}

impl ControllerBuilder {
    /// Register a named action.
    pub fn action(mut self, name: impl Into<String>, action: Action) -> ControllerBuilder {
        self.actions.push((name.into(), action));
        self
    }

    /// Validate and freeze the controller. Duplicate action names or
    /// duplicate `(method, path)` pairs within the controller are fatal.
    pub fn build(self) -> Result<Controller, ConfigError> {
        for (i, (name, action)) in self.actions.iter().enumerate() {
            for (other_name, other) in &self.actions[..i] {
                if name == other_name {
                    return Err(ConfigError::DuplicateAction {
                        controller: self.name.clone(),
                        action: name.clone(),
                    });
                }
                if action.method() == other.method() && action.path() == other.path() {
                    return Err(ConfigError::DuplicateRoute {
                        method: action.method(),
                        path: join_path(&self.prefix, action.path()),
                    });
                }
            }
        }

        Ok(Controller {
            name: self.name,
            prefix: self.prefix,
            actions: self.actions,
        })
    }
}

/// Join a controller prefix and an action path into one template.
pub(crate) fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        if prefix.is_empty() {
            "/".to_string()
        } else {
            prefix.to_string()
        }
    } else {
        format!("{prefix}/{path}")
    }
}
