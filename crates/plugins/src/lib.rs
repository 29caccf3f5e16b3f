//! Plugin manager feature: catalog, configuration forms, and plugin state.
//!
//! The `fields` action is the consumer of the schema introspection contract:
//! its response carries the ordered field-descriptor list that configuration
//! UIs render verbatim.

pub mod manifest;
pub mod procedures;
pub mod store;

pub use manifest::{PluginManifest, PluginRegistry};
pub use procedures::{LoadPlugin, PLUGIN_KEY, current_plugin};
pub use store::{InMemoryPluginState, PluginStateStore};

use std::sync::Arc;

use serde_json::json;

use tillwerk_core::{Envelope, ErrorCode};
use tillwerk_pipeline::{Action, ConfigError, Controller, handler_fn};
use tillwerk_providers::AuthProvider;
use tillwerk_schema::{ObjectSchema, Schema, extract_fields};
use tillwerk_session::RequireSession;

/// Build the `/plugins` controller.
pub fn controller(
    auth: Arc<dyn AuthProvider>,
    registry: Arc<PluginRegistry>,
    store: Arc<dyn PluginStateStore>,
) -> Result<Controller, ConfigError> {
    let list_registry = registry.clone();
    let list_store = store.clone();
    let configure_store = store.clone();

    Controller::new("plugins", "/plugins")
        .action(
            "list",
            Action::query("")
                .procedure(RequireSession::new(auth.clone()))
                .handler(handler_fn(move |_input| {
                    let registry = list_registry.clone();
                    let store = list_store.clone();
                    async move {
                        let plugins: Vec<_> = registry
                            .all()
                            .iter()
                            .map(|p| {
                                json!({
                                    "name": p.name,
                                    "version": p.version,
                                    "description": p.description,
                                    "enabled": store.enabled(&p.name).unwrap_or(p.default_enabled),
                                })
                            })
                            .collect();
                        Ok(Envelope::success(json!({ "plugins": plugins })))
                    }
                })),
        )
        .action(
            "fields",
            Action::query("/:name/fields")
                .procedure(RequireSession::new(auth.clone()))
                .procedure(LoadPlugin::new(registry.clone()))
                .handler(handler_fn(|input| async move {
                    let Some(plugin) = current_plugin(&input.context) else {
                        anyhow::bail!("plugin capability missing from context");
                    };
                    let fields = extract_fields(&plugin.config_schema)?;
                    Ok(Envelope::success(json!({
                        "plugin": plugin.name,
                        "fields": fields,
                    })))
                })),
        )
        .action(
            "configure",
            Action::mutation("/:name/config")
                .procedure(RequireSession::new(auth.clone()))
                .procedure(LoadPlugin::new(registry.clone()))
                .handler(handler_fn(move |input| {
                    let store = configure_store.clone();
                    async move {
                        let Some(plugin) = current_plugin(&input.context) else {
                            anyhow::bail!("plugin capability missing from context");
                        };
                        let Some(schema) = plugin.config_schema.as_object() else {
                            anyhow::bail!("plugin '{}' has a non-object config schema", plugin.name);
                        };

                        // The schema depends on the ':name' parameter, so this
                        // validation cannot be expressed as the action's
                        // static input schema.
                        match schema.validate(&input.input) {
                            Ok(config) => {
                                store.put_config(&plugin.name, config.clone());
                                Ok(Envelope::success(json!({
                                    "plugin": plugin.name,
                                    "config": config,
                                })))
                            }
                            Err(errors) => Ok(Envelope::failure(
                                "invalid plugin configuration",
                                ErrorCode::ValidationError,
                                serde_json::to_value(&errors).ok(),
                            )),
                        }
                    }
                })),
        )
        .action(
            "toggle",
            Action::mutation("/:name/enabled")
                .input(ObjectSchema::new().field("enabled", Schema::boolean()))
                .procedure(RequireSession::new(auth))
                .procedure(LoadPlugin::new(registry))
                .handler(handler_fn(move |input| {
                    let store = store.clone();
                    async move {
                        let Some(plugin) = current_plugin(&input.context) else {
                            anyhow::bail!("plugin capability missing from context");
                        };
                        let Some(enabled) = input.input.get("enabled").and_then(|v| v.as_bool())
                        else {
                            anyhow::bail!("validated input is missing 'enabled'");
                        };
                        store.set_enabled(&plugin.name, enabled);
                        Ok(Envelope::success(json!({
                            "plugin": plugin.name,
                            "enabled": enabled,
                        })))
                    }
                })),
        )
        .build()
}
