//! Plugin resolution procedure.

use std::sync::Arc;

use async_trait::async_trait;

use tillwerk_core::{Envelope, ErrorCode};
use tillwerk_pipeline::{Context, Contribution, Procedure, ProcedureOutcome, Request};

use crate::manifest::{PluginManifest, PluginRegistry};

/// Capability key under which the resolved manifest is contributed.
pub const PLUGIN_KEY: &str = "plugin";

/// Resolves the `:name` path parameter against the registry, contributing the
/// manifest or short-circuiting with `not_found`.
pub struct LoadPlugin {
    registry: Arc<PluginRegistry>,
}

impl LoadPlugin {
    pub fn new(registry: Arc<PluginRegistry>) -> LoadPlugin {
        LoadPlugin { registry }
    }
}

#[async_trait]
impl Procedure for LoadPlugin {
    fn name(&self) -> &str {
        "load_plugin"
    }

    async fn run(&self, request: &Request, _context: &Context) -> anyhow::Result<ProcedureOutcome> {
        let Some(name) = request.param("name") else {
            anyhow::bail!("load_plugin used on a route without a ':name' segment");
        };

        match self.registry.get(name) {
            Some(manifest) => Ok(ProcedureOutcome::Contribute(
                Contribution::new().with(PLUGIN_KEY, manifest.clone()),
            )),
            None => Ok(ProcedureOutcome::ShortCircuit(Envelope::failure(
                format!("unknown plugin '{name}'"),
                ErrorCode::NotFound,
                None,
            ))),
        }
    }
}

/// Typed read of the contributed manifest.
pub fn current_plugin(context: &Context) -> Option<&PluginManifest> {
    context.get::<PluginManifest>(PLUGIN_KEY)
}
