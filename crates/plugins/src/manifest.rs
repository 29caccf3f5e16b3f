//! Plugin manifests and the startup registry.

use tillwerk_schema::{Schema, SchemaError, extract_fields};

/// Immutable description of an installable plugin.
#[derive(Debug, Clone)]
pub struct PluginManifest {
    pub name: String,
    pub version: String,
    pub description: String,
    /// Object schema of the plugin's configuration. Drives both payload
    /// validation and the generated configuration form.
    pub config_schema: Schema,
    pub default_enabled: bool,
}

/// Plugin catalog built once at process start, immutable afterwards.
#[derive(Debug)]
pub struct PluginRegistry {
    plugins: Vec<PluginManifest>,
}

impl PluginRegistry {
    /// Validate every manifest's config schema up front. A manifest whose
    /// schema is not an object of fields is a development-time fault and
    /// fails startup here, never a request.
    pub fn new(plugins: Vec<PluginManifest>) -> Result<PluginRegistry, SchemaError> {
        for plugin in &plugins {
            extract_fields(&plugin.config_schema)?;
        }
        Ok(PluginRegistry { plugins })
    }

    pub fn get(&self, name: &str) -> Option<&PluginManifest> {
        self.plugins.iter().find(|p| p.name == name)
    }

    pub fn all(&self) -> &[PluginManifest] {
        &self.plugins
    }
}
