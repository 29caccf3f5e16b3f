//! Field descriptors: normalized metadata derived from a schema for UI and
//! plugin-configuration surfaces.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::schema::{Schema, SchemaNode, StringFormat};

/// Closed field-kind enumeration. The serialized names are a wire contract
/// consumed downstream and must not drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Email,
    Url,
    Number,
    Boolean,
    Array,
    Object,
    Enum,
    Date,
    Unknown,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Email => "email",
            FieldKind::Url => "url",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Array => "array",
            FieldKind::Object => "object",
            FieldKind::Enum => "enum",
            FieldKind::Date => "date",
            FieldKind::Unknown => "unknown",
        }
    }
}

/// Metadata record describing one schema field, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<JsonValue>>,
}

/// Programmer error in schema introspection input. Surfaced at startup (e.g.
/// when a plugin registry is built), never as a per-request failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("expected an object schema with named fields")]
    InvalidSchema,
}

/// Derive the ordered descriptor list from an object schema.
///
/// Guarantees:
/// - descriptors appear in field declaration order, for any composition;
/// - a field whose node is extension-supplied classifies as `unknown` instead
///   of failing the batch;
/// - literal defaults are reported verbatim; computed defaults are reported
///   only through `required: false` and their thunk is never invoked, so
///   extraction is deterministic and side-effect free.
///
/// A schema that is not an object of fields is a programmer error.
pub fn extract_fields(schema: &Schema) -> Result<Vec<FieldDescriptor>, SchemaError> {
    let SchemaNode::Object(object) = schema.node() else {
        return Err(SchemaError::InvalidSchema);
    };

    Ok(object
        .fields()
        .iter()
        .map(|(name, field)| describe_field(name, field))
        .collect())
}

fn describe_field(name: &str, schema: &Schema) -> FieldDescriptor {
    let (kind, options) = classify(schema.node());
    FieldDescriptor {
        name: name.to_string(),
        kind,
        placeholder: schema.placeholder_text().map(str::to_string),
        required: schema.is_required(),
        default: schema.literal_default().cloned(),
        options,
    }
}

/// Classification precedence for string nodes is email > url > plain string;
/// every other node maps one-to-one.
fn classify(node: &SchemaNode) -> (FieldKind, Option<Vec<JsonValue>>) {
    match node {
        SchemaNode::String {
            format: Some(StringFormat::Email),
        } => (FieldKind::Email, None),
        SchemaNode::String {
            format: Some(StringFormat::Url),
        } => (FieldKind::Url, None),
        SchemaNode::String { format: None } => (FieldKind::String, None),
        SchemaNode::Number => (FieldKind::Number, None),
        SchemaNode::Boolean => (FieldKind::Boolean, None),
        SchemaNode::Array(_) => (FieldKind::Array, None),
        SchemaNode::Object(_) => (FieldKind::Object, None),
        SchemaNode::Enum(options) => (FieldKind::Enum, Some(options.clone())),
        SchemaNode::Date => (FieldKind::Date, None),
        SchemaNode::Custom { .. } => (FieldKind::Unknown, None),
    }
}
