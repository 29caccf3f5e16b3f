//! Schema nodes, the fluent builder, and payload validation.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;

/// Format constraint a string node may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    Email,
    Url,
}

/// Predicate supplied by an extension for values the built-in nodes cannot
/// describe. Returns a human-readable rejection message on failure.
pub type CustomCheck = Arc<dyn Fn(&JsonValue) -> Result<(), String> + Send + Sync>;

/// One validation node. The enumeration is closed: introspection matches on
/// it directly and every variant classifies into exactly one field kind.
#[derive(Clone)]
pub enum SchemaNode {
    String { format: Option<StringFormat> },
    Number,
    Boolean,
    Array(Box<Schema>),
    Object(ObjectSchema),
    /// Exhaustive ordered set of allowed literal values.
    Enum(Vec<JsonValue>),
    /// RFC 3339 date-time string.
    Date,
    /// Opaque extension-supplied validator; introspects as `unknown`.
    Custom { tag: String, check: CustomCheck },
}

impl core::fmt::Debug for SchemaNode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SchemaNode::String { format } => f.debug_struct("String").field("format", format).finish(),
            SchemaNode::Number => f.write_str("Number"),
            SchemaNode::Boolean => f.write_str("Boolean"),
            SchemaNode::Array(item) => f.debug_tuple("Array").field(item).finish(),
            SchemaNode::Object(object) => f.debug_tuple("Object").field(object).finish(),
            SchemaNode::Enum(options) => f.debug_tuple("Enum").field(options).finish(),
            SchemaNode::Date => f.write_str("Date"),
            SchemaNode::Custom { tag, .. } => f.debug_struct("Custom").field("tag", tag).finish(),
        }
    }
}

/// Default applied when a field is absent from the payload.
#[derive(Clone)]
pub enum DefaultValue {
    Literal(JsonValue),
    /// Deferred default. The thunk runs during validation only; introspection
    /// reports its existence without invoking it.
    Computed(Arc<dyn Fn() -> JsonValue + Send + Sync>),
}

impl core::fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DefaultValue::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            DefaultValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// A validation node plus its field-level modifiers.
#[derive(Debug, Clone)]
pub struct Schema {
    node: SchemaNode,
    optional: bool,
    default: Option<DefaultValue>,
    placeholder: Option<String>,
}

impl Schema {
    fn with_node(node: SchemaNode) -> Schema {
        Schema {
            node,
            optional: false,
            default: None,
            placeholder: None,
        }
    }

    pub fn string() -> Schema {
        Schema::with_node(SchemaNode::String { format: None })
    }

    /// String constrained to an email address.
    pub fn email() -> Schema {
        Schema::with_node(SchemaNode::String {
            format: Some(StringFormat::Email),
        })
    }

    /// String constrained to an http(s) URL.
    pub fn url() -> Schema {
        Schema::with_node(SchemaNode::String {
            format: Some(StringFormat::Url),
        })
    }

    pub fn number() -> Schema {
        Schema::with_node(SchemaNode::Number)
    }

    pub fn boolean() -> Schema {
        Schema::with_node(SchemaNode::Boolean)
    }

    pub fn array(item: Schema) -> Schema {
        Schema::with_node(SchemaNode::Array(Box::new(item)))
    }

    pub fn object(fields: ObjectSchema) -> Schema {
        Schema::with_node(SchemaNode::Object(fields))
    }

    /// Closed set of allowed literal values, in display order.
    pub fn enumeration(options: impl IntoIterator<Item = impl Into<JsonValue>>) -> Schema {
        Schema::with_node(SchemaNode::Enum(
            options.into_iter().map(Into::into).collect(),
        ))
    }

    /// RFC 3339 date-time string.
    pub fn date() -> Schema {
        Schema::with_node(SchemaNode::Date)
    }

    /// Extension-supplied validator. `tag` names the validator in debug
    /// output; the field introspects as `unknown`.
    pub fn custom(
        tag: impl Into<String>,
        check: impl Fn(&JsonValue) -> Result<(), String> + Send + Sync + 'static,
    ) -> Schema {
        Schema::with_node(SchemaNode::Custom {
            tag: tag.into(),
            check: Arc::new(check),
        })
    }

    /// Mark the field as not required.
    pub fn optional(mut self) -> Schema {
        self.optional = true;
        self
    }

    /// Literal default applied when the field is absent.
    pub fn default_value(mut self, value: impl Into<JsonValue>) -> Schema {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    /// Deferred default computed at validation time. Introspection never runs
    /// the thunk.
    pub fn default_with(mut self, thunk: impl Fn() -> JsonValue + Send + Sync + 'static) -> Schema {
        self.default = Some(DefaultValue::Computed(Arc::new(thunk)));
        self
    }

    /// UI placeholder hint carried into the field descriptor.
    pub fn placeholder(mut self, text: impl Into<String>) -> Schema {
        self.placeholder = Some(text.into());
        self
    }

    pub fn node(&self) -> &SchemaNode {
        &self.node
    }

    /// Required unless marked optional or carrying a default.
    pub fn is_required(&self) -> bool {
        !self.optional && self.default.is_none()
    }

    /// Literal default, if one is declared. Computed defaults stay opaque
    /// here (they are only observable through `is_required`).
    pub fn literal_default(&self) -> Option<&JsonValue> {
        match &self.default {
            Some(DefaultValue::Literal(v)) => Some(v),
            _ => None,
        }
    }

    pub fn placeholder_text(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    /// The inner object schema, if this node is an object.
    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match &self.node {
            SchemaNode::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Default to substitute for an absent field, if any. Runs computed
    /// thunks; callers on the introspection path must use `literal_default`.
    fn default_for_validation(&self) -> Option<JsonValue> {
        match &self.default {
            Some(DefaultValue::Literal(v)) => Some(v.clone()),
            Some(DefaultValue::Computed(thunk)) => Some(thunk()),
            None => None,
        }
    }

    /// Check `value` against this node, appending errors under `path` and
    /// returning the normalized value (nested defaults applied).
    fn check(&self, path: &str, value: &JsonValue, errors: &mut Vec<FieldError>) -> JsonValue {
        match &self.node {
            SchemaNode::String { format } => {
                match value.as_str() {
                    None => errors.push(FieldError::new(path, "expected a string")),
                    Some(s) => match format {
                        Some(StringFormat::Email) if !looks_like_email(s) => {
                            errors.push(FieldError::new(path, "expected a valid email address"));
                        }
                        Some(StringFormat::Url) if !looks_like_url(s) => {
                            errors.push(FieldError::new(path, "expected a valid url"));
                        }
                        _ => {}
                    },
                }
                value.clone()
            }
            SchemaNode::Number => {
                if !value.is_number() {
                    errors.push(FieldError::new(path, "expected a number"));
                }
                value.clone()
            }
            SchemaNode::Boolean => {
                if !value.is_boolean() {
                    errors.push(FieldError::new(path, "expected a boolean"));
                }
                value.clone()
            }
            SchemaNode::Array(item) => match value.as_array() {
                None => {
                    errors.push(FieldError::new(path, "expected an array"));
                    value.clone()
                }
                Some(elements) => JsonValue::Array(
                    elements
                        .iter()
                        .enumerate()
                        .map(|(i, el)| item.check(&format!("{path}[{i}]"), el, errors))
                        .collect(),
                ),
            },
            SchemaNode::Object(object) => object.check_at(path, value, errors),
            SchemaNode::Enum(options) => {
                if !options.contains(value) {
                    let allowed = options
                        .iter()
                        .map(|o| o.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    errors.push(FieldError::new(path, format!("must be one of: {allowed}")));
                }
                value.clone()
            }
            SchemaNode::Date => {
                let ok = value
                    .as_str()
                    .is_some_and(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok());
                if !ok {
                    errors.push(FieldError::new(path, "expected an RFC 3339 date-time"));
                }
                value.clone()
            }
            SchemaNode::Custom { check, .. } => {
                if let Err(message) = check(value) {
                    errors.push(FieldError::new(path, message));
                }
                value.clone()
            }
        }
    }
}

/// Ordered set of named fields. Declaration order is semantically significant:
/// it drives descriptor order and, downstream, generated form layout.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    fields: Vec<(String, Schema)>,
}

impl ObjectSchema {
    pub fn new() -> ObjectSchema {
        ObjectSchema::default()
    }

    /// Append a field. Fields validate and introspect in insertion order.
    pub fn field(mut self, name: impl Into<String>, schema: Schema) -> ObjectSchema {
        self.fields.push((name.into(), schema));
        self
    }

    pub fn fields(&self) -> &[(String, Schema)] {
        &self.fields
    }

    /// Validate `value` and return the normalized payload: declared fields
    /// only, with defaults substituted for absent ones. Computed defaults run
    /// here and nowhere else.
    pub fn validate(&self, value: &JsonValue) -> Result<JsonValue, Vec<FieldError>> {
        let mut errors = Vec::new();
        let normalized = self.check_at("", value, &mut errors);
        if errors.is_empty() {
            Ok(normalized)
        } else {
            Err(errors)
        }
    }

    fn check_at(&self, path: &str, value: &JsonValue, errors: &mut Vec<FieldError>) -> JsonValue {
        let Some(object) = value.as_object() else {
            errors.push(FieldError::new(path, "expected an object"));
            return value.clone();
        };

        let mut out = serde_json::Map::new();
        for (name, schema) in &self.fields {
            let field_path = if path.is_empty() {
                name.clone()
            } else {
                format!("{path}.{name}")
            };
            match object.get(name).filter(|v| !v.is_null()) {
                Some(v) => {
                    let normalized = schema.check(&field_path, v, errors);
                    out.insert(name.clone(), normalized);
                }
                None => {
                    if let Some(default) = schema.default_for_validation() {
                        out.insert(name.clone(), default);
                    } else if schema.is_required() {
                        errors.push(FieldError::new(&field_path, "is required"));
                    }
                }
            }
        }
        JsonValue::Object(out)
    }
}

/// One structured validation rejection, addressed by dotted field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> FieldError {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn looks_like_url(s: &str) -> bool {
    let rest = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"));
    rest.is_some_and(|r| !r.is_empty())
}
