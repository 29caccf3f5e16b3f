//! Declarative validation schemas and runtime field introspection.
//!
//! A [`Schema`] is a tagged tree of validation nodes with a closed kind set,
//! so introspection is a plain `match` instead of structural probing of some
//! validator library's internals. [`extract_fields`] derives the ordered
//! [`FieldDescriptor`] list that UI/config surfaces consume.

pub mod fields;
pub mod schema;

pub use fields::{FieldDescriptor, FieldKind, SchemaError, extract_fields};
pub use schema::{DefaultValue, FieldError, ObjectSchema, Schema, SchemaNode, StringFormat};
