//! Actions: single routable operations (query or mutation).

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use tillwerk_core::Envelope;
use tillwerk_schema::ObjectSchema;

use crate::context::Context;
use crate::procedure::Procedure;
use crate::request::{Method, Request};

/// Whether an action reads or writes. Both kinds share one dispatch path;
/// the kind only picks the default method binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Side-effect-free read, bound to GET by default.
    Query,
    /// State-changing write, bound to POST by default.
    Mutation,
}

/// Everything the terminal handler sees: the schema-validated input (defaults
/// applied; the raw body when the action declares no schema), the original
/// request, and the fully merged context. Owned, because the handler is the
/// last stop in the chain.
pub struct HandlerInput {
    pub input: JsonValue,
    pub request: Request,
    pub context: Context,
}

/// Terminal handler of an action.
///
/// The handler decides the response by building an [`Envelope`]. `Err` is the
/// uncaught-fault channel and is downgraded to a sanitized `internal_error`
/// failure at the pipeline boundary.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, input: HandlerInput) -> anyhow::Result<Envelope>;
}

/// Adapt an async closure into a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(HandlerInput) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Envelope>> + Send + 'static,
{
    FnHandler(f)
}

pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(HandlerInput) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Envelope>> + Send + 'static,
{
    async fn handle(&self, input: HandlerInput) -> anyhow::Result<Envelope> {
        (self.0)(input).await
    }
}

/// One routable operation: method + path template + optional input schema +
/// ordered procedure chain + terminal handler. Immutable once built.
pub struct Action {
    kind: ActionKind,
    method: Method,
    path: String,
    input: Option<ObjectSchema>,
    procedures: Vec<Arc<dyn Procedure>>,
    handler: Arc<dyn Handler>,
}

impl Action {
    /// Start building a query (GET unless overridden).
    pub fn query(path: impl Into<String>) -> ActionBuilder {
        ActionBuilder::new(ActionKind::Query, Method::Get, path)
    }

    /// Start building a mutation (POST unless overridden).
    pub fn mutation(path: impl Into<String>) -> ActionBuilder {
        ActionBuilder::new(ActionKind::Mutation, Method::Post, path)
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Path template relative to the owning controller's prefix. Segments of
    /// the form `:name` capture path parameters.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Declared input schema, introspectable for metadata.
    pub fn input(&self) -> Option<&ObjectSchema> {
        self.input.as_ref()
    }

    pub fn procedures(&self) -> &[Arc<dyn Procedure>] {
        &self.procedures
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }
}

impl core::fmt::Debug for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let procedures: Vec<&str> = self.procedures.iter().map(|p| p.name()).collect();
        f.debug_struct("Action")
            .field("kind", &self.kind)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("procedures", &procedures)
            .finish()
    }
}

pub struct ActionBuilder {
    kind: ActionKind,
    method: Method,
    path: String,
    input: Option<ObjectSchema>,
    procedures: Vec<Arc<dyn Procedure>>,
}

impl ActionBuilder {
    fn new(kind: ActionKind, method: Method, path: impl Into<String>) -> ActionBuilder {
        ActionBuilder {
            kind,
            method,
            path: path.into(),
            input: None,
            procedures: Vec::new(),
        }
    }

    /// Override the default method binding.
    pub fn method(mut self, method: Method) -> ActionBuilder {
        self.method = method;
        self
    }

    /// Declare the input schema. Mutations validate the request body against
    /// it; queries validate the params map.
    pub fn input(mut self, schema: ObjectSchema) -> ActionBuilder {
        self.input = Some(schema);
        self
    }

    /// Append a procedure to the chain (executed in append order).
    pub fn procedure(mut self, procedure: impl Procedure + 'static) -> ActionBuilder {
        self.procedures.push(Arc::new(procedure));
        self
    }

    /// Append an already-shared procedure instance.
    pub fn procedure_arc(mut self, procedure: Arc<dyn Procedure>) -> ActionBuilder {
        self.procedures.push(procedure);
        self
    }

    /// Attach the terminal handler and finish the action.
    pub fn handler(self, handler: impl Handler + 'static) -> Action {
        Action {
            kind: self.kind,
            method: self.method,
            path: self.path,
            input: self.input,
            procedures: self.procedures,
            handler: Arc::new(handler),
        }
    }
}
