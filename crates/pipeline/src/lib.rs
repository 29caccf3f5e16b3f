//! Request-handling pipeline: procedure composition, actions, controllers,
//! and the dispatch state machine.
//!
//! Feature crates declare *what* runs (procedure lists and handler bodies);
//! routing, input validation, and envelope production live here once and are
//! never duplicated per feature.

pub mod action;
pub mod context;
pub mod controller;
pub mod dispatcher;
pub mod procedure;
pub mod request;

pub use action::{Action, ActionBuilder, ActionKind, FnHandler, Handler, HandlerInput, handler_fn};
pub use context::{Context, Contribution};
pub use controller::{ConfigError, Controller, ControllerBuilder};
pub use dispatcher::Dispatcher;
pub use procedure::{Procedure, ProcedureOutcome};
pub use request::{Method, Request};
