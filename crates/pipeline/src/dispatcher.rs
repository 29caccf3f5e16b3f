//! The dispatch state machine.
//!
//! ```text
//! Routing → Validating → RunningProcedures → RunningHandler → Responding
//! ```
//!
//! Every state has an error transition straight to Responding carrying a
//! failure envelope. Feature code supplies only the procedure lists and
//! handler bodies; routing, validation, and envelope production happen here
//! once for every action in the registry.

use std::collections::{HashMap, HashSet};

use serde_json::Value as JsonValue;

use tillwerk_core::{Envelope, ErrorCode};

use crate::action::{Action, HandlerInput};
use crate::context::Context;
use crate::controller::{ConfigError, Controller, join_path};
use crate::procedure::ProcedureOutcome;
use crate::request::{Method, Request};

/// One compiled route: the flattened path template plus the action behind it.
struct Route {
    method: Method,
    segments: Vec<Segment>,
    controller: String,
    action_name: String,
    action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// Routes requests through validation, the procedure chain, and the terminal
/// handler, producing exactly one envelope per request.
///
/// The dispatcher holds no mutable state. The only per-request mutable value
/// is the context, which is created inside [`Dispatcher::dispatch`] and
/// consumed by the handler; concurrent runs share nothing but the immutable
/// route table and whatever collaborators the procedures were built with.
pub struct Dispatcher {
    routes: Vec<Route>,
}

impl Dispatcher {
    /// Flatten controllers into a route table.
    ///
    /// A `(method, full path)` collision anywhere in the registry is a fatal
    /// configuration error, surfaced here at startup and never at request
    /// time.
    pub fn new(controllers: Vec<Controller>) -> Result<Dispatcher, ConfigError> {
        let mut routes = Vec::new();
        let mut seen: HashSet<(Method, String)> = HashSet::new();

        for controller in controllers {
            let (controller_name, prefix, actions) = controller.into_parts();
            for (action_name, action) in actions {
                let template = join_path(&prefix, action.path());
                if !seen.insert((action.method(), template.clone())) {
                    return Err(ConfigError::DuplicateRoute {
                        method: action.method(),
                        path: template,
                    });
                }
                routes.push(Route {
                    method: action.method(),
                    segments: compile_template(&template)?,
                    controller: controller_name.clone(),
                    action_name,
                    action,
                });
            }
        }

        Ok(Dispatcher { routes })
    }

    /// Dispatch one request end-to-end and produce its envelope.
    ///
    /// Cancellation: dropping the returned future stops the run at its next
    /// await point; no further procedures or the handler execute. A procedure
    /// that already issued an external mutation owns that mutation's
    /// consistency; the pipeline holds no distributed transaction.
    pub async fn dispatch(&self, request: Request) -> Envelope {
        // Routing
        let Some((route, path_params)) = self.resolve(request.method(), request.path()) else {
            return Envelope::failure(
                format!("no route for {} {}", request.method(), request.path()),
                ErrorCode::NotFound,
                None,
            );
        };

        let mut request = request;
        for (name, value) in path_params {
            request.set_param(name, value);
        }

        tracing::debug!(
            controller = %route.controller,
            action = %route.action_name,
            method = %request.method(),
            path = %request.path(),
            "dispatching"
        );

        // Validating
        let input = match route.action.input() {
            Some(schema) => {
                let raw = if request.method().is_read() {
                    params_object(request.params())
                } else {
                    request.body().cloned().unwrap_or(JsonValue::Null)
                };
                match schema.validate(&raw) {
                    Ok(normalized) => normalized,
                    Err(errors) => {
                        return Envelope::failure(
                            "invalid input",
                            ErrorCode::ValidationError,
                            serde_json::to_value(&errors).ok(),
                        );
                    }
                }
            }
            None => request.body().cloned().unwrap_or(JsonValue::Null),
        };

        // RunningProcedures
        let mut context = Context::new();
        for procedure in route.action.procedures() {
            match procedure.run(&request, &context).await {
                Ok(ProcedureOutcome::Contribute(contribution)) => {
                    context.merge(procedure.name(), contribution);
                }
                Ok(ProcedureOutcome::ShortCircuit(envelope)) => return envelope,
                Err(e) => {
                    tracing::error!(
                        controller = %route.controller,
                        action = %route.action_name,
                        procedure = %procedure.name(),
                        error = ?e,
                        "procedure failed"
                    );
                    return Envelope::failure("", ErrorCode::InternalError, None);
                }
            }
        }

        // RunningHandler
        let handler_input = HandlerInput {
            input,
            request,
            context,
        };
        match route.action.handler().handle(handler_input).await {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(
                    controller = %route.controller,
                    action = %route.action_name,
                    error = ?e,
                    "handler failed"
                );
                Envelope::failure("", ErrorCode::InternalError, None)
            }
        }
        // Responding: serializing the envelope is the transport adapter's job.
    }

    /// Resolve method + path to exactly one route, collecting path params.
    fn resolve(&self, method: Method, path: &str) -> Option<(&Route, Vec<(String, String)>)> {
        let segments: Vec<&str> = split_path(path);

        'routes: for route in &self.routes {
            if route.method != method || route.segments.len() != segments.len() {
                continue;
            }
            let mut params = Vec::new();
            for (pattern, actual) in route.segments.iter().zip(&segments) {
                match pattern {
                    Segment::Literal(lit) if lit == actual => {}
                    Segment::Literal(_) => continue 'routes,
                    Segment::Param(name) => params.push((name.clone(), (*actual).to_string())),
                }
            }
            return Some((route, params));
        }
        None
    }
}

impl core::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let routes: Vec<String> = self
            .routes
            .iter()
            .map(|r| format!("{} {}:{}", r.method, r.controller, r.action_name))
            .collect();
        f.debug_struct("Dispatcher").field("routes", &routes).finish()
    }
}

fn compile_template(template: &str) -> Result<Vec<Segment>, ConfigError> {
    split_path(template)
        .into_iter()
        .map(|segment| match segment.strip_prefix(':') {
            Some("") => Err(ConfigError::InvalidPath {
                path: template.to_string(),
                reason: "empty parameter name".to_string(),
            }),
            Some(name) => Ok(Segment::Param(name.to_string())),
            None => Ok(Segment::Literal(segment.to_string())),
        })
        .collect()
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn params_object(params: &HashMap<String, String>) -> JsonValue {
    JsonValue::Object(
        params
            .iter()
            .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, handler_fn};
    use crate::context::Contribution;
    use crate::procedure::Procedure;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tillwerk_schema::{ObjectSchema, Schema};

    /// Test procedure that records whether it ran and either contributes one
    /// string capability or short-circuits.
    struct Probe {
        name: String,
        runs: Arc<AtomicUsize>,
        contributes: Option<(String, String)>,
        short_circuit: Option<Envelope>,
    }

    impl Probe {
        fn contributing(name: &str, key: &str, value: &str, runs: Arc<AtomicUsize>) -> Probe {
            Probe {
                name: name.to_string(),
                runs,
                contributes: Some((key.to_string(), value.to_string())),
                short_circuit: None,
            }
        }

        fn blocking(name: &str, envelope: Envelope, runs: Arc<AtomicUsize>) -> Probe {
            Probe {
                name: name.to_string(),
                runs,
                contributes: None,
                short_circuit: Some(envelope),
            }
        }
    }

    #[async_trait]
    impl Procedure for Probe {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&self, _request: &Request, _context: &Context) -> anyhow::Result<ProcedureOutcome> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if let Some(envelope) = &self.short_circuit {
                return Ok(ProcedureOutcome::ShortCircuit(envelope.clone()));
            }
            let (key, value) = self.contributes.clone().unwrap();
            Ok(ProcedureOutcome::Contribute(Contribution::new().with(key, value)))
        }
    }

    fn echo_session_controller(
        procedures: Vec<Probe>,
        handler_runs: Arc<AtomicUsize>,
    ) -> Controller {
        let mut builder = Action::query("/echo");
        for p in procedures {
            builder = builder.procedure(p);
        }
        let action = builder.handler(handler_fn(move |input: HandlerInput| {
            let handler_runs = handler_runs.clone();
            async move {
                handler_runs.fetch_add(1, Ordering::SeqCst);
                let session = input
                    .context
                    .get::<String>("session")
                    .cloned()
                    .unwrap_or_default();
                Ok(Envelope::success(json!({ "session": session })))
            }
        }));
        Controller::new("probe", "/probe")
            .action("echo", action)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn unmatched_route_is_not_found() {
        let dispatcher = Dispatcher::new(vec![]).unwrap();
        let envelope = dispatcher.dispatch(Request::new(Method::Get, "/nope")).await;
        assert_eq!(envelope.code(), Some(ErrorCode::NotFound));
    }

    #[tokio::test]
    async fn validation_failure_skips_procedures_and_handler() {
        let proc_runs = Arc::new(AtomicUsize::new(0));
        let handler_runs = Arc::new(AtomicUsize::new(0));

        let action = Action::mutation("/items")
            .input(ObjectSchema::new().field("name", Schema::string()))
            .procedure(Probe::contributing("p0", "k", "v", proc_runs.clone()))
            .handler(handler_fn({
                let handler_runs = handler_runs.clone();
                move |_input: HandlerInput| {
                    let handler_runs = handler_runs.clone();
                    async move {
                        handler_runs.fetch_add(1, Ordering::SeqCst);
                        Ok(Envelope::success(json!({})))
                    }
                }
            }));
        let controller = Controller::new("items", "/inventory")
            .action("create", action)
            .build()
            .unwrap();
        let dispatcher = Dispatcher::new(vec![controller]).unwrap();

        let envelope = dispatcher
            .dispatch(Request::new(Method::Post, "/inventory/items").with_body(json!({"name": 7})))
            .await;

        assert_eq!(envelope.code(), Some(ErrorCode::ValidationError));
        assert_eq!(proc_runs.load(Ordering::SeqCst), 0);
        assert_eq!(handler_runs.load(Ordering::SeqCst), 0);
        match envelope {
            Envelope::Failure { details, .. } => {
                let details = details.unwrap();
                assert_eq!(details[0]["field"], "name");
            }
            Envelope::Success { .. } => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn short_circuit_skips_later_procedures_and_handler() {
        let first_runs = Arc::new(AtomicUsize::new(0));
        let second_runs = Arc::new(AtomicUsize::new(0));
        let handler_runs = Arc::new(AtomicUsize::new(0));

        let blocked = Envelope::failure("missing session token", ErrorCode::Unauthorized, None);
        let controller = echo_session_controller(
            vec![
                Probe::blocking("auth_check", blocked.clone(), first_runs.clone()),
                Probe::contributing("load_plan", "plan", "starter", second_runs.clone()),
            ],
            handler_runs.clone(),
        );
        let dispatcher = Dispatcher::new(vec![controller]).unwrap();

        let envelope = dispatcher.dispatch(Request::new(Method::Get, "/probe/echo")).await;

        // the short-circuit envelope is returned exactly as produced
        assert_eq!(envelope, blocked);
        assert_eq!(first_runs.load(Ordering::SeqCst), 1);
        assert_eq!(second_runs.load(Ordering::SeqCst), 0);
        assert_eq!(handler_runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn later_contribution_wins_and_handler_observes_it() {
        let runs = Arc::new(AtomicUsize::new(0));
        let handler_runs = Arc::new(AtomicUsize::new(0));

        let controller = echo_session_controller(
            vec![
                Probe::contributing("first", "session", "alpha", runs.clone()),
                Probe::contributing("second", "session", "beta", runs.clone()),
            ],
            handler_runs.clone(),
        );
        let dispatcher = Dispatcher::new(vec![controller]).unwrap();

        let envelope = dispatcher.dispatch(Request::new(Method::Get, "/probe/echo")).await;
        match envelope {
            Envelope::Success { data } => assert_eq!(data["session"], "beta"),
            Envelope::Failure { .. } => panic!("expected success"),
        }
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(handler_runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_fault_is_downgraded_to_sanitized_internal_error() {
        let action = Action::query("/boom").handler(handler_fn(|_input: HandlerInput| async {
            Err(anyhow::anyhow!("connection refused to db.internal:5432"))
        }));
        let controller = Controller::new("ops", "")
            .action("boom", action)
            .build()
            .unwrap();
        let dispatcher = Dispatcher::new(vec![controller]).unwrap();

        let envelope = dispatcher.dispatch(Request::new(Method::Get, "/boom")).await;
        match envelope {
            Envelope::Failure { code, message, .. } => {
                assert_eq!(code, ErrorCode::InternalError);
                // internal detail is logged, not returned
                assert_eq!(message, "internal error");
            }
            Envelope::Success { .. } => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn path_params_are_captured_into_the_request() {
        let action = Action::query("/:name/fields").handler(handler_fn(
            |input: HandlerInput| async move {
                Ok(Envelope::success(json!({
                    "name": input.request.param("name"),
                })))
            },
        ));
        let controller = Controller::new("plugins", "/plugins")
            .action("fields", action)
            .build()
            .unwrap();
        let dispatcher = Dispatcher::new(vec![controller]).unwrap();

        let envelope = dispatcher
            .dispatch(Request::new(Method::Get, "/plugins/low-stock/fields"))
            .await;
        match envelope {
            Envelope::Success { data } => assert_eq!(data["name"], "low-stock"),
            Envelope::Failure { .. } => panic!("expected success"),
        }
    }

    #[tokio::test]
    async fn query_input_schema_validates_params() {
        let action = Action::query("/search")
            .input(ObjectSchema::new().field("q", Schema::string()))
            .handler(handler_fn(|input: HandlerInput| async move {
                Ok(Envelope::success(json!({ "q": input.input["q"] })))
            }));
        let controller = Controller::new("search", "")
            .action("search", action)
            .build()
            .unwrap();
        let dispatcher = Dispatcher::new(vec![controller]).unwrap();

        let missing = dispatcher.dispatch(Request::new(Method::Get, "/search")).await;
        assert_eq!(missing.code(), Some(ErrorCode::ValidationError));

        let ok = dispatcher
            .dispatch(Request::new(Method::Get, "/search").with_param("q", "gasket"))
            .await;
        assert!(ok.is_success());
    }

    #[test]
    fn cross_controller_route_collisions_are_fatal_at_startup() {
        let a = Controller::new("a", "/x")
            .action("read", Action::query("/y").handler(handler_fn(
                |_input: HandlerInput| async { Ok(Envelope::success(json!({}))) },
            )))
            .build()
            .unwrap();
        let b = Controller::new("b", "/x")
            .action("read", Action::query("/y").handler(handler_fn(
                |_input: HandlerInput| async { Ok(Envelope::success(json!({}))) },
            )))
            .build()
            .unwrap();

        let err = Dispatcher::new(vec![a, b]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateRoute { .. }));
    }
}
