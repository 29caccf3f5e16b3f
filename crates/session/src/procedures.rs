//! Session guard procedure.

use std::sync::Arc;

use async_trait::async_trait;

use tillwerk_core::{Envelope, ErrorCode};
use tillwerk_pipeline::{Context, Contribution, Procedure, ProcedureOutcome, Request};
use tillwerk_providers::{AuthProvider, Session};

/// Capability key under which the resolved session is contributed.
pub const SESSION_KEY: &str = "session";

/// Header carrying the caller's session token.
pub const SESSION_HEADER: &str = "x-session-token";

/// Resolves the caller's session from the request headers or short-circuits
/// with an `unauthorized` failure.
pub struct RequireSession {
    auth: Arc<dyn AuthProvider>,
}

impl RequireSession {
    pub fn new(auth: Arc<dyn AuthProvider>) -> RequireSession {
        RequireSession { auth }
    }
}

#[async_trait]
impl Procedure for RequireSession {
    fn name(&self) -> &str {
        "require_session"
    }

    async fn run(&self, request: &Request, _context: &Context) -> anyhow::Result<ProcedureOutcome> {
        let Some(token) = request.header(SESSION_HEADER) else {
            return Ok(ProcedureOutcome::ShortCircuit(Envelope::failure(
                "missing session token",
                ErrorCode::Unauthorized,
                None,
            )));
        };

        let sessions = self.auth.list_sessions(request.headers()).await?;
        match sessions.into_iter().find(|s| s.token == token) {
            Some(session) => Ok(ProcedureOutcome::Contribute(
                Contribution::new().with(SESSION_KEY, session),
            )),
            None => Ok(ProcedureOutcome::ShortCircuit(Envelope::failure(
                "invalid session token",
                ErrorCode::Unauthorized,
                None,
            ))),
        }
    }
}

/// Typed read of the contributed session capability.
pub fn current_session(context: &Context) -> Option<&Session> {
    context.get::<Session>(SESSION_KEY)
}
