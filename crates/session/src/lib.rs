//! Session feature: list and revoke login sessions through the auth provider.

pub mod procedures;

pub use procedures::{RequireSession, SESSION_HEADER, SESSION_KEY, current_session};

use std::sync::Arc;

use serde_json::json;

use tillwerk_core::Envelope;
use tillwerk_pipeline::{Action, ConfigError, Controller, handler_fn};
use tillwerk_providers::AuthProvider;
use tillwerk_schema::{ObjectSchema, Schema};

/// Build the `/sessions` controller.
pub fn controller(auth: Arc<dyn AuthProvider>) -> Result<Controller, ConfigError> {
    let list_auth = auth.clone();
    let revoke_auth = auth.clone();

    Controller::new("sessions", "/sessions")
        .action(
            "list",
            Action::query("")
                .procedure(RequireSession::new(auth.clone()))
                .handler(handler_fn(move |input| {
                    let auth = list_auth.clone();
                    async move {
                        let sessions = auth.list_sessions(input.request.headers()).await?;
                        Ok(Envelope::success(json!({ "sessions": sessions })))
                    }
                })),
        )
        .action(
            "revoke",
            Action::mutation("/revoke")
                .input(
                    ObjectSchema::new()
                        .field("token", Schema::string().placeholder("session token")),
                )
                .procedure(RequireSession::new(auth.clone()))
                .handler(handler_fn(move |input| {
                    let auth = revoke_auth.clone();
                    async move {
                        let Some(token) = input.input.get("token").and_then(|v| v.as_str()) else {
                            anyhow::bail!("validated input is missing 'token'");
                        };
                        let outcome = auth
                            .revoke_session(input.request.headers(), token)
                            .await?;
                        Ok(Envelope::success(outcome))
                    }
                })),
        )
        .build()
}
