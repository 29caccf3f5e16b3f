//! Authentication/session provider boundary.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One live session as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: String,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: impl Into<String>) -> Session {
        Session {
            token: token.into(),
            user: user.into(),
            user_agent: None,
            created_at: Utc::now(),
        }
    }
}

/// Result of a revocation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeOutcome {
    pub revoked: bool,
}

/// Session store boundary.
///
/// Implementations are constructed at startup and injected; procedures and
/// handlers never build their own. Calls may suspend the current request
/// while the provider answers.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Sessions visible to the caller identified by `headers`.
    async fn list_sessions(
        &self,
        headers: &HashMap<String, String>,
    ) -> anyhow::Result<Vec<Session>>;

    /// Revoke the session carrying `token`. Revoking an unknown token is not
    /// an error; the outcome reports whether anything was removed.
    async fn revoke_session(
        &self,
        headers: &HashMap<String, String>,
        token: &str,
    ) -> anyhow::Result<RevokeOutcome>;
}

/// In-memory session store for local development and tests.
#[derive(Debug, Default)]
pub struct InMemoryAuthProvider {
    sessions: Mutex<Vec<Session>>,
    revocations: Mutex<Vec<String>>,
}

impl InMemoryAuthProvider {
    pub fn new() -> InMemoryAuthProvider {
        InMemoryAuthProvider::default()
    }

    /// Seed a session (e.g. the development token at startup).
    pub fn insert_session(&self, session: Session) {
        self.sessions.lock().unwrap().push(session);
    }

    /// Tokens passed to `revoke_session`, in call order. Test introspection.
    pub fn revocations(&self) -> Vec<String> {
        self.revocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn list_sessions(
        &self,
        _headers: &HashMap<String, String>,
    ) -> anyhow::Result<Vec<Session>> {
        Ok(self.sessions.lock().unwrap().clone())
    }

    async fn revoke_session(
        &self,
        _headers: &HashMap<String, String>,
        token: &str,
    ) -> anyhow::Result<RevokeOutcome> {
        self.revocations.lock().unwrap().push(token.to_string());

        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| s.token != token);
        let revoked = sessions.len() < before;

        tracing::debug!(revoked, "session revocation");
        Ok(RevokeOutcome { revoked })
    }
}
