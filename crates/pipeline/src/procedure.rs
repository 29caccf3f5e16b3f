//! Procedure contract: reusable units that contribute request context or
//! short-circuit the pipeline.

use async_trait::async_trait;

use tillwerk_core::Envelope;

use crate::context::{Context, Contribution};
use crate::request::Request;

/// What a procedure decided for this request.
#[derive(Debug)]
pub enum ProcedureOutcome {
    /// New capabilities to merge on top of the current context.
    Contribute(Contribution),
    /// Abort the rest of the chain and answer the caller with this envelope.
    ShortCircuit(Envelope),
}

impl ProcedureOutcome {
    /// Convenience for guard procedures that add nothing on success.
    pub fn pass() -> ProcedureOutcome {
        ProcedureOutcome::Contribute(Contribution::new())
    }
}

/// A named, reusable unit of request logic.
///
/// Procedures run strictly in declaration order; the context passed to
/// procedure *i* is the merge of contributions `0..i-1`. External
/// collaborators (auth, billing, mail, storage) are injected at construction
/// and reached through `self` or the context, never built inside `run`.
/// A procedure must not retain the context or request past its own `run`.
///
/// Returning `Err` is the unexpected-fault channel: the dispatcher logs the
/// full error server-side and answers with a sanitized `internal_error`
/// failure.
#[async_trait]
pub trait Procedure: Send + Sync {
    /// Stable name used in logs and context-overwrite warnings.
    fn name(&self) -> &str;

    async fn run(&self, request: &Request, context: &Context) -> anyhow::Result<ProcedureOutcome>;
}
