//! Uniform success/failure response envelope.
//!
//! Every response leaving the pipeline, success or failure, is exactly one of
//! these two variants, so callers never have to distinguish transport-level
//! from domain-level failure by payload shape.

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::ErrorCode;

/// Tagged success-or-failure result of one dispatched request.
///
/// Built through [`Envelope::success`] / [`Envelope::failure`] and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Envelope {
    Success {
        data: JsonValue,
    },
    Failure {
        code: ErrorCode,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<JsonValue>,
    },
}

impl Envelope {
    /// Wrap `data` in a success envelope.
    ///
    /// Serialization of handler output is not expected to fail; if it does,
    /// the result is an internal failure rather than a mid-request panic.
    pub fn success(data: impl Serialize) -> Envelope {
        match serde_json::to_value(data) {
            Ok(data) => Envelope::Success { data },
            Err(e) => Envelope::failure(
                format!("response serialization failed: {e}"),
                ErrorCode::InternalError,
                None,
            ),
        }
    }

    /// Build a failure envelope.
    ///
    /// An empty message falls back to the code's canonical message, so a
    /// failure is never silent.
    pub fn failure(
        message: impl Into<String>,
        code: ErrorCode,
        details: Option<JsonValue>,
    ) -> Envelope {
        let message = message.into();
        let message = if message.is_empty() {
            code.default_message().to_string()
        } else {
            message
        };
        Envelope::Failure {
            code,
            message,
            details,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success { .. })
    }

    /// Failure code, if this is a failure.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Envelope::Success { .. } => None,
            Envelope::Failure { code, .. } => Some(*code),
        }
    }

    /// HTTP status the transport layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Envelope::Success { .. } => 200,
            Envelope::Failure { code, .. } => code.http_status(),
        }
    }
}
