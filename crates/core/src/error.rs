//! Failure-code taxonomy for the request pipeline.

use serde::{Deserialize, Serialize};

/// Code carried by a failure envelope.
///
/// This is a closed taxonomy: every failure a caller can observe maps to
/// exactly one code, and each code has a fixed HTTP status. Programmer errors
/// (e.g. handing the field extractor a non-object schema) are typed errors
/// surfaced at startup, never codes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// No action matched the request's method + path.
    NotFound,
    /// The action's input schema rejected the payload.
    ValidationError,
    /// Missing or invalid credentials.
    Unauthorized,
    /// Authenticated but not allowed to perform the operation.
    Forbidden,
    /// Unexpected fault in a procedure or handler (message sanitized).
    InternalError,
}

impl ErrorCode {
    /// Wire representation (identical to the serde form).
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "not_found",
            ErrorCode::ValidationError => "validation_error",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::InternalError => "internal_error",
        }
    }

    /// HTTP status the transport layer derives for this code.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::ValidationError => 400,
            ErrorCode::Unauthorized => 401,
            ErrorCode::Forbidden => 403,
            ErrorCode::InternalError => 500,
        }
    }

    /// Canonical message used when a failure is built with an empty one.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "not found",
            ErrorCode::ValidationError => "validation failed",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::InternalError => "internal error",
        }
    }
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
