//! axum ⇄ pipeline conversion.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value as JsonValue;

use tillwerk_core::{Envelope, ErrorCode};
use tillwerk_pipeline::{Dispatcher, Method, Request};

/// Upper bound on accepted JSON bodies.
const BODY_LIMIT: usize = 1 << 20;

/// Fallback handler: adapts any inbound request into the pipeline and the
/// resulting envelope back into HTTP. axum holds no route table of its own;
/// routing is the dispatcher's job, so features never register axum routes.
pub async fn dispatch(
    State(dispatcher): State<Arc<Dispatcher>>,
    Query(params): Query<HashMap<String, String>>,
    req: axum::extract::Request,
) -> Response {
    let Some(method) = convert_method(req.method()) else {
        return envelope_response(Envelope::failure(
            format!("unsupported method {}", req.method()),
            ErrorCode::NotFound,
            None,
        ));
    };
    let path = req.uri().path().to_string();

    let mut request = Request::new(method, path);
    for (name, value) in req.headers() {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }
    for (name, value) in params {
        request = request.with_param(name, value);
    }

    let body = match axum::body::to_bytes(req.into_body(), BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return envelope_response(Envelope::failure(
                "request body too large",
                ErrorCode::ValidationError,
                None,
            ));
        }
    };
    if !body.is_empty() {
        match serde_json::from_slice::<JsonValue>(&body) {
            Ok(value) => request = request.with_body(value),
            Err(_) => {
                return envelope_response(Envelope::failure(
                    "request body is not valid json",
                    ErrorCode::ValidationError,
                    None,
                ));
            }
        }
    }

    envelope_response(dispatcher.dispatch(request).await)
}

/// Serialize an envelope with the HTTP status derived from its code.
pub fn envelope_response(envelope: Envelope) -> Response {
    let status =
        StatusCode::from_u16(envelope.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(envelope)).into_response()
}

fn convert_method(method: &axum::http::Method) -> Option<Method> {
    match method.as_str() {
        "GET" => Some(Method::Get),
        "POST" => Some(Method::Post),
        "PUT" => Some(Method::Put),
        "PATCH" => Some(Method::Patch),
        "DELETE" => Some(Method::Delete),
        _ => None,
    }
}
