//! Transport-agnostic request model.

use std::collections::HashMap;

use serde_json::Value as JsonValue;

/// HTTP-style method of an inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Read methods carry their input in params, not the body.
    pub fn is_read(&self) -> bool {
        matches!(self, Method::Get)
    }
}

impl core::fmt::Display for Method {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inbound request as the pipeline sees it. Transport specifics (TLS,
/// streaming bodies, raw header values) stay in the adapter that builds this.
///
/// Header names are stored lowercased; lookups are case-insensitive. `params`
/// starts as the query parameters and is extended with path parameters by the
/// dispatcher during routing.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: HashMap<String, String>,
    params: HashMap<String, String>,
    body: Option<JsonValue>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Request {
        Request {
            method,
            path: path.into(),
            headers: HashMap::new(),
            params: HashMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Request {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Request {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: JsonValue) -> Request {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Query or path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn body(&self) -> Option<&JsonValue> {
        self.body.as_ref()
    }

    pub(crate) fn set_param(&mut self, name: String, value: String) {
        self.params.insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = Request::new(Method::Get, "/sessions").with_header("X-Session-Token", "abc");
        assert_eq!(req.header("x-session-token"), Some("abc"));
        assert_eq!(req.header("X-SESSION-TOKEN"), Some("abc"));
        assert_eq!(req.header("authorization"), None);
    }

    #[test]
    fn body_and_params_round_trip() {
        let req = Request::new(Method::Post, "/billing/receipts")
            .with_param("dry_run", "1")
            .with_body(json!({"to": "a@b.io"}));
        assert_eq!(req.param("dry_run"), Some("1"));
        assert_eq!(req.body().unwrap()["to"], "a@b.io");
    }
}
