//! Response snapshot model.
//!
//! The gateway stores and serves responses as plain snapshots: status,
//! headers, body bytes, and a kind that records where the response came
//! from relative to the site origin. Only `200 Basic` responses are
//! eligible for the cache store.

use std::str::FromStr;

use bytes::Bytes;

/// Where a response came from relative to the site origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Same-origin, fully visible response.
    Basic,
    /// Cross-origin response obtained with CORS.
    Cors,
    /// Cross-origin response with no visibility into status or body.
    Opaque,
}

impl ResponseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKind::Basic => "basic",
            ResponseKind::Cors => "cors",
            ResponseKind::Opaque => "opaque",
        }
    }
}

impl FromStr for ResponseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(ResponseKind::Basic),
            "cors" => Ok(ResponseKind::Cors),
            "opaque" => Ok(ResponseKind::Opaque),
            other => Err(format!("unknown response kind: {other}")),
        }
    }
}

/// A response snapshot, either freshly fetched or restored from the store.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    pub kind: ResponseKind,
    /// Header name/value pairs in arrival order.
    pub headers: Vec<(String, String)>,
    /// Body bytes; cloning is cheap (`Bytes` is reference-counted).
    pub body: Bytes,
}

impl Response {
    /// Build a same-origin 200 response, mostly useful in tests and stubs.
    pub fn basic(body: impl Into<Bytes>) -> Self {
        Self { status: 200, kind: ResponseKind::Basic, headers: Vec::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether this response may be persisted: HTTP 200 with basic kind.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.kind == ResponseKind::Basic
    }

    /// First `Content-Type` header value, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_is_cacheable() {
        assert!(Response::basic("hello").is_cacheable());
    }

    #[test]
    fn test_non_200_not_cacheable() {
        let resp = Response { status: 204, ..Response::basic("") };
        assert!(resp.is_ok());
        assert!(!resp.is_cacheable());
    }

    #[test]
    fn test_cors_not_cacheable() {
        let resp = Response { kind: ResponseKind::Cors, ..Response::basic("x") };
        assert!(!resp.is_cacheable());
    }

    #[test]
    fn test_opaque_not_cacheable() {
        let resp = Response { status: 0, kind: ResponseKind::Opaque, headers: Vec::new(), body: Bytes::new() };
        assert!(!resp.is_cacheable());
    }

    #[test]
    fn test_content_type_case_insensitive() {
        let resp = Response::basic("{}").with_header("Content-Type", "application/json");
        assert_eq!(resp.content_type(), Some("application/json"));
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in ["basic", "cors", "opaque"] {
            assert_eq!(kind.parse::<ResponseKind>().unwrap().as_str(), kind);
        }
        assert!("error".parse::<ResponseKind>().is_err());
    }
}
