//! Request identity for interception and cache lookup.
//!
//! A request is identified by method + URL; only same-origin GET requests
//! are ever intercepted by the gateway. The destination classifies what the
//! client intends to do with the response, which matters only for the
//! fallback policy on network failure (document navigations get the cached
//! fallback page, everything else propagates the failure).

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::cache::key::request_key;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the requester intends to do with the response.
///
/// Mirrors the fetch destination of the intercepted request. Only
/// [`Destination::Document`] changes gateway behavior (fallback page on
/// network failure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Destination {
    /// Full document navigation.
    Document,
    Style,
    Script,
    Image,
    Font,
    /// Generic data fetch (JSON, manifest, etc.).
    Data,
    #[default]
    Other,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Document => "document",
            Destination::Style => "style",
            Destination::Script => "script",
            Destination::Image => "image",
            Destination::Font => "font",
            Destination::Data => "data",
            Destination::Other => "other",
        }
    }
}

impl FromStr for Destination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document" => Ok(Destination::Document),
            "style" => Ok(Destination::Style),
            "script" => Ok(Destination::Script),
            "image" => Ok(Destination::Image),
            "font" => Ok(Destination::Font),
            "data" => Ok(Destination::Data),
            "other" => Ok(Destination::Other),
            other => Err(format!("unknown destination: {other}")),
        }
    }
}

/// An intercepted request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub destination: Destination,
}

impl Request {
    /// A GET request with the default (non-document) destination.
    pub fn get(url: Url) -> Self {
        Self { method: Method::Get, url, destination: Destination::Other }
    }

    /// A GET request for a full document navigation.
    pub fn document(url: Url) -> Self {
        Self { method: Method::Get, url, destination: Destination::Document }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::Get
    }

    /// Whether this request targets the same origin as the given site root.
    pub fn same_origin(&self, origin: &Url) -> bool {
        self.url.origin() == origin.origin()
    }

    /// Cache key for this request (method + URL).
    pub fn cache_key(&self) -> String {
        request_key(self.method.as_str(), self.url.as_str())
    }
}
