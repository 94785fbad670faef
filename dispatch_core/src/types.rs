use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of verbs a facade may issue.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl RequestMethod {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RequestMethod> for http::Method {
    fn from(m: RequestMethod) -> Self {
        match m {
            RequestMethod::Get => http::Method::GET,
            RequestMethod::Post => http::Method::POST,
            RequestMethod::Put => http::Method::PUT,
            RequestMethod::Patch => http::Method::PATCH,
            RequestMethod::Delete => http::Method::DELETE,
        }
    }
}

/// Response shape handed to response interceptors.
///
/// Identical for relayed and direct responses: interceptors cannot tell which
/// transport served the request.
#[derive(Clone, Debug)]
pub struct ResponseMeta {
    pub status: StatusCode,
    pub ok: bool,
    pub headers: HeaderMap,
}

impl ResponseMeta {
    #[inline]
    pub fn new(status: StatusCode, headers: HeaderMap) -> Self {
        Self {
            status,
            ok: status.is_success(),
            headers,
        }
    }

    /// Metadata for a payload the relay delivered (it reports no status or headers).
    #[inline]
    pub fn relayed() -> Self {
        Self::new(StatusCode::OK, HeaderMap::new())
    }
}
