use crate::config::parse_header;
use crate::error::ApiError;
use crate::timeout::TimeoutOverride;
use crate::types::RequestMethod;
use bytes::Bytes;
use http::header::HeaderName;
use http::{HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;

/// A pending request as seen by request interceptors.
///
/// Built fresh per call from the service defaults and the call-site
/// [`RequestOptions`]; frozen once the dispatcher takes it.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    pub endpoint: String,
    pub method: RequestMethod,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
}

impl RequestDescriptor {
    pub fn new(method: RequestMethod, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }

    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Replaces `name`. Invalid names or values fail as a transport exception.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), ApiError> {
        let (n, v) = parse_header(name, value).map_err(|e| ApiError::exception(e.to_string()))?;
        self.headers.insert(n, v);
        Ok(())
    }

    /// Body parsed as JSON, `None` when absent or not JSON.
    pub fn body_json(&self) -> Option<Value> {
        self.body
            .as_ref()
            .and_then(|b| serde_json::from_slice(b).ok())
    }
}

/// Typed call-site configuration.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    headers: HeaderMap,
    query: Vec<(String, String)>,
    timeout: TimeoutOverride,
}

impl RequestOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn try_header(mut self, name: &str, value: &str) -> Result<Self, ApiError> {
        let (n, v) = parse_header(name, value).map_err(|e| ApiError::exception(e.to_string()))?;
        self.headers.insert(n, v);
        Ok(self)
    }

    /// Appends a query pair (duplicates allowed).
    #[inline]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Appends `key=value` only when `value` is `Some`.
    #[inline]
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    #[inline]
    pub fn timeout(mut self, d: Duration) -> Self {
        self.timeout = TimeoutOverride::Set(d);
        self
    }

    #[inline]
    pub fn clear_timeout(mut self) -> Self {
        self.timeout = TimeoutOverride::Clear;
        self
    }

    #[inline]
    pub fn inherit_timeout(mut self) -> Self {
        self.timeout = TimeoutOverride::Inherit;
        self
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    #[inline]
    pub fn timeout_override(&self) -> TimeoutOverride {
        self.timeout
    }

    /// `endpoint` with the query pairs url-encoded onto it.
    pub fn endpoint_with_query(&self, endpoint: &str) -> String {
        if self.query.is_empty() {
            return endpoint.to_string();
        }
        let mut ser = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &self.query {
            ser.append_pair(k, v);
        }
        let sep = if endpoint.contains('?') { '&' } else { '?' };
        format!("{endpoint}{sep}{}", ser.finish())
    }
}
