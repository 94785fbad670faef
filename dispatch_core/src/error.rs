use http::{HeaderMap, StatusCode};
use std::error::Error;
use std::fmt;
use thiserror::Error;

pub type FxError = Box<dyn Error + Send + Sync>;

pub const PROXY_REQUEST_FAILED: &str = "Proxy request failed";
pub const REQUEST_TIMEOUT: &str = "Request timeout";
pub const UNKNOWN_ERROR: &str = "Unknown error occurred";

/// Failure origin of an [`ApiError`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// The relay answered with `success: false`.
    RelayFailure,
    /// The direct transport reached the server but got a non-2xx status.
    HttpFailure,
    /// The direct transport deadline elapsed and the call was aborted.
    RequestTimeout,
    /// Anything else: broken connection, undecodable body, interceptor failure.
    TransportException,
}

impl ErrorKind {
    #[inline]
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::RelayFailure | ErrorKind::HttpFailure => 0,
            ErrorKind::RequestTimeout | ErrorKind::TransportException => -1,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::RelayFailure => f.write_str("relay failure"),
            ErrorKind::HttpFailure => f.write_str("http failure"),
            ErrorKind::RequestTimeout => f.write_str("request timeout"),
            ErrorKind::TransportException => f.write_str("transport exception"),
        }
    }
}

/// The only error type callers of a facade ever see.
///
/// `code` and `http_status` follow the dispatcher's taxonomy:
///
/// | kind               | code | http_status            |
/// |--------------------|------|------------------------|
/// | RelayFailure       | 0    | relay status or 0      |
/// | HttpFailure        | 0    | response status        |
/// | RequestTimeout     | -1   | 408                    |
/// | TransportException | -1   | 0                      |
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    message: String,
    code: i32,
    http_status: u16,
    kind: ErrorKind,
    body: Option<String>,
}

impl ApiError {
    fn new(kind: ErrorKind, message: impl Into<String>, http_status: u16) -> Self {
        Self {
            message: message.into(),
            code: kind.code(),
            http_status,
            kind,
            body: None,
        }
    }

    pub fn relay_failure(error: Option<String>, status: Option<u16>) -> Self {
        Self::new(
            ErrorKind::RelayFailure,
            error.unwrap_or_else(|| PROXY_REQUEST_FAILED.to_string()),
            status.unwrap_or(0),
        )
    }

    pub fn http_failure(status: StatusCode, body: Option<String>) -> Self {
        let mut e = Self::new(
            ErrorKind::HttpFailure,
            format!("HTTP error! status: {}", status.as_u16()),
            status.as_u16(),
        );
        e.body = body;
        e
    }

    pub fn timeout() -> Self {
        Self::new(
            ErrorKind::RequestTimeout,
            REQUEST_TIMEOUT,
            StatusCode::REQUEST_TIMEOUT.as_u16(),
        )
    }

    /// Generic failure. An empty message becomes [`UNKNOWN_ERROR`].
    pub fn exception(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            return Self::unknown();
        }
        Self::new(ErrorKind::TransportException, message, 0)
    }

    pub fn unknown() -> Self {
        Self::new(ErrorKind::TransportException, UNKNOWN_ERROR, 0)
    }

    /// Collapses an arbitrary error into the taxonomy.
    ///
    /// An `ApiError` anywhere in the boxed value is returned as-is, never wrapped again.
    pub fn normalize(err: FxError) -> Self {
        match err.downcast::<ApiError>() {
            Ok(api) => *api,
            Err(other) => match find_api_error(&*other) {
                Some(api) => api.clone(),
                None => Self::exception(other.to_string()),
            },
        }
    }

    /// Same as [`ApiError::normalize`] for a borrowed error.
    pub fn from_error(err: &(dyn Error + 'static)) -> Self {
        match find_api_error(err) {
            Some(api) => api.clone(),
            None => Self::exception(err.to_string()),
        }
    }

    /// Attaches response text for the caller. The kind, code and status stay as they are.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 0 or -1, always `kind().code()`.
    #[inline]
    pub fn code(&self) -> i32 {
        self.code
    }

    #[inline]
    pub fn http_status(&self) -> u16 {
        self.http_status
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Truncated response body, set for `HttpFailure`.
    #[inline]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    #[inline]
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.http_status).ok()
    }

    #[inline]
    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::RequestTimeout
    }
}

fn find_api_error<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a ApiError> {
    let mut cur: Option<&'a (dyn Error + 'static)> = Some(err);
    while let Some(e) = cur {
        if let Some(api) = e.downcast_ref::<ApiError>() {
            return Some(api);
        }
        cur = e.source();
    }
    None
}

impl From<crate::transport::TransportError> for ApiError {
    fn from(e: crate::transport::TransportError) -> Self {
        Self::from_error(&e)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::exception(e.to_string())
    }
}

/// Errors raised while building a [`crate::config::ServiceConfig`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid base url: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("base url must be http(s), got scheme '{0}'")]
    Scheme(String),

    #[error("invalid header '{name}'")]
    Header { name: String },
}

/// Text rendering of an error response body, capped at 8 KiB.
pub fn body_as_text(headers: &HeaderMap, body: &bytes::Bytes, full_len: Option<usize>) -> String {
    const MAX: usize = 8 * 1024;
    crate::debug::body_preview(headers, body, MAX, full_len.unwrap_or(body.len()))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io;

    #[test]
    fn taxonomy_codes_and_statuses() {
        let relay = ApiError::relay_failure(None, None);
        assert_eq!(relay.message(), PROXY_REQUEST_FAILED);
        assert_eq!((relay.code(), relay.http_status()), (0, 0));

        let relay = ApiError::relay_failure(Some("upstream refused".into()), Some(502));
        assert_eq!(relay.message(), "upstream refused");
        assert_eq!((relay.code(), relay.http_status()), (0, 502));

        let http = ApiError::http_failure(StatusCode::NOT_FOUND, None);
        assert_eq!(http.message(), "HTTP error! status: 404");
        assert_eq!((http.code(), http.http_status()), (0, 404));

        let t = ApiError::timeout();
        assert_eq!(t.message(), REQUEST_TIMEOUT);
        assert_eq!((t.code(), t.http_status()), (-1, 408));
        assert!(t.is_timeout());

        let e = ApiError::exception("connection reset");
        assert_eq!((e.code(), e.http_status()), (-1, 0));
        assert_eq!(e.kind(), ErrorKind::TransportException);

        assert_eq!(ApiError::exception("").message(), UNKNOWN_ERROR);
        assert_eq!(ApiError::exception("   ").message(), UNKNOWN_ERROR);
    }

    #[test]
    fn normalize_never_rewraps_api_errors() {
        let original = ApiError::http_failure(StatusCode::FORBIDDEN, Some("nope".into()));
        let boxed: FxError = Box::new(original.clone());
        assert_eq!(ApiError::normalize(boxed), original);

        #[derive(Error, Debug)]
        #[error("interceptor failed")]
        struct Outer(#[source] ApiError);

        let wrapped = Outer(original.clone());
        assert_eq!(ApiError::from_error(&wrapped), original);
    }

    #[test]
    fn normalize_foreign_errors() {
        let boxed: FxError = Box::new(io::Error::other("broken pipe"));
        let e = ApiError::normalize(boxed);
        assert_eq!(e.message(), "broken pipe");
        assert_eq!(e.kind(), ErrorKind::TransportException);

        let boxed: FxError = Box::new(io::Error::other(""));
        assert_eq!(ApiError::normalize(boxed).message(), UNKNOWN_ERROR);
    }

    #[test]
    fn body_preview_truncates_and_encodes_binary() {
        let mut headers = HeaderMap::new();
        let body = bytes::Bytes::from_static(b"{\"error\":\"missing\"}");
        assert_eq!(body_as_text(&headers, &body, None), "{\"error\":\"missing\"}");
        assert_eq!(
            body_as_text(&headers, &body, Some(body.len() + 10)),
            "{\"error\":\"missing\"}..."
        );

        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/octet-stream"),
        );
        let bin = bytes::Bytes::from_static(&[0x00, 0x01, 0x02]);
        assert_eq!(body_as_text(&headers, &bin, None), "<non-text; 3 bytes; base64:AAEC>");
    }

    #[test]
    fn multibyte_body_cut_at_the_cap_stays_text() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json; charset=utf-8"),
        );
        let text = "€é".repeat(1800);
        assert_eq!(text.len(), 9000);
        let full = bytes::Bytes::from(text.clone());
        // the dispatcher reads 8 KiB of an error body, which ends inside a "€"
        let head = full.slice(..8 * 1024);

        let out = body_as_text(&headers, &head, Some(full.len()));
        assert!(!out.starts_with("<non-"), "{out}");
        assert!(out.ends_with("..."));
        let shown = out.trim_end_matches("...");
        assert!(text.starts_with(shown));
        assert!(shown.len() > 8 * 1024 - 4);
    }
}
