use crate::error::ConfigError;
use core::time::Duration;
use http::header::{ACCEPT, HeaderName};
use http::{HeaderMap, HeaderValue};
use url::Url;

/// Per-service settings, fixed at construction and read-only afterwards.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    name: String,
    base_url: Url,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl ServiceConfig {
    pub fn builder(name: impl Into<String>, base_url: impl Into<String>) -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            name: name.into(),
            base_url: base_url.into(),
            default_headers: Vec::new(),
            timeout: None,
        }
    }

    /// Service name forwarded to the relay.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[inline]
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Resolves an endpoint against the base URL.
    ///
    /// Absolute `http(s)://` endpoints are used verbatim; anything else is
    /// appended to the base path with exactly one `/` between them.
    pub fn url_for(&self, endpoint: &str) -> Result<Url, url::ParseError> {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return Url::parse(endpoint);
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        let tail = endpoint.trim_start_matches('/');
        if tail.is_empty() {
            return Url::parse(base);
        }
        Url::parse(&format!("{base}/{tail}"))
    }
}

#[derive(Debug)]
pub struct ServiceConfigBuilder {
    name: String,
    base_url: String,
    default_headers: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl ServiceConfigBuilder {
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout_ms(mut self, ms: Option<u64>) -> Self {
        self.timeout = ms.map(Duration::from_millis);
        self
    }

    pub fn build(self) -> Result<ServiceConfig, ConfigError> {
        let base_url = Url::parse(&self.base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::Scheme(base_url.scheme().to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in self.default_headers {
            let (n, v) = parse_header(&name, &value)?;
            headers.insert(n, v);
        }

        Ok(ServiceConfig {
            name: self.name,
            base_url,
            default_headers: headers,
            timeout: self.timeout,
        })
    }
}

pub(crate) fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), ConfigError> {
    let n = HeaderName::from_bytes(name.as_bytes()).map_err(|_| ConfigError::Header {
        name: name.to_string(),
    })?;
    let v = HeaderValue::from_str(value).map_err(|_| ConfigError::Header {
        name: name.to_string(),
    })?;
    Ok((n, v))
}
