use crate::config::ServiceConfig;
use crate::request::RequestOptions;
use core::time::Duration;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue};

/// Header and timeout layering for one call:
/// service defaults -> call-site options -> runtime injections.
#[derive(Default, Debug)]
pub struct Policy {
    headers: HeaderMap,
    timeout: Option<Duration>,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_service(config: &ServiceConfig) -> Self {
        Self {
            headers: config.default_headers().clone(),
            timeout: config.timeout(),
        }
    }

    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Call-site layer. Every header name present in `opts` replaces all
    /// inherited values for that name.
    pub fn apply_call(&mut self, opts: &RequestOptions) {
        for name in opts.headers().keys() {
            let _ = self.headers.remove(name);
        }
        for (name, value) in opts.headers().iter() {
            self.headers.append(name.clone(), value.clone());
        }
        self.timeout = opts.timeout_override().resolve(self.timeout);
    }

    /// Runtime layer: encoder-driven Content-Type, only when nobody set one.
    pub fn ensure_content_type(&mut self, ct: &'static str) {
        if ct.is_empty() || self.headers.contains_key(CONTENT_TYPE) {
            return;
        }
        self.headers.insert(CONTENT_TYPE, HeaderValue::from_static(ct));
    }

    pub fn into_parts(self) -> (HeaderMap, Option<Duration>) {
        (self.headers, self.timeout)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use http::header::{ACCEPT, AUTHORIZATION, HeaderName};

    fn service() -> ServiceConfig {
        ServiceConfig::builder("admin", "https://admin.local/api")
            .default_header("x-tenant", "acme")
            .default_header("x-client", "shell")
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap()
    }

    #[test]
    fn call_site_wins_on_collision() {
        let mut p = Policy::for_service(&service());
        let opts = RequestOptions::new()
            .header(HeaderName::from_static("x-tenant"), HeaderValue::from_static("globex"))
            .header(AUTHORIZATION, HeaderValue::from_static("Bearer t"));
        p.apply_call(&opts);

        let h = p.headers();
        assert_eq!(h.get("x-tenant").unwrap(), "globex");
        assert_eq!(h.get_all("x-tenant").iter().count(), 1);
        assert_eq!(h.get("x-client").unwrap(), "shell");
        assert_eq!(h.get(AUTHORIZATION).unwrap(), "Bearer t");
        assert_eq!(h.get(ACCEPT).unwrap(), "application/json");
    }

    #[test]
    fn timeout_override_layers() {
        let mut p = Policy::for_service(&service());
        p.apply_call(&RequestOptions::new());
        assert_eq!(p.timeout(), Some(Duration::from_secs(30)));

        let mut p = Policy::for_service(&service());
        p.apply_call(&RequestOptions::new().timeout(Duration::from_millis(50)));
        assert_eq!(p.timeout(), Some(Duration::from_millis(50)));

        let mut p = Policy::for_service(&service());
        p.apply_call(&RequestOptions::new().clear_timeout());
        assert_eq!(p.timeout(), None);
    }

    #[test]
    fn content_type_only_when_missing() {
        let mut p = Policy::new();
        p.ensure_content_type("application/json");
        assert_eq!(p.headers().get(CONTENT_TYPE).unwrap(), "application/json");

        let mut p = Policy::new();
        p.apply_call(&RequestOptions::new().header(CONTENT_TYPE, HeaderValue::from_static("text/plain")));
        p.ensure_content_type("application/json");
        assert_eq!(p.headers().get(CONTENT_TYPE).unwrap(), "text/plain");

        let mut p = Policy::new();
        p.ensure_content_type("");
        assert!(p.headers().get(CONTENT_TYPE).is_none());
    }
}
