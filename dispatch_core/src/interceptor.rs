//! Request and response interceptors.
//!
//! Both lists are append-only and run strictly in registration order, each
//! interceptor awaited before the next one starts. The first error stops the
//! chain and is returned untouched.

use crate::error::ApiError;
use crate::request::RequestDescriptor;
use crate::secret::SecretString;
use crate::types::ResponseMeta;
use http::HeaderValue;
use http::header::AUTHORIZATION;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait RequestInterceptor: Send + Sync + 'static {
    fn intercept<'a>(
        &'a self,
        req: RequestDescriptor,
    ) -> BoxFuture<'a, Result<RequestDescriptor, ApiError>>;
}

pub trait ResponseInterceptor: Send + Sync + 'static {
    fn intercept<'a>(
        &'a self,
        meta: &'a ResponseMeta,
        payload: Value,
    ) -> BoxFuture<'a, Result<Value, ApiError>>;
}

impl<F, Fut> RequestInterceptor for F
where
    F: Fn(RequestDescriptor) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<RequestDescriptor, ApiError>> + Send + 'static,
{
    fn intercept<'a>(
        &'a self,
        req: RequestDescriptor,
    ) -> BoxFuture<'a, Result<RequestDescriptor, ApiError>> {
        Box::pin(self(req))
    }
}

impl<F, Fut> ResponseInterceptor for F
where
    F: Fn(ResponseMeta, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ApiError>> + Send + 'static,
{
    fn intercept<'a>(
        &'a self,
        meta: &'a ResponseMeta,
        payload: Value,
    ) -> BoxFuture<'a, Result<Value, ApiError>> {
        Box::pin(self(meta.clone(), payload))
    }
}

/// Synchronous request interceptor, see [`map_request`].
pub struct MapRequest<F>(F);

/// Wraps a plain function as a request interceptor.
pub fn map_request<F>(f: F) -> MapRequest<F>
where
    F: Fn(RequestDescriptor) -> Result<RequestDescriptor, ApiError> + Send + Sync + 'static,
{
    MapRequest(f)
}

impl<F> RequestInterceptor for MapRequest<F>
where
    F: Fn(RequestDescriptor) -> Result<RequestDescriptor, ApiError> + Send + Sync + 'static,
{
    fn intercept<'a>(
        &'a self,
        req: RequestDescriptor,
    ) -> BoxFuture<'a, Result<RequestDescriptor, ApiError>> {
        let out = (self.0)(req);
        Box::pin(async move { out })
    }
}

/// Synchronous response interceptor, see [`map_response`].
pub struct MapResponse<F>(F);

/// Wraps a plain function as a response interceptor.
pub fn map_response<F>(f: F) -> MapResponse<F>
where
    F: Fn(&ResponseMeta, Value) -> Result<Value, ApiError> + Send + Sync + 'static,
{
    MapResponse(f)
}

impl<F> ResponseInterceptor for MapResponse<F>
where
    F: Fn(&ResponseMeta, Value) -> Result<Value, ApiError> + Send + Sync + 'static,
{
    fn intercept<'a>(
        &'a self,
        meta: &'a ResponseMeta,
        payload: Value,
    ) -> BoxFuture<'a, Result<Value, ApiError>> {
        let out = (self.0)(meta, payload);
        Box::pin(async move { out })
    }
}

/// Sets `Authorization: Bearer <token>` on every request.
pub fn bearer_auth(token: SecretString) -> impl RequestInterceptor {
    map_request(move |mut req: RequestDescriptor| {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
            .map_err(|_| ApiError::exception("bearer token is not a valid header value"))?;
        value.set_sensitive(true);
        req.headers.insert(AUTHORIZATION, value);
        Ok(req)
    })
}

#[derive(Clone, Default)]
pub struct InterceptorChain {
    request: Vec<Arc<dyn RequestInterceptor>>,
    response: Vec<Arc<dyn ResponseInterceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_request(&mut self, i: impl RequestInterceptor) {
        self.request.push(Arc::new(i));
    }

    pub fn add_response(&mut self, i: impl ResponseInterceptor) {
        self.response.push(Arc::new(i));
    }

    #[inline]
    pub fn request_len(&self) -> usize {
        self.request.len()
    }

    #[inline]
    pub fn response_len(&self) -> usize {
        self.response.len()
    }

    pub async fn apply_request(
        &self,
        mut req: RequestDescriptor,
    ) -> Result<RequestDescriptor, ApiError> {
        for i in &self.request {
            req = i.intercept(req).await?;
        }
        Ok(req)
    }

    pub async fn apply_response(
        &self,
        meta: &ResponseMeta,
        mut payload: Value,
    ) -> Result<Value, ApiError> {
        for i in &self.response {
            payload = i.intercept(meta, payload).await?;
        }
        Ok(payload)
    }
}
