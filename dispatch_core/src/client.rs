use crate::codec::{ContentType, Encodes, Json};
use crate::config::ServiceConfig;
use crate::dispatch::Dispatcher;
use crate::error::ApiError;
use crate::interceptor::{InterceptorChain, RequestInterceptor, ResponseInterceptor};
use crate::policy::Policy;
use crate::relay::RelayChannel;
use crate::request::{RequestDescriptor, RequestOptions};
use crate::transport::{BuiltRequest, ReqwestTransport, Transport};
use crate::types::RequestMethod;
use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Base service every facade is built on.
///
/// Owns the service configuration, the interceptor lists and the
/// dispatcher. Configure it (interceptors, relay) before sharing it; after
/// that it is only read.
pub struct ApiClient<T: Transport = ReqwestTransport> {
    config: ServiceConfig,
    dispatcher: Dispatcher<T>,
    interceptors: InterceptorChain,
}

impl ApiClient<ReqwestTransport> {
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_reqwest_client(config, reqwest::Client::new())
    }

    pub fn with_reqwest_client(config: ServiceConfig, client: reqwest::Client) -> Self {
        Self::with_transport(config, ReqwestTransport::new(client))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(config: ServiceConfig, transport: T) -> Self {
        let dispatcher = Dispatcher::new(config.name(), transport);
        Self {
            config,
            dispatcher,
            interceptors: InterceptorChain::new(),
        }
    }

    pub fn with_relay(mut self, relay: Arc<dyn RelayChannel>) -> Self {
        self.dispatcher.set_relay(Some(relay));
        self
    }

    #[inline]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    #[inline]
    pub fn transport(&self) -> &T {
        self.dispatcher.transport()
    }

    #[inline]
    pub fn has_relay(&self) -> bool {
        self.dispatcher.has_relay()
    }

    #[inline]
    pub fn interceptors(&self) -> &InterceptorChain {
        &self.interceptors
    }

    pub fn add_request_interceptor(&mut self, i: impl RequestInterceptor) {
        self.interceptors.add_request(i);
    }

    pub fn add_response_interceptor(&mut self, i: impl ResponseInterceptor) {
        self.interceptors.add_response(i);
    }

    /// Merges service defaults with the call site (call site wins).
    pub fn descriptor(
        &self,
        method: RequestMethod,
        endpoint: &str,
        body: Option<Bytes>,
        opts: &RequestOptions,
    ) -> RequestDescriptor {
        let mut policy = Policy::for_service(&self.config);
        policy.apply_call(opts);
        if body.is_some() {
            policy.ensure_content_type(<Json as ContentType>::CONTENT_TYPE);
        }
        let (headers, timeout) = policy.into_parts();
        RequestDescriptor {
            endpoint: opts.endpoint_with_query(endpoint),
            method,
            headers,
            body,
            timeout,
        }
    }

    /// Runs a descriptor through the full pipeline and returns the
    /// interceptor-transformed payload.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<Value, ApiError> {
        let descriptor = self.interceptors.apply_request(descriptor).await?;
        let built = self.build(descriptor)?;
        let (meta, payload) = self.dispatcher.dispatch(&built).await?;
        self.interceptors.apply_response(&meta, payload).await
    }

    pub async fn request(
        &self,
        method: RequestMethod,
        endpoint: &str,
        body: Option<Bytes>,
        opts: RequestOptions,
    ) -> Result<Value, ApiError> {
        self.execute(self.descriptor(method, endpoint, body, &opts))
            .await
    }

    pub async fn get<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        opts: RequestOptions,
    ) -> Result<R, ApiError> {
        let v = self.request(RequestMethod::Get, endpoint, None, opts).await?;
        decode(v)
    }

    pub async fn post<B, R>(&self, endpoint: &str, body: &B, opts: RequestOptions) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let v = self
            .request(RequestMethod::Post, endpoint, Some(encode(body)?), opts)
            .await?;
        decode(v)
    }

    pub async fn put<B, R>(&self, endpoint: &str, body: &B, opts: RequestOptions) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let v = self
            .request(RequestMethod::Put, endpoint, Some(encode(body)?), opts)
            .await?;
        decode(v)
    }

    pub async fn patch<B, R>(&self, endpoint: &str, body: &B, opts: RequestOptions) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let v = self
            .request(RequestMethod::Patch, endpoint, Some(encode(body)?), opts)
            .await?;
        decode(v)
    }

    pub async fn delete<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        opts: RequestOptions,
    ) -> Result<R, ApiError> {
        let v = self.request(RequestMethod::Delete, endpoint, None, opts).await?;
        decode(v)
    }

    /// DELETE carrying a JSON body (batch deletes).
    pub async fn delete_with<B, R>(&self, endpoint: &str, body: &B, opts: RequestOptions) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let v = self
            .request(RequestMethod::Delete, endpoint, Some(encode(body)?), opts)
            .await?;
        decode(v)
    }

    fn build(&self, d: RequestDescriptor) -> Result<BuiltRequest, ApiError> {
        let url = self
            .config
            .url_for(&d.endpoint)
            .map_err(|e| ApiError::exception(format!("invalid url for '{}': {}", d.endpoint, e)))?;
        Ok(BuiltRequest {
            endpoint: d.endpoint,
            method: d.method,
            url,
            headers: d.headers,
            body: d.body,
            timeout: d.timeout,
        })
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Bytes, ApiError> {
    <Json as Encodes<B>>::encode(body).map_err(ApiError::from)
}

fn decode<R: DeserializeOwned>(v: Value) -> Result<R, ApiError> {
    serde_json::from_value(v).map_err(ApiError::from)
}

/// Resource-scoped client built on an [`ApiClient`].
///
/// Implementors only supply endpoints and payload shapes; interceptor
/// registration comes with the trait.
pub trait Facade<T: Transport> {
    fn client(&self) -> &ApiClient<T>;
    fn client_mut(&mut self) -> &mut ApiClient<T>;

    fn add_request_interceptor(&mut self, i: impl RequestInterceptor)
    where
        Self: Sized,
    {
        self.client_mut().add_request_interceptor(i);
    }

    fn add_response_interceptor(&mut self, i: impl ResponseInterceptor)
    where
        Self: Sized,
    {
        self.client_mut().add_response_interceptor(i);
    }
}
