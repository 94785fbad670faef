use crate::types::RequestMethod;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use url::Url;

/// A descriptor after interceptors ran and the URL was resolved.
#[derive(Clone, Debug)]
pub struct BuiltRequest {
    pub endpoint: String,
    pub method: RequestMethod,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
}

#[derive(Debug)]
pub struct TransportError(crate::error::FxError);

impl TransportError {
    #[inline]
    pub fn new(e: impl Error + Send + Sync + 'static) -> Self {
        Self(Box::new(e))
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.0)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self::new(e)
    }
}

pub trait TransportBody: Send + 'static {
    fn next_chunk<'a>(
        &'a mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Bytes>, TransportError>> + Send + 'a>>;
}

pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub content_length: Option<u64>,
    pub body: Box<dyn TransportBody>,
}

/// Direct network transport.
///
/// Contract:
/// - Must send `method`, `url`, `headers` and `body` as given.
/// - Must stop the exchange when the returned future is dropped; the
///   dispatcher enforces `timeout` by dropping it.
/// - Must not leak a concrete HTTP client type in its public surface.
pub trait Transport: Send + Sync + 'static {
    fn send<'a>(
        &'a self,
        req: &'a BuiltRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send + 'a>>;
}

#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    #[inline]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    #[inline]
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

struct ReqwestBody {
    resp: reqwest::Response,
}

impl TransportBody for ReqwestBody {
    fn next_chunk<'a>(
        &'a mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Bytes>, TransportError>> + Send + 'a>> {
        Box::pin(async move { self.resp.chunk().await.map_err(TransportError::from) })
    }
}

impl Transport for ReqwestTransport {
    fn send<'a>(
        &'a self,
        req: &'a BuiltRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send + 'a>> {
        let client = self.client.clone();
        let method = http::Method::from(req.method);
        let url = req.url.clone();
        let headers = req.headers.clone();
        let body = req.body.clone();
        Box::pin(async move {
            // No reqwest timeout here: the deadline surfaces as RequestTimeout, not as an I/O error.
            let mut rb = client.request(method, url).headers(headers);
            if let Some(b) = body {
                rb = rb.body(b);
            }
            let resp = rb.send().await.map_err(TransportError::from)?;
            let status = resp.status();
            let headers = resp.headers().clone();
            let content_length = resp.content_length();
            Ok(TransportResponse {
                status,
                headers,
                content_length,
                body: Box::new(ReqwestBody { resp }),
            })
        })
    }
}

pub(crate) async fn read_body_preview(
    body: &mut dyn TransportBody,
    max: usize,
) -> Result<Bytes, TransportError> {
    let mut buf = bytes::BytesMut::with_capacity(max.min(8 * 1024));
    while buf.len() < max {
        match body.next_chunk().await? {
            Some(chunk) => {
                let remaining = max - buf.len();
                if chunk.len() <= remaining {
                    buf.extend_from_slice(&chunk);
                } else {
                    buf.extend_from_slice(&chunk[..remaining]);
                    break;
                }
            }
            None => break,
        }
    }
    Ok(buf.freeze())
}

pub(crate) async fn read_body_all(body: &mut dyn TransportBody) -> Result<Bytes, TransportError> {
    let mut buf = bytes::BytesMut::with_capacity(8 * 1024);
    while let Some(chunk) = body.next_chunk().await? {
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}
