use crate::codec::{Decodes, Json};
use crate::debug::{BODY_PREVIEW_BYTES, RedactedHeaders, body_preview};
use crate::error::{ApiError, body_as_text};
use crate::relay::{RelayChannel, RelayEnvelope, RelayError, RelayOutcome};
use crate::timeout::Deadline;
use crate::transport::{BuiltRequest, Transport, read_body_all, read_body_preview};
use crate::types::ResponseMeta;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace, warn};

const ERROR_PREVIEW_BYTES: usize = 8 * 1024;

/// Relay-first, direct-fallback dispatcher.
///
/// A relay that answers (successfully or not) is final. Only a relay that
/// cannot be asked at all sends the request down the direct transport, and
/// then exactly once.
pub struct Dispatcher<T: Transport> {
    service: String,
    transport: T,
    relay: Option<Arc<dyn RelayChannel>>,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(service: impl Into<String>, transport: T) -> Self {
        Self {
            service: service.into(),
            transport,
            relay: None,
        }
    }

    pub fn set_relay(&mut self, relay: Option<Arc<dyn RelayChannel>>) {
        self.relay = relay;
    }

    #[inline]
    pub fn has_relay(&self) -> bool {
        self.relay.is_some()
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn dispatch(&self, req: &BuiltRequest) -> Result<(ResponseMeta, Value), ApiError> {
        debug!(
            service = %self.service,
            method = %req.method,
            url = %req.url,
            "dispatching request"
        );
        trace!(headers = %RedactedHeaders(&req.headers), "request headers");
        if let Some(body) = req.body.as_ref() {
            trace!(
                bytes = body.len(),
                body = %body_preview(&req.headers, body, BODY_PREVIEW_BYTES, body.len()),
                "request body"
            );
        }

        match self.try_relay(req).await {
            RelayOutcome::Served(data) => {
                debug!(service = %self.service, url = %req.url, "served by relay");
                Ok((ResponseMeta::relayed(), data))
            }
            RelayOutcome::Rejected(err) => {
                debug!(
                    service = %self.service,
                    url = %req.url,
                    status = err.http_status(),
                    error = %err,
                    "relay rejected request"
                );
                Err(err)
            }
            RelayOutcome::Unavailable(reason) => {
                match reason {
                    RelayError::NotInstalled => {
                        debug!(service = %self.service, "no relay installed, using direct transport")
                    }
                    other => warn!(
                        service = %self.service,
                        url = %req.url,
                        error = %other,
                        "relay unavailable, falling back to direct transport"
                    ),
                }
                self.send_direct(req).await
            }
        }
    }

    async fn try_relay(&self, req: &BuiltRequest) -> RelayOutcome {
        let Some(relay) = self.relay.as_ref() else {
            return RelayOutcome::Unavailable(RelayError::NotInstalled);
        };
        let envelope = match RelayEnvelope::from_request(&self.service, req) {
            Ok(env) => env,
            Err(e) => return RelayOutcome::Unavailable(e),
        };
        RelayOutcome::from_result(relay.invoke(envelope).await)
    }

    async fn send_direct(&self, req: &BuiltRequest) -> Result<(ResponseMeta, Value), ApiError> {
        let deadline = Deadline::arm(req.timeout);
        match deadline.run(self.exchange(req)).await {
            Ok(res) => res,
            Err(elapsed) => {
                debug!(url = %req.url, timeout = ?elapsed.0, "direct request aborted by deadline");
                Err(ApiError::timeout())
            }
        }
    }

    async fn exchange(&self, req: &BuiltRequest) -> Result<(ResponseMeta, Value), ApiError> {
        let mut resp = self.transport.send(req).await?;
        let status = resp.status;
        let headers = resp.headers;

        if !status.is_success() {
            let full_len = resp.content_length.and_then(|n| usize::try_from(n).ok());
            let preview = read_body_preview(resp.body.as_mut(), ERROR_PREVIEW_BYTES)
                .await
                .ok()
                .map(|b| body_as_text(&headers, &b, full_len))
                .filter(|s| !s.is_empty());
            debug!(url = %req.url, status = status.as_u16(), "direct request failed");
            trace!(headers = %RedactedHeaders(&headers), body = ?preview, "error response");
            return Err(ApiError::http_failure(status, preview));
        }

        let bytes = read_body_all(resp.body.as_mut()).await?;
        debug!(url = %req.url, status = status.as_u16(), bytes = bytes.len(), "direct response");
        trace!(
            body = %body_preview(&headers, &bytes, BODY_PREVIEW_BYTES, bytes.len()),
            "response body"
        );

        let payload: Value = <Json as Decodes<Value>>::decode(&bytes)?;
        Ok((ResponseMeta::new(status, headers), payload))
    }
}
