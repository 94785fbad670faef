//! Privileged relay channel.
//!
//! The relay executes network calls on behalf of the shell. Only the
//! consumer side lives here: the envelope sent, the result received, and
//! the [`RelayChannel`] seam the dispatcher talks to.

use crate::error::{ApiError, FxError};
use crate::transport::BuiltRequest;
use crate::types::RequestMethod;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelayEnvelope {
    pub service: String,
    pub config: RelayRequestConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelayRequestConfig {
    pub method: RequestMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Milliseconds; enforced by the privileged side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl RelayEnvelope {
    pub fn from_request(service: &str, req: &BuiltRequest) -> Result<Self, RelayError> {
        // repeated values are joined the way a single HTTP/1.1 line would carry them
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in req.headers.iter() {
            let v = value.to_str().map_err(|_| {
                RelayError::Envelope(format!("header '{}' is not visible ASCII", name))
            })?;
            headers
                .entry(name.as_str().to_string())
                .and_modify(|joined| {
                    joined.push_str(", ");
                    joined.push_str(v);
                })
                .or_insert_with(|| v.to_string());
        }
        let body = req
            .body
            .as_ref()
            .map(|b| {
                String::from_utf8(b.to_vec())
                    .map_err(|_| RelayError::Envelope("body is not valid UTF-8".to_string()))
            })
            .transpose()?;
        let timeout = req
            .timeout
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));

        Ok(Self {
            service: service.to_string(),
            config: RelayRequestConfig {
                method: req.method,
                url: req.url.as_str().to_string(),
                headers,
                body,
                timeout,
            },
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<RelayDetails>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl RelayResult {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            details: status_code.map(|s| RelayDetails {
                status_code: Some(s),
            }),
            ..Self::default()
        }
    }
}

/// The relay could not be asked at all. Always triggers the direct fallback.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RelayError {
    #[error("no relay channel installed")]
    NotInstalled,

    #[error("relay channel closed")]
    Closed,

    #[error("relay dropped the request without replying")]
    Dropped,

    #[error("relay envelope: {0}")]
    Envelope(String),

    #[error("relay channel: {0}")]
    Channel(FxError),
}

impl RelayError {
    pub fn channel(e: impl Into<FxError>) -> Self {
        RelayError::Channel(e.into())
    }
}

/// Injectable relay seam.
///
/// A structured failure is an `Ok(RelayResult { success: false, .. })`.
/// `Err` means the channel itself is unusable.
pub trait RelayChannel: Send + Sync + 'static {
    fn invoke<'a>(
        &'a self,
        envelope: RelayEnvelope,
    ) -> Pin<Box<dyn Future<Output = Result<RelayResult, RelayError>> + Send + 'a>>;
}

/// Which way the relay attempt went.
#[derive(Debug)]
pub enum RelayOutcome {
    Served(Value),
    Rejected(ApiError),
    Unavailable(RelayError),
}

impl RelayOutcome {
    pub fn from_result(res: Result<RelayResult, RelayError>) -> Self {
        match res {
            Ok(r) if r.success => RelayOutcome::Served(r.data.unwrap_or(Value::Null)),
            Ok(r) => RelayOutcome::Rejected(ApiError::relay_failure(
                r.error,
                r.details.and_then(|d| d.status_code),
            )),
            Err(e) => RelayOutcome::Unavailable(e),
        }
    }
}

/// One pending relay call as seen by the privileged side.
#[derive(Debug)]
pub struct RelayCall {
    pub envelope: RelayEnvelope,
    reply: oneshot::Sender<RelayResult>,
}

impl RelayCall {
    /// Returns `false` when the caller stopped waiting.
    pub fn respond(self, result: RelayResult) -> bool {
        self.reply.send(result).is_ok()
    }
}

/// In-process relay handle backed by a tokio channel.
///
/// The receiving half is handed to whatever bridges to the privileged
/// process; dropping it makes every later call report `Closed`.
#[derive(Clone, Debug)]
pub struct ChannelRelay {
    tx: mpsc::Sender<RelayCall>,
}

impl ChannelRelay {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<RelayCall>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl RelayChannel for ChannelRelay {
    fn invoke<'a>(
        &'a self,
        envelope: RelayEnvelope,
    ) -> Pin<Box<dyn Future<Output = Result<RelayResult, RelayError>> + Send + 'a>> {
        Box::pin(async move {
            let (reply, rx) = oneshot::channel();
            self.tx
                .send(RelayCall { envelope, reply })
                .await
                .map_err(|_| RelayError::Closed)?;
            rx.await.map_err(|_| RelayError::Dropped)
        })
    }
}
