use bytes::Bytes;
use dispatch_core::prelude::{RequestMethod, Transport};
use dispatch_core::transport::*;
use http::{HeaderMap, StatusCode};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: RequestMethod,
    pub url: url::Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
}

impl RecordedRequest {
    pub fn body_json(&self) -> Option<serde_json::Value> {
        self.body
            .as_ref()
            .and_then(|b| serde_json::from_slice(b).ok())
    }
}

#[derive(Clone, Debug)]
pub enum MockReply {
    Respond {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },
    /// Sleeps before answering; used to race the deadline.
    Delayed {
        delay: Duration,
        status: StatusCode,
        body: Bytes,
    },
    /// Never answers.
    Hang,
    /// The connection fails before any response.
    Fail(String),
}

impl MockReply {
    pub fn ok_json(body: Bytes) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        MockReply::Respond {
            status: StatusCode::OK,
            headers,
            body,
        }
    }

    pub fn status(status: StatusCode) -> Self {
        MockReply::Respond {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn status_json(status: StatusCode, body: Bytes) -> Self {
        match Self::ok_json(body) {
            MockReply::Respond { headers, body, .. } => MockReply::Respond {
                status,
                headers,
                body,
            },
            other => other,
        }
    }

    pub fn delayed_json(delay: Duration, body: Bytes) -> Self {
        MockReply::Delayed {
            delay,
            status: StatusCode::OK,
            body,
        }
    }

    pub fn hang() -> Self {
        MockReply::Hang
    }

    pub fn fail(message: impl Into<String>) -> Self {
        MockReply::Fail(message.into())
    }

    pub fn with_header(mut self, name: http::header::HeaderName, value: http::HeaderValue) -> Self {
        if let MockReply::Respond { headers, .. } = &mut self {
            headers.insert(name, value);
        }
        self
    }
}

struct OneShotBody {
    chunk: Option<Bytes>,
}

impl TransportBody for OneShotBody {
    fn next_chunk<'a>(
        &'a mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Bytes>, TransportError>> + Send + 'a>> {
        Box::pin(async move { Ok(self.chunk.take()) })
    }
}

#[derive(Debug, Default)]
struct MockState {
    recorded: Mutex<Vec<RecordedRequest>>,
    replies: Mutex<VecDeque<MockReply>>,
    aborted: Mutex<usize>,
}

/// Marks a send as aborted if it is dropped before completing.
struct InFlightGuard {
    st: Arc<MockState>,
    done: bool,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.done {
            *self.st.aborted.lock().unwrap() += 1;
        }
    }
}

#[derive(Clone)]
pub struct MockTransport {
    st: Arc<MockState>,
}

pub struct MockHandle {
    st: Arc<MockState>,
    finished: bool,
}

#[derive(Default)]
pub struct MockBuilder {
    replies: Vec<MockReply>,
}

impl MockBuilder {
    pub fn new() -> Self {
        Self { replies: Vec::new() }
    }

    pub fn reply(mut self, r: MockReply) -> Self {
        self.replies.push(r);
        self
    }

    pub fn replies(mut self, rs: impl IntoIterator<Item = MockReply>) -> Self {
        self.replies.extend(rs);
        self
    }

    pub fn build(self) -> (MockTransport, MockHandle) {
        let st = Arc::new(MockState {
            replies: Mutex::new(self.replies.into_iter().collect()),
            ..MockState::default()
        });
        (
            MockTransport { st: st.clone() },
            MockHandle {
                st,
                finished: false,
            },
        )
    }
}

pub fn mock() -> MockBuilder {
    MockBuilder::new()
}

impl MockHandle {
    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.st.recorded.lock().unwrap().clone()
    }

    pub fn recorded_len(&self) -> usize {
        self.st.recorded.lock().unwrap().len()
    }

    pub fn assert_recorded_len(&self, expected: usize) {
        let got = self.recorded_len();
        if got != expected {
            let reqs = self.recorded();
            panic!(
                "recorded request count mismatch\n  expected: {expected}\n  got: {got}\n  recorded:\n{:#?}",
                reqs
            );
        }
    }

    /// Sends dropped before they produced a response.
    pub fn aborted(&self) -> usize {
        *self.st.aborted.lock().unwrap()
    }

    pub fn remaining_replies(&self) -> usize {
        self.st.replies.lock().unwrap().len()
    }

    pub fn assert_no_remaining_replies(&self) {
        let left = self.remaining_replies();
        if left != 0 {
            panic!("mock replies not fully consumed: remaining={left}");
        }
    }

    pub fn finish(mut self) {
        self.assert_no_remaining_replies();
        self.finished = true;
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if std::thread::panicking() {
            return;
        }
        let left = self.st.replies.lock().unwrap().len();
        if left != 0 {
            panic!("mock replies not fully consumed (drop): remaining={left}");
        }
    }
}

fn respond(status: StatusCode, headers: HeaderMap, body: Bytes) -> TransportResponse {
    TransportResponse {
        status,
        headers,
        content_length: Some(body.len() as u64),
        body: Box::new(OneShotBody { chunk: Some(body) }),
    }
}

impl Transport for MockTransport {
    fn send<'a>(
        &'a self,
        req: &'a BuiltRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send + 'a>> {
        let st = self.st.clone();
        Box::pin(async move {
            st.recorded.lock().unwrap().push(RecordedRequest {
                method: req.method,
                url: req.url.clone(),
                headers: req.headers.clone(),
                body: req.body.clone(),
                timeout: req.timeout,
            });

            let reply = {
                let mut g = st.replies.lock().unwrap();
                g.pop_front().unwrap_or_else(|| {
                    panic!(
                        "MockTransport: no more scripted replies, but send() was called.\nlast_request={} {}",
                        req.method, req.url
                    );
                })
            };

            let mut guard = InFlightGuard {
                st: st.clone(),
                done: false,
            };
            let out = match reply {
                MockReply::Respond {
                    status,
                    headers,
                    body,
                } => Ok(respond(status, headers, body)),
                MockReply::Delayed {
                    delay,
                    status,
                    body,
                } => {
                    tokio::time::sleep(delay).await;
                    Ok(respond(status, HeaderMap::new(), body))
                }
                MockReply::Hang => {
                    std::future::pending::<Result<TransportResponse, TransportError>>().await
                }
                MockReply::Fail(message) => Err(TransportError::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    message,
                ))),
            };
            guard.done = true;
            out
        })
    }
}
