use dispatch_core::relay::{RelayChannel, RelayEnvelope, RelayError, RelayResult};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

#[derive(Debug)]
pub enum RelayScript {
    Reply(RelayResult),
    /// The bridge exists but cannot be reached.
    Unavailable(String),
}

#[derive(Debug, Default)]
struct RelayState {
    envelopes: Mutex<Vec<RelayEnvelope>>,
    script: Mutex<VecDeque<RelayScript>>,
}

/// Scripted relay that records every envelope it is handed.
#[derive(Clone)]
pub struct MockRelay {
    st: Arc<RelayState>,
}

pub struct RelayHandle {
    st: Arc<RelayState>,
}

impl MockRelay {
    pub fn new(script: impl IntoIterator<Item = RelayScript>) -> (Arc<Self>, RelayHandle) {
        let st = Arc::new(RelayState {
            script: Mutex::new(script.into_iter().collect()),
            ..RelayState::default()
        });
        (Arc::new(Self { st: st.clone() }), RelayHandle { st })
    }

    pub fn replying(result: RelayResult) -> (Arc<Self>, RelayHandle) {
        Self::new([RelayScript::Reply(result)])
    }

    pub fn unavailable(reason: &str) -> (Arc<Self>, RelayHandle) {
        Self::new([RelayScript::Unavailable(reason.to_string())])
    }
}

impl RelayHandle {
    pub fn envelopes(&self) -> Vec<RelayEnvelope> {
        self.st.envelopes.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.st.envelopes.lock().unwrap().len()
    }
}

impl RelayChannel for MockRelay {
    fn invoke<'a>(
        &'a self,
        envelope: RelayEnvelope,
    ) -> Pin<Box<dyn Future<Output = Result<RelayResult, RelayError>> + Send + 'a>> {
        Box::pin(async move {
            self.st.envelopes.lock().unwrap().push(envelope);
            let next = self.st.script.lock().unwrap().pop_front();
            match next {
                Some(RelayScript::Reply(r)) => Ok(r),
                Some(RelayScript::Unavailable(reason)) => Err(RelayError::channel(reason)),
                None => panic!("MockRelay: no more scripted results, but invoke() was called"),
            }
        })
    }
}
