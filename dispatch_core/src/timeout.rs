use core::time::Duration;
use std::future::Future;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Call-site override for the request timeout.
///
/// - `Inherit`: keep the service default.
/// - `Clear`: no deadline for this request.
/// - `Set(d)`: force timeout for this request.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum TimeoutOverride {
    #[default]
    Inherit,
    Clear,
    Set(Duration),
}

impl TimeoutOverride {
    #[inline]
    pub fn resolve(self, inherited: Option<Duration>) -> Option<Duration> {
        match self {
            TimeoutOverride::Inherit => inherited,
            TimeoutOverride::Clear => None,
            TimeoutOverride::Set(d) => Some(d),
        }
    }
}

#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
#[error("deadline of {0:?} elapsed")]
pub struct DeadlineElapsed(pub Duration);

/// Abortable deadline for one direct-transport call.
///
/// Arming spawns a timer that cancels the token once the timeout elapses.
/// [`Deadline::run`] drops the guarded future as soon as the token fires,
/// which aborts the in-flight request. Dropping the deadline aborts the
/// timer, so a call that finishes early leaves nothing behind.
#[derive(Debug)]
pub struct Deadline {
    token: CancellationToken,
    timeout: Option<Duration>,
    timer: Option<JoinHandle<()>>,
}

impl Deadline {
    /// Must be called inside a tokio runtime when `timeout` is `Some`.
    pub fn arm(timeout: Option<Duration>) -> Self {
        let token = CancellationToken::new();
        let timer = timeout.map(|d| {
            let t = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(d).await;
                t.cancel();
            })
        });
        Self {
            token,
            timeout,
            timer,
        }
    }

    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Token fired when the deadline elapses.
    #[inline]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    pub async fn run<F: Future>(self, fut: F) -> Result<F::Output, DeadlineElapsed> {
        let Some(d) = self.timeout else {
            return Ok(fut.await);
        };
        let token = self.token.clone();
        tokio::select! {
            biased;
            out = fut => Ok(out),
            _ = token.cancelled() => Err(DeadlineElapsed(d)),
        }
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.disarm();
    }
}
