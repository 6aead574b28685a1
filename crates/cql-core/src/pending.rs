//! Pending-request handle: an atomic ready flag, a mutex/condvar pair for
//! blocking waiters, a result slot, and an optional completion callback
//! dispatched off the I/O thread. `AtomicBool` with `Acquire`/`Release`
//! ordering plus `Mutex`/`Condvar` guarantee the result is fully written
//! before the ready flag is observably set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use cql_proto::Frame;

use crate::error::ConnectionError;

/// The outcome of a request once the connection has resolved it.
#[derive(Debug, Clone)]
pub enum RequestOutcome {
    /// The server's response frame.
    Response(Frame),
    /// The request failed (server error, connection loss, cancellation).
    Failed(ConnectionError),
}

struct Inner {
    ready: AtomicBool,
    result: Mutex<Option<RequestOutcome>>,
    condvar: Condvar,
    callback: Mutex<Option<Box<dyn FnOnce(RequestOutcome) + Send>>>,
}

/// A handle to a request that is either in flight or has already resolved.
///
/// Cloning shares the same underlying state: the connection holds one clone
/// (registered in the stream registry) and the caller holds another. Both
/// may be dropped in either order; the handle is reference-counted.
#[derive(Clone)]
pub struct PendingRequest {
    inner: Arc<Inner>,
}

impl PendingRequest {
    /// Create a new, unresolved handle with no completion callback.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                ready: AtomicBool::new(false),
                result: Mutex::new(None),
                condvar: Condvar::new(),
                callback: Mutex::new(None),
            }),
        }
    }

    /// Register a completion callback. If the request has already resolved
    /// by the time this is called, the callback is invoked immediately with
    /// the existing result (on the calling thread, not off-loaded — callers
    /// registering after the fact have already left the I/O path).
    pub fn on_complete(&self, callback: impl FnOnce(RequestOutcome) + Send + 'static) {
        if self.ready() {
            let outcome = self.result_unchecked();
            callback(outcome);
            return;
        }
        *self.inner.callback.lock().unwrap_or_else(std::sync::PoisonError::into_inner) =
            Some(Box::new(callback));
    }

    /// `true` once the request has resolved (response, error, or
    /// cancellation).
    #[must_use]
    pub fn ready(&self) -> bool {
        self.inner.ready.load(Ordering::Acquire)
    }

    #[allow(clippy::expect_used, reason = "caller already observed ready() == true")]
    fn result_unchecked(&self) -> RequestOutcome {
        self.inner
            .result
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
            .expect("ready() observed true implies result is populated")
    }

    /// Resolve the request. Called exactly once by the connection (on
    /// response, on per-stream error, or on connection loss/cancellation).
    /// A second call is a logic error and is ignored rather than panicking,
    /// since connection-loss cleanup and an in-flight response can race.
    pub fn complete(&self, outcome: RequestOutcome) {
        let mut slot = self.inner.result.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if slot.is_some() {
            return;
        }
        *slot = Some(outcome.clone());
        drop(slot);
        self.inner.ready.store(true, Ordering::Release);
        self.inner.condvar.notify_all();

        if let Some(callback) =
            self.inner.callback.lock().unwrap_or_else(std::sync::PoisonError::into_inner).take()
        {
            callback(outcome);
        }
    }

    /// Block the calling thread until the request resolves.
    #[must_use]
    #[allow(clippy::expect_used, reason = "wait_while's predicate only returns once the slot is Some")]
    pub fn wait(&self) -> RequestOutcome {
        let guard = self.inner.result.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let guard = self
            .inner
            .condvar
            .wait_while(guard, |result| result.is_none())
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.clone().expect("condvar predicate guarantees Some")
    }

    /// Block the calling thread until the request resolves or `timeout`
    /// elapses. The stream ID is NOT released on timeout; only a server
    /// response or connection close releases it.
    #[must_use]
    pub fn wait_for(&self, timeout: Duration) -> Option<RequestOutcome> {
        let guard = self.inner.result.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let (guard, _timeout_result) = self
            .inner
            .condvar
            .wait_timeout_while(guard, timeout, |result| result.is_none())
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.clone()
    }
}

impl Default for PendingRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest").field("ready", &self.ready()).finish()
    }
}
