//! Bounded-concurrency load queue with per-key request coalescing.

use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::error::QueueError;
use crate::stats::{QueueSnapshot, QueueStats};
use crate::types::AppPath;

use super::state::{Admission, AdmissionState};

type LoadFn<K, R> = dyn Fn(K) -> BoxFuture<'static, R> + Send + Sync;
type Waiter<R> = oneshot::Sender<Result<R, QueueError>>;

/// Queue keyed by canonical paths, as used for thumbnails and image decodes.
pub type PathLoadQueue<R> = LoadQueue<AppPath, R>;

/// Runs at most `capacity` loads at once.
///
/// Requests for a key that is already in flight or already waiting share that single load and
/// all receive a clone of its result. Distinct keys are admitted in the order `add` was called.
/// Loads run as tasks on the runtime captured at construction, so dropping a [`LoadHandle`]
/// never releases capacity early.
pub struct LoadQueue<K, R> {
    shared: Arc<Shared<K, R>>,
}

struct Shared<K, R> {
    load: Box<LoadFn<K, R>>,
    state: Mutex<AdmissionState<K, Waiter<R>>>,
    stats: QueueStats,
    runtime: Handle,
}

impl<K, R> Clone for LoadQueue<K, R> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<K, R> fmt::Debug for LoadQueue<K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("LoadQueue")
            .field("capacity", &state.capacity())
            .field("in_flight", &state.in_flight_len())
            .field("pending", &state.pending_len())
            .finish()
    }
}

impl<K, R> LoadQueue<K, R>
where
    K: Clone + Eq + Hash + fmt::Display + Send + 'static,
    R: Clone + Send + 'static,
{
    /// Build a queue on the current Tokio runtime.
    pub fn new<F, Fut>(max_concurrent: usize, load: F) -> Result<Self, QueueError>
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| QueueError::NoRuntime)?;
        Self::with_handle(runtime, max_concurrent, load)
    }

    /// Build a queue whose loads are spawned on `runtime`.
    pub fn with_handle<F, Fut>(
        runtime: Handle,
        max_concurrent: usize,
        load: F,
    ) -> Result<Self, QueueError>
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        if max_concurrent == 0 {
            return Err(QueueError::InvalidCapacity);
        }

        let load: Box<LoadFn<K, R>> = Box::new(move |key| load(key).boxed());
        let shared = Shared {
            load,
            state: Mutex::new(AdmissionState::new(max_concurrent)),
            stats: QueueStats::new(),
            runtime,
        };
        Ok(Self { shared: Arc::new(shared) })
    }

    /// Request `key`. The request is registered before this returns; the handle resolves once
    /// the load serving it settles.
    pub fn add(&self, key: K) -> LoadHandle<R> {
        let (tx, rx) = oneshot::channel();
        let admission = {
            let mut state = self.shared.state.lock();
            let admission = state.request(key.clone(), tx);
            self.shared.stats.update_occupancy(state.in_flight_len(), state.pending_len());
            admission
        };

        match admission {
            Admission::Admitted => {
                debug!(%key, "load admitted");
                Shared::spawn_load(&self.shared, key);
            }
            Admission::Queued => {
                self.shared.stats.record_queued();
                debug!(%key, "capacity exhausted, load queued");
            }
            Admission::Coalesced => {
                self.shared.stats.record_coalesced();
                debug!(%key, "request joined an existing load");
            }
        }

        LoadHandle { rx }
    }

    pub fn capacity(&self) -> usize {
        self.shared.state.lock().capacity()
    }

    pub fn in_flight_len(&self) -> usize {
        self.shared.state.lock().in_flight_len()
    }

    /// Number of distinct keys waiting for capacity.
    pub fn pending_len(&self) -> usize {
        self.shared.state.lock().pending_len()
    }

    pub fn stats(&self) -> QueueSnapshot {
        self.shared.stats.snapshot()
    }
}

impl<K, R> Shared<K, R>
where
    K: Clone + Eq + Hash + fmt::Display + Send + 'static,
    R: Clone + Send + 'static,
{
    fn spawn_load(self: &Arc<Self>, key: K) {
        self.stats.record_started();
        let shared = Arc::clone(self);
        self.runtime.spawn(async move {
            let started = Instant::now();
            let loader = Arc::clone(&shared);
            let load_key = key.clone();
            let outcome = AssertUnwindSafe(async move { (loader.load)(load_key).await })
                .catch_unwind()
                .await
                .map_err(|_| QueueError::LoaderPanicked { key: key.to_string() });
            shared.finish(&key, outcome, started.elapsed());
        });
    }

    fn finish(self: &Arc<Self>, key: &K, outcome: Result<R, QueueError>, elapsed: Duration) {
        self.stats.record_finished(elapsed, outcome.is_err());
        let completion = {
            let mut state = self.state.lock();
            let completion = state.complete(key);
            self.stats.update_occupancy(state.in_flight_len(), state.pending_len());
            completion
        };

        if let Err(err) = &outcome {
            error!(%key, error = %err, "load failed");
        }
        debug!(%key, waiters = completion.waiters.len(), ?elapsed, "load settled");

        for waiter in completion.waiters {
            // A waiter that dropped its handle simply misses the result.
            let _ = waiter.send(outcome.clone());
        }
        for next in completion.admitted {
            debug!(key = %next, "load admitted from queue");
            Self::spawn_load(self, next);
        }
    }
}

/// Future resolving to the result of the load serving one `add` call.
pub struct LoadHandle<R> {
    rx: oneshot::Receiver<Result<R, QueueError>>,
}

impl<R> fmt::Debug for LoadHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadHandle").finish_non_exhaustive()
    }
}

impl<R> Future for LoadHandle<R> {
    type Output = Result<R, QueueError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(QueueError::Abandoned)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn zero_capacity_is_rejected() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let result = LoadQueue::<String, bool>::with_handle(runtime.handle().clone(), 0, |_| {
            async { true }
        });
        assert_eq!(result.unwrap_err(), QueueError::InvalidCapacity);
    }

    #[test]
    fn construction_outside_runtime_fails() {
        let result = LoadQueue::<String, bool>::new(2, |_| async { true });
        assert_eq!(result.unwrap_err(), QueueError::NoRuntime);
    }

    #[tokio::test]
    async fn resolves_with_loader_value() {
        let queue = LoadQueue::new(2, |key: String| async move { key.len() }).unwrap();
        assert_eq!(queue.add("four".to_string()).await, Ok(4));
        assert_eq!(queue.in_flight_len(), 0);
    }

    #[tokio::test]
    async fn panicking_loader_settles_all_waiters_and_frees_capacity() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let queue = LoadQueue::new(1, move |key: String| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if key == "boom" {
                    panic!("decoder exploded");
                }
                true
            }
        })
        .unwrap();

        let first = queue.add("boom".to_string());
        let second = queue.add("boom".to_string());
        let after = queue.add("fine".to_string());

        let expected = Err(QueueError::LoaderPanicked { key: "boom".to_string() });
        assert_eq!(first.await, expected);
        assert_eq!(second.await, expected);
        assert_eq!(after.await, Ok(true));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(queue.stats().loads_panicked, 1);
    }

    #[tokio::test]
    async fn dropped_handle_does_not_release_capacity() {
        let (release, gate) = tokio::sync::watch::channel(false);
        let queue = LoadQueue::new(1, move |_key: String| {
            let mut gate = gate.clone();
            async move {
                let _ = gate.wait_for(|open| *open).await;
            }
        })
        .unwrap();

        drop(queue.add("a".to_string()));
        let next = queue.add("b".to_string());
        assert_eq!(queue.in_flight_len(), 1);
        assert_eq!(queue.pending_len(), 1);

        release.send(true).unwrap();
        assert_eq!(next.await, Ok(()));
    }
}
