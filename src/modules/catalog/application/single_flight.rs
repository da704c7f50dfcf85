//! Per-key coalescing of in-flight work
//!
//! The first caller for a key spawns the work onto the runtime; later callers
//! for the same key attach to the same result. The spawned task owns its own
//! registry entry and removes it when it finishes (or panics), so a caller
//! giving up never cancels the work or leaves a stale entry behind.

use dashmap::{mapref::entry::Entry, DashMap};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::shared::errors::{AppError, AppResult};

type SharedResult<T> = Shared<BoxFuture<'static, Result<T, oneshot::error::RecvError>>>;

pub struct SingleFlight<K, T>
where
    K: Eq + Hash,
{
    in_flight: Arc<DashMap<K, SharedResult<T>>>,
}

impl<K, T> SingleFlight<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Run `work` for `key` unless a run is already in flight, in which case
    /// wait for that run's result instead. `work` is only invoked by the
    /// caller that starts the flight.
    pub async fn run<F, Fut>(&self, key: K, work: F) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let shared = match self.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => {
                log::debug!("Joining in-flight request for {:?}", key);
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let (tx, rx) = oneshot::channel();
                let shared = rx.boxed().shared();
                entry.insert(shared.clone());

                let guard = FlightGuard {
                    in_flight: Arc::clone(&self.in_flight),
                    key: Some(key.clone()),
                };
                let fut = work();
                tokio::spawn(async move {
                    let output = fut.await;
                    drop(guard);
                    let _ = tx.send(output);
                });
                shared
            }
        };

        shared.await.map_err(|_| {
            AppError::InternalError(format!("In-flight request for {:?} was aborted", key))
        })
    }

    /// Number of keys with work currently running
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.in_flight.contains_key(key)
    }
}

impl<K, T> Default for SingleFlight<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Removes the registry entry when the flight ends, including on panic
struct FlightGuard<K, T>
where
    K: Eq + Hash,
{
    in_flight: Arc<DashMap<K, SharedResult<T>>>,
    key: Option<K>,
}

impl<K, T> Drop for FlightGuard<K, T>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.in_flight.remove(&key);
        }
    }
}
