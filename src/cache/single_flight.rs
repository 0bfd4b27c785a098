//! Keyed collapsing of concurrent identical operations.
//!
//! The first caller for a key starts the operation and publishes it as a
//! shared future; callers arriving while it is in flight await that future
//! and receive a clone of its result instead of running their own.

use std::future::Future;
use std::hash::Hash;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};

type Call<T> = Shared<BoxFuture<'static, T>>;

/// A group of in-flight operations keyed by `K`.
pub struct SingleFlight<K, T>
where
    K: Eq + Hash,
    T: Clone,
{
    calls: DashMap<K, Call<T>>,
}

/// Removes the leader's entry once it finishes or is dropped.
struct LeaderGuard<'a, K, T>
where
    K: Eq + Hash,
    T: Clone,
{
    calls: &'a DashMap<K, Call<T>>,
    key: Option<K>,
}

impl<K, T> Drop for LeaderGuard<'_, K, T>
where
    K: Eq + Hash,
    T: Clone,
{
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.calls.remove(&key);
        }
    }
}

impl<K, T> SingleFlight<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            calls: DashMap::new(),
        }
    }

    /// Run `work` for `key` unless a call for the same key is already in
    /// flight, in which case its result is awaited and shared.
    ///
    /// Returns the result and whether this caller was the one that ran it.
    pub async fn run<F, Fut>(&self, key: K, work: F) -> (T, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        // `work` only builds the future; it is polled after the shard lock
        // is released.
        let (call, guard) = match self.calls.entry(key.clone()) {
            Entry::Occupied(existing) => (existing.get().clone(), None),
            Entry::Vacant(slot) => {
                let call = work().boxed().shared();
                slot.insert(call.clone());
                let guard = LeaderGuard {
                    calls: &self.calls,
                    key: Some(key),
                };
                (call, Some(guard))
            }
        };

        let leader = guard.is_some();
        let value = call.await;
        drop(guard);
        (value, leader)
    }

    /// Whether a call for `key` is currently in flight.
    pub fn in_flight(&self, key: &K) -> bool {
        self.calls.contains_key(key)
    }
}

impl<K, T> Default for SingleFlight<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
