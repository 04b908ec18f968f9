//! Per-key queues of callers waiting on one in-flight query.

use std::collections::HashMap;

/// Waiters keyed by query. The first waiter for a key is the one that must
/// issue the query; [`PendingQueries::take`] empties the key so the next
/// waiter starts a fresh one.
#[derive(Debug)]
pub struct PendingQueries<W> {
    queues: HashMap<String, Vec<W>>,
}

impl<W> Default for PendingQueries<W> {
    fn default() -> Self {
        Self { queues: HashMap::new() }
    }
}

impl<W> PendingQueries<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `waiter`; `true` when no query for `key` is in flight yet.
    pub fn enqueue(&mut self, key: &str, waiter: W) -> bool {
        let queue = self.queues.entry(key.to_string()).or_default();
        queue.push(waiter);
        queue.len() == 1
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.queues.contains_key(key)
    }

    /// Remove and return every waiter of `key`, in arrival order.
    pub fn take(&mut self, key: &str) -> Vec<W> {
        self.queues.remove(key).unwrap_or_default()
    }
}
