//! # Binding table - many-to-many relation between exchanges and queues.
//!
//! Bindings are keyed by (exchange, queue, routing key) with set semantics:
//! duplicate binds are idempotent and two bindings that differ only in
//! routing key still deliver a fanout message once, because the snapshot
//! query deduplicates per queue.
//!
//! ## Rules
//! - Endpoint existence is validated by the broker *before* insertion;
//!   the table itself only maintains the relation.
//! - [`BindingTable::bound_queues`] is a consistent point-in-time snapshot
//!   relative to concurrent bind/unbind: it runs under the table lock and
//!   never observes a torn state or a queue twice.
//! - Queue/exchange destruction calls the purge methods within the same
//!   logical operation, sharing this lock domain with the routing snapshot.

use std::collections::{BTreeSet, HashMap};

use tokio::sync::RwLock;

use crate::exchanges::ExchangeKind;

/// One (queue, routing key) edge of an exchange's binding set.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Binding {
    /// Destination queue name.
    pub queue: String,
    /// Key the binding was declared with; wildcard under fanout.
    pub routing_key: String,
}

/// Concurrent binding relation, keyed by exchange name.
#[derive(Debug, Default)]
pub struct BindingTable {
    routes: RwLock<HashMap<String, BTreeSet<Binding>>>,
}

impl BindingTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a binding. Idempotent: rebinding an existing triple is a
    /// no-op.
    pub async fn bind(&self, exchange: &str, queue: &str, routing_key: &str) {
        let mut routes = self.routes.write().await;
        let inserted = routes.entry(exchange.to_string()).or_default().insert(Binding {
            queue: queue.to_string(),
            routing_key: routing_key.to_string(),
        });
        if inserted {
            tracing::debug!(exchange, queue, routing_key, "binding added");
        }
    }

    /// Removes a binding. No-op if the triple does not exist.
    pub async fn unbind(&self, exchange: &str, queue: &str, routing_key: &str) {
        let mut routes = self.routes.write().await;
        if let Some(bindings) = routes.get_mut(exchange) {
            let removed = bindings.remove(&Binding {
                queue: queue.to_string(),
                routing_key: routing_key.to_string(),
            });
            if removed {
                tracing::debug!(exchange, queue, routing_key, "binding removed");
            }
            if bindings.is_empty() {
                routes.remove(exchange);
            }
        }
    }

    /// Snapshot of the queues a message published to `exchange` with
    /// `routing_key` reaches under `kind`.
    ///
    /// Unique queue names, point-in-time consistent: bindings added after
    /// the snapshot do not receive the message, bindings removed after it
    /// still do.
    pub async fn bound_queues(
        &self,
        exchange: &str,
        kind: ExchangeKind,
        routing_key: &str,
    ) -> Vec<String> {
        let routes = self.routes.read().await;
        let Some(bindings) = routes.get(exchange) else {
            return Vec::new();
        };

        // Bindings sort by queue first, so deduplication is a linear pass.
        let mut queues: Vec<String> = Vec::with_capacity(bindings.len());
        for binding in bindings {
            if !kind.matches(&binding.routing_key, routing_key) {
                continue;
            }
            if queues.last().map(String::as_str) != Some(binding.queue.as_str()) {
                queues.push(binding.queue.clone());
            }
        }
        queues
    }

    /// Removes every binding that routes to `queue` (queue destruction).
    pub async fn purge_queue(&self, queue: &str) {
        let mut routes = self.routes.write().await;
        routes.retain(|_, bindings| {
            bindings.retain(|b| b.queue != queue);
            !bindings.is_empty()
        });
    }

    /// Removes every binding of `exchange` (exchange deletion).
    pub async fn purge_exchange(&self, exchange: &str) {
        self.routes.write().await.remove(exchange);
    }

    /// Total number of bindings across all exchanges.
    pub async fn len(&self) -> usize {
        let routes = self.routes.read().await;
        routes.values().map(BTreeSet::len).sum()
    }

    /// True if no bindings exist.
    pub async fn is_empty(&self) -> bool {
        self.routes.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_is_idempotent() {
        let table = BindingTable::new();
        table.bind("logs", "q1", "").await;
        table.bind("logs", "q1", "").await;
        assert_eq!(table.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_keys_dedupe_to_one_queue() {
        let table = BindingTable::new();
        table.bind("logs", "q1", "info").await;
        table.bind("logs", "q1", "error").await;
        table.bind("logs", "q2", "info").await;

        let queues = table
            .bound_queues("logs", ExchangeKind::Fanout, "whatever")
            .await;
        assert_eq!(queues, vec!["q1", "q2"]);
    }

    #[tokio::test]
    async fn test_fanout_ignores_routing_key() {
        let table = BindingTable::new();
        table.bind("logs", "q1", "only-this-key").await;

        let with_key = table.bound_queues("logs", ExchangeKind::Fanout, "other").await;
        let without = table.bound_queues("logs", ExchangeKind::Fanout, "").await;
        assert_eq!(with_key, without);
        assert_eq!(with_key, vec!["q1"]);
    }

    #[tokio::test]
    async fn test_unbind_missing_is_noop() {
        let table = BindingTable::new();
        table.bind("logs", "q1", "").await;
        table.unbind("logs", "q2", "").await;
        table.unbind("other", "q1", "").await;
        assert_eq!(table.len().await, 1);

        table.unbind("logs", "q1", "").await;
        assert!(table.is_empty().await);
    }

    #[tokio::test]
    async fn test_purge_queue_removes_all_mentions() {
        let table = BindingTable::new();
        table.bind("logs", "q1", "").await;
        table.bind("metrics", "q1", "").await;
        table.bind("logs", "q2", "").await;

        table.purge_queue("q1").await;
        assert_eq!(
            table.bound_queues("logs", ExchangeKind::Fanout, "").await,
            vec!["q2"]
        );
        assert!(table
            .bound_queues("metrics", ExchangeKind::Fanout, "")
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_purge_exchange_removes_its_bindings() {
        let table = BindingTable::new();
        table.bind("logs", "q1", "").await;
        table.bind("metrics", "q1", "").await;

        table.purge_exchange("logs").await;
        assert!(table.bound_queues("logs", ExchangeKind::Fanout, "").await.is_empty());
        assert_eq!(table.len().await, 1);
    }
}
