//! # Router - fan-out of published messages into bound queues.
//!
//! `route` is the whole publish path: resolve the exchange, snapshot its
//! bound queues, then enqueue one logical copy of the message per queue.
//!
//! ## Snapshot invariant
//! The set of queues a message reaches is exactly the set bound to the
//! exchange at the instant of publish: bindings added afterwards do not
//! receive it, bindings removed between snapshot and enqueue still do.
//! A queue destroyed in that window simply never receives its copy — a
//! silent best-effort drop, not a producer error.
//!
//! ## Locking
//! `route` suspends only while acquiring the binding and queue snapshots.
//! The per-queue enqueue fan-out runs with no shared lock held and with no
//! ordering dependency between destinations: a full or slow queue cannot
//! stall delivery to its siblings.

use std::sync::Arc;

use futures::future::join_all;

use crate::bindings::BindingTable;
use crate::error::{BrokerError, Result};
use crate::exchanges::ExchangeRegistry;
use crate::message::Message;
use crate::queues::QueueStore;

/// Publish-side routing pipeline over the three shared stores.
pub struct Router {
    registry: Arc<ExchangeRegistry>,
    bindings: Arc<BindingTable>,
    store: Arc<QueueStore>,
}

impl Router {
    /// Creates a router over the given registry, binding table, and store.
    pub fn new(
        registry: Arc<ExchangeRegistry>,
        bindings: Arc<BindingTable>,
        store: Arc<QueueStore>,
    ) -> Self {
        Self {
            registry,
            bindings,
            store,
        }
    }

    /// Routes `message` through the named exchange.
    ///
    /// Returns the number of queues the message was actually appended to;
    /// `0` is a valid outcome ("no subscriber listening"), not an error.
    ///
    /// # Errors
    /// - [`BrokerError::UnknownExchange`] if the exchange is not declared.
    /// - [`BrokerError::BufferOverflow`] if a `Block`-policy queue stayed
    ///   full past the publish timeout. Copies accepted by other queues
    ///   before the timeout stand (best-effort fan-out).
    pub async fn route(&self, exchange: &str, message: Message) -> Result<usize> {
        let exchange = self.registry.lookup(exchange).await?;
        let queues = self
            .bindings
            .bound_queues(exchange.name(), exchange.kind(), &message.routing_key)
            .await;
        if queues.is_empty() {
            tracing::debug!(exchange = exchange.name(), "no bound queues, message discarded");
            return Ok(0);
        }

        let slots = self.store.resolve(&queues).await;

        // No shared lock is held from here on; each enqueue synchronizes
        // only on its own queue, so destinations cannot stall each other.
        let results = join_all(
            slots
                .iter()
                .map(|slot| self.store.enqueue_slot(slot, message.clone())),
        )
        .await;

        let mut delivered = 0;
        let mut overflow: Option<BrokerError> = None;
        for result in results {
            match result {
                Ok(true) => delivered += 1,
                Ok(false) => {}
                Err(err) => overflow = Some(err),
            }
        }
        if let Some(err) = overflow {
            return Err(err);
        }

        tracing::debug!(
            exchange = exchange.name(),
            bound = queues.len(),
            delivered,
            "message routed"
        );
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrokerConfig;
    use crate::exchanges::ExchangeKind;
    use crate::policies::OverflowPolicy;
    use std::time::Duration;

    async fn router_with(cfg: BrokerConfig) -> (Router, Arc<ExchangeRegistry>, Arc<BindingTable>, Arc<QueueStore>) {
        let registry = Arc::new(ExchangeRegistry::new());
        let bindings = Arc::new(BindingTable::new());
        let store = Arc::new(QueueStore::new(&cfg));
        let router = Router::new(
            Arc::clone(&registry),
            Arc::clone(&bindings),
            Arc::clone(&store),
        );
        (router, registry, bindings, store)
    }

    async fn router() -> (Router, Arc<ExchangeRegistry>, Arc<BindingTable>, Arc<QueueStore>) {
        router_with(BrokerConfig::default()).await
    }

    #[tokio::test]
    async fn test_route_to_unknown_exchange_fails() {
        let (router, _, _, _) = router().await;
        let err = router.route("nope", Message::from("x")).await.unwrap_err();
        assert_eq!(err.as_label(), "unknown_exchange");
    }

    #[tokio::test]
    async fn test_route_with_zero_bindings_succeeds() {
        let (router, registry, _, _) = router().await;
        registry.declare("logs", ExchangeKind::Fanout).await.unwrap();
        let delivered = router.route("logs", Message::from("x")).await.unwrap();
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_fanout_reaches_every_bound_queue() {
        let (router, registry, bindings, store) = router().await;
        registry.declare("logs", ExchangeKind::Fanout).await.unwrap();
        store.declare(Some("q1"), None).await;
        store.declare(Some("q2"), None).await;
        bindings.bind("logs", "q1", "").await;
        bindings.bind("logs", "q2", "").await;

        let delivered = router.route("logs", Message::from("hello")).await.unwrap();
        assert_eq!(delivered, 2);

        for name in ["q1", "q2"] {
            let slot = store.get(name).await.unwrap();
            assert_eq!(slot.buffer().pop().await.unwrap().payload, &b"hello"[..]);
        }
    }

    #[tokio::test]
    async fn test_routing_key_is_irrelevant_for_fanout() {
        let (router, registry, bindings, store) = router().await;
        registry.declare("logs", ExchangeKind::Fanout).await.unwrap();
        store.declare(Some("q1"), None).await;
        bindings.bind("logs", "q1", "bound-with-this").await;

        let a = router
            .route("logs", Message::from("m1").with_routing_key("key1"))
            .await
            .unwrap();
        let b = router
            .route("logs", Message::from("m2").with_routing_key("key2"))
            .await
            .unwrap();
        assert_eq!((a, b), (1, 1));

        let slot = store.get("q1").await.unwrap();
        assert_eq!(slot.buffer().len().await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_bindings_deliver_once() {
        let (router, registry, bindings, store) = router().await;
        registry.declare("logs", ExchangeKind::Fanout).await.unwrap();
        store.declare(Some("q1"), None).await;
        bindings.bind("logs", "q1", "").await;
        bindings.bind("logs", "q1", "").await;
        bindings.bind("logs", "q1", "another-key").await;

        let delivered = router.route("logs", Message::from("once")).await.unwrap();
        assert_eq!(delivered, 1);

        let slot = store.get("q1").await.unwrap();
        assert_eq!(slot.buffer().len().await, 1);
    }

    #[tokio::test]
    async fn test_bind_after_publish_does_not_receive() {
        let (router, registry, bindings, store) = router().await;
        registry.declare("logs", ExchangeKind::Fanout).await.unwrap();
        store.declare(Some("early"), None).await;
        store.declare(Some("late"), None).await;
        bindings.bind("logs", "early", "").await;

        router.route("logs", Message::from("first")).await.unwrap();
        bindings.bind("logs", "late", "").await;

        let late = store.get("late").await.unwrap();
        assert_eq!(late.buffer().len().await, 0);

        router.route("logs", Message::from("second")).await.unwrap();
        assert_eq!(late.buffer().len().await, 1);
    }

    #[tokio::test]
    async fn test_queue_destroyed_after_snapshot_is_skipped() {
        let (router, registry, bindings, store) = router().await;
        registry.declare("logs", ExchangeKind::Fanout).await.unwrap();
        store.declare(Some("gone"), None).await;
        store.declare(Some("alive"), None).await;
        bindings.bind("logs", "gone", "").await;
        bindings.bind("logs", "alive", "").await;

        // Destroy one destination before the publish resolves it.
        store.delete("gone").await;
        bindings.purge_queue("gone").await;

        let delivered = router.route("logs", Message::from("x")).await.unwrap();
        assert_eq!(delivered, 1);
    }

    #[tokio::test]
    async fn test_full_queue_does_not_stall_siblings() {
        let mut cfg = BrokerConfig::default();
        cfg.queue_capacity = 1;
        cfg.overflow = OverflowPolicy::Block;
        cfg.publish_timeout = Some(Duration::from_millis(30));

        let (router, registry, bindings, store) = router_with(cfg).await;
        registry.declare("logs", ExchangeKind::Fanout).await.unwrap();
        store.declare(Some("full"), None).await;
        store.declare(Some("free"), None).await;
        bindings.bind("logs", "full", "").await;
        bindings.bind("logs", "free", "").await;

        store.enqueue("full", Message::from("plug")).await.unwrap();

        // "full" times out, but "free" got its copy concurrently.
        let err = router.route("logs", Message::from("x")).await.unwrap_err();
        assert_eq!(err.as_label(), "buffer_overflow");

        let free = store.get("free").await.unwrap();
        assert_eq!(free.buffer().len().await, 1);
    }
}
