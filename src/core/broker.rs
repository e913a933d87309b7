//! # Broker: the owning context object for one routing core instance.
//!
//! A [`Broker`] owns the exchange registry, queue store, binding table,
//! router, and delivery manager as one lifecycle-scoped unit. Nothing is
//! global: independent brokers coexist in one process (the test suite
//! relies on this), and dropping the last handle drops all broker state.
//!
//! ## High-level architecture
//! ```text
//! Transport calls:
//!   declare_exchange / delete_exchange ──► ExchangeRegistry ──┐
//!   declare_queue / delete_queue ───────► QueueStore          │ cascades:
//!   bind / unbind ──────────────────────► BindingTable ◄──────┘ endpoint
//!                                                               death purges
//!   publish(exchange, message)                                  bindings
//!       └─► Router: lookup ─► snapshot bound queues ─► fan-out
//!                 one copy per queue, no shared lock held
//!
//!   consume(conn, queue) ──► DeliveryManager ──► ConsumerHandle (recv)
//!   consume_with(..)     ──► worker task ──► Consume::on_message
//!   disconnect(conn)     ──► detach all ──► auto-delete cascade
//! ```
//!
//! All cross-component cascades (exchange deleted → bindings purged, queue
//! destroyed → bindings purged) run inside the broker so callers cannot
//! observe orphaned bindings.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::bindings::BindingTable;
use crate::config::BrokerConfig;
use crate::core::Router;
use crate::delivery::{ConnectionId, Consume, ConsumerHandle, DeliveryManager};
use crate::error::{BrokerError, Result};
use crate::exchanges::{Exchange, ExchangeKind, ExchangeRegistry};
use crate::message::Message;
use crate::queues::{QueueInfo, QueueOptions, QueueStore};

/// One broker instance. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Broker {
    inner: Arc<BrokerInner>,
}

struct BrokerInner {
    cfg: BrokerConfig,
    registry: Arc<ExchangeRegistry>,
    store: Arc<QueueStore>,
    bindings: Arc<BindingTable>,
    router: Router,
    delivery: DeliveryManager,
}

/// Point-in-time counters for one broker instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrokerStats {
    /// Declared exchanges.
    pub exchanges: usize,
    /// Live queues.
    pub queues: usize,
    /// Bindings across all exchanges.
    pub bindings: usize,
    /// Live consumer attachments.
    pub consumers: usize,
}

impl Broker {
    /// Creates a broker with the given configuration.
    #[must_use]
    pub fn new(cfg: BrokerConfig) -> Self {
        let registry = Arc::new(ExchangeRegistry::new());
        let store = Arc::new(QueueStore::new(&cfg));
        let bindings = Arc::new(BindingTable::new());
        let router = Router::new(
            Arc::clone(&registry),
            Arc::clone(&bindings),
            Arc::clone(&store),
        );
        let delivery = DeliveryManager::new(Arc::clone(&store), Arc::clone(&bindings));

        Self {
            inner: Arc::new(BrokerInner {
                cfg,
                registry,
                store,
                bindings,
                router,
                delivery,
            }),
        }
    }

    /// The configuration this broker was built with.
    #[must_use]
    pub fn config(&self) -> &BrokerConfig {
        &self.inner.cfg
    }

    // ---------------------------
    // Exchanges
    // ---------------------------

    /// Declares an exchange; idempotent for a matching kind, fails with
    /// [`BrokerError::ExchangeConflict`] on a kind mismatch.
    pub async fn declare_exchange(&self, name: &str, kind: ExchangeKind) -> Result<Exchange> {
        self.inner.registry.declare(name, kind).await
    }

    /// Deletes an exchange and all bindings referencing it; returns
    /// whether the exchange existed.
    pub async fn delete_exchange(&self, name: &str) -> bool {
        let existed = self.inner.registry.delete(name).await;
        if existed {
            self.inner.bindings.purge_exchange(name).await;
        }
        existed
    }

    // ---------------------------
    // Queues
    // ---------------------------

    /// Declares a queue.
    ///
    /// With `name` absent or empty a unique server-generated name is
    /// assigned; its flags default to the configured server-named flags
    /// when `opts` is `None`. Redeclaring an existing queue returns its
    /// descriptor unchanged.
    pub async fn declare_queue(
        &self,
        name: Option<&str>,
        opts: Option<QueueOptions>,
    ) -> QueueInfo {
        self.inner.store.declare(name, opts).await
    }

    /// Destroys a queue and all bindings referencing it; returns whether
    /// the queue existed. Attached consumers observe end-of-queue.
    pub async fn delete_queue(&self, name: &str) -> bool {
        let existed = self.inner.store.delete(name).await;
        if existed {
            self.inner.bindings.purge_queue(name).await;
        }
        existed
    }

    // ---------------------------
    // Bindings
    // ---------------------------

    /// Binds a queue to an exchange under a routing key (wildcard for
    /// fanout). Idempotent on duplicates.
    ///
    /// # Errors
    /// [`BrokerError::UnknownExchange`] / [`BrokerError::QueueNotFound`]
    /// when an endpoint does not currently exist.
    pub async fn bind(&self, exchange: &str, queue: &str, routing_key: &str) -> Result<()> {
        if !self.inner.registry.contains(exchange).await {
            return Err(BrokerError::UnknownExchange {
                name: exchange.to_string(),
            });
        }
        if !self.inner.store.contains(queue).await {
            return Err(BrokerError::QueueNotFound {
                name: queue.to_string(),
            });
        }
        self.inner.bindings.bind(exchange, queue, routing_key).await;

        // An endpoint may have died between validation and insertion;
        // re-check so the no-orphaned-bindings invariant holds.
        if !self.inner.store.contains(queue).await {
            self.inner.bindings.purge_queue(queue).await;
        }
        if !self.inner.registry.contains(exchange).await {
            self.inner.bindings.purge_exchange(exchange).await;
        }
        Ok(())
    }

    /// Removes a binding; no-op if it does not exist.
    pub async fn unbind(&self, exchange: &str, queue: &str, routing_key: &str) {
        self.inner.bindings.unbind(exchange, queue, routing_key).await;
    }

    // ---------------------------
    // Publish / consume
    // ---------------------------

    /// Publishes a message to an exchange.
    ///
    /// Returns the number of queues the message reached; `0` means no
    /// subscriber was listening, which is a success, not an error.
    pub async fn publish(&self, exchange: &str, message: Message) -> Result<usize> {
        self.inner.router.route(exchange, message).await
    }

    /// Attaches `conn` as a consumer of `queue`, returning the pull-side
    /// handle.
    pub async fn consume(&self, conn: &ConnectionId, queue: &str) -> Result<ConsumerHandle> {
        self.inner.delivery.attach(conn, queue).await
    }

    /// Attaches `conn` to `queue` and drives `consumer` from a worker
    /// task (push style). The worker exits when the attachment detaches
    /// or the queue is destroyed.
    pub async fn consume_with(
        &self,
        conn: &ConnectionId,
        queue: &str,
        consumer: Arc<dyn Consume>,
    ) -> Result<JoinHandle<()>> {
        let handle = self.inner.delivery.attach(conn, queue).await?;
        Ok(self.inner.delivery.spawn(handle, consumer))
    }

    /// Detaches one consumer attachment; idempotent.
    pub async fn detach(&self, handle: &ConsumerHandle) {
        self.inner.delivery.detach(handle).await;
    }

    /// Detaches every attachment owned by `conn`; returns how many.
    ///
    /// The transport layer must call this when it loses a connection.
    pub async fn disconnect(&self, conn: &ConnectionId) -> usize {
        self.inner.delivery.disconnect(conn).await
    }

    // ---------------------------
    // Introspection
    // ---------------------------

    /// Point-in-time counters (exchanges, queues, bindings, consumers).
    pub async fn stats(&self) -> BrokerStats {
        BrokerStats {
            exchanges: self.inner.registry.len().await,
            queues: self.inner.store.len().await,
            bindings: self.inner.bindings.len().await,
            consumers: self.inner.delivery.len().await,
        }
    }

    /// Sorted names of declared exchanges.
    pub async fn exchanges(&self) -> Vec<String> {
        self.inner.registry.list().await
    }

    /// Sorted names of live queues.
    pub async fn queues(&self) -> Vec<String> {
        self.inner.store.list().await
    }
}
