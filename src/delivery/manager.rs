//! # Delivery manager - attachment bookkeeping and detach cascades.
//!
//! The manager is the only component that mutates queue lifecycle as a
//! side effect of consumer lifecycle: detaching the last consumer of an
//! auto-delete queue destroys the queue *and* purges its bindings in the
//! same logical operation, so the routing snapshot never sees an orphaned
//! binding.
//!
//! ## Architecture
//! ```text
//!  transport ── attach(conn, queue) ──► ConsumerHandle (recv loop)
//!            ── spawn(handle, consumer) ──► worker ── on_message()
//!            ── detach(&handle) ─┐
//!            ── disconnect(conn) ┴──► QueueStore.detach ──► auto-delete?
//!                                            │                  │
//!                                            ▼                  ▼
//!                                        tag removed    BindingTable.purge_queue
//! ```
//!
//! ## Rules
//! - Every attachment is owned by a [`ConnectionId`]; `disconnect` must be
//!   called by the transport when a client is lost (prevents leaks).
//! - Detach is idempotent, including against concurrent queue destruction.
//! - A message already handed to a consumer when it detaches stays
//!   delivered; undelivered messages remain for plain queues and are
//!   discarded with destroyed auto-delete queues.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bindings::BindingTable;
use crate::delivery::{ConnectionId, Consume, ConsumerHandle};
use crate::error::Result;
use crate::queues::{DetachOutcome, QueueStore};

/// Registry entry for one live attachment.
struct Attachment {
    queue: String,
    tag: u64,
    detached: CancellationToken,
}

/// Tracks consumer attachments per connection and runs detach cascades.
pub struct DeliveryManager {
    store: Arc<QueueStore>,
    bindings: Arc<BindingTable>,
    attachments: Mutex<HashMap<ConnectionId, Vec<Attachment>>>,
}

impl DeliveryManager {
    /// Creates a manager operating on the given store and binding table.
    pub fn new(store: Arc<QueueStore>, bindings: Arc<BindingTable>) -> Self {
        Self {
            store,
            bindings,
            attachments: Mutex::new(HashMap::new()),
        }
    }

    /// Attaches `conn` as a consumer of `queue`.
    ///
    /// Fails with [`QueueNotFound`](crate::BrokerError::QueueNotFound) or
    /// [`ExclusiveQueueBusy`](crate::BrokerError::ExclusiveQueueBusy).
    pub async fn attach(&self, conn: &ConnectionId, queue: &str) -> Result<ConsumerHandle> {
        let (slot, tag) = self.store.attach(queue).await?;
        let detached = CancellationToken::new();

        let mut attachments = self.attachments.lock().await;
        attachments.entry(conn.clone()).or_default().push(Attachment {
            queue: queue.to_string(),
            tag,
            detached: detached.clone(),
        });
        drop(attachments);

        tracing::debug!(%conn, queue, tag, "consumer attached");
        Ok(ConsumerHandle::new(
            conn.clone(),
            queue.to_string(),
            tag,
            slot,
            detached,
        ))
    }

    /// Detaches one attachment. Idempotent.
    ///
    /// Runs the auto-delete cascade when this was the queue's last
    /// consumer: queue destroyed, buffer closed, bindings purged.
    pub async fn detach(&self, handle: &ConsumerHandle) {
        if handle.detach_token().is_cancelled() {
            return;
        }
        handle.detach_token().cancel();

        let conn = handle.connection().clone();
        let mut attachments = self.attachments.lock().await;
        if let Some(owned) = attachments.get_mut(&conn) {
            owned.retain(|a| a.tag != handle.tag());
            if owned.is_empty() {
                attachments.remove(&conn);
            }
        }
        drop(attachments);

        self.release(handle.queue(), handle.tag()).await;
        tracing::debug!(%conn, queue = handle.queue(), tag = handle.tag(), "consumer detached");
    }

    /// Detaches every attachment owned by `conn`; returns how many.
    ///
    /// The transport layer must call this when a connection is lost so no
    /// attachment (or exclusive-queue claim) leaks.
    pub async fn disconnect(&self, conn: &ConnectionId) -> usize {
        let owned = self.attachments.lock().await.remove(conn).unwrap_or_default();
        let count = owned.len();
        for attachment in owned {
            attachment.detached.cancel();
            self.release(&attachment.queue, attachment.tag).await;
        }
        if count > 0 {
            tracing::debug!(%conn, count, "connection detached");
        }
        count
    }

    /// Spawns a worker that pulls from `handle` and invokes `consumer`.
    ///
    /// The worker exits when the attachment detaches or its queue is
    /// destroyed. Consumer panics are caught and logged (isolation); the
    /// panicking message is already delivered and is not retried.
    pub fn spawn(&self, mut handle: ConsumerHandle, consumer: Arc<dyn Consume>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(msg) = handle.recv().await {
                let fut = consumer.on_message(msg);
                if std::panic::AssertUnwindSafe(fut).catch_unwind().await.is_err() {
                    tracing::warn!(
                        consumer = consumer.name(),
                        queue = handle.queue(),
                        "consumer panicked; message counts as delivered"
                    );
                }
            }
        })
    }

    /// Number of live attachments across all connections.
    pub async fn len(&self) -> usize {
        let attachments = self.attachments.lock().await;
        attachments.values().map(Vec::len).sum()
    }

    /// True if no attachments exist.
    pub async fn is_empty(&self) -> bool {
        self.attachments.lock().await.is_empty()
    }

    async fn release(&self, queue: &str, tag: u64) {
        if self.store.detach(queue, tag).await == DetachOutcome::Destroyed {
            self.bindings.purge_queue(queue).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrokerConfig;
    use crate::delivery::DeliveryState;
    use crate::message::Message;
    use crate::queues::QueueOptions;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn manager() -> (DeliveryManager, Arc<QueueStore>, Arc<BindingTable>) {
        let store = Arc::new(QueueStore::new(&BrokerConfig::default()));
        let bindings = Arc::new(BindingTable::new());
        (
            DeliveryManager::new(Arc::clone(&store), Arc::clone(&bindings)),
            store,
            bindings,
        )
    }

    #[tokio::test]
    async fn test_recv_in_fifo_order() {
        let (manager, store, _) = manager();
        store.declare(Some("q"), None).await;
        store.enqueue("q", Message::from("1")).await.unwrap();
        store.enqueue("q", Message::from("2")).await.unwrap();

        let mut handle = manager.attach(&"c1".into(), "q").await.unwrap();
        assert_eq!(handle.recv().await.unwrap().payload, &b"1"[..]);
        assert_eq!(handle.recv().await.unwrap().payload, &b"2"[..]);
        assert_eq!(handle.try_recv().await, None);
    }

    #[tokio::test]
    async fn test_state_machine_transitions() {
        let (manager, store, _) = manager();
        store.declare(Some("q"), None).await;
        let mut handle = manager.attach(&"c1".into(), "q").await.unwrap();
        assert_eq!(handle.state().await, DeliveryState::Idle);

        store.enqueue("q", Message::from("x")).await.unwrap();
        assert_eq!(handle.state().await, DeliveryState::Delivering);

        handle.recv().await.unwrap();
        assert_eq!(handle.state().await, DeliveryState::Idle);

        manager.detach(&handle).await;
        assert_eq!(handle.state().await, DeliveryState::Detached);
        assert_eq!(handle.recv().await, None);
    }

    #[tokio::test]
    async fn test_detach_is_idempotent() {
        let (manager, store, _) = manager();
        store.declare(Some("q"), None).await;
        let handle = manager.attach(&"c1".into(), "q").await.unwrap();

        manager.detach(&handle).await;
        manager.detach(&handle).await;
        assert!(manager.is_empty().await);
        assert!(store.contains("q").await);
    }

    #[tokio::test]
    async fn test_detach_cascade_purges_bindings() {
        let (manager, store, bindings) = manager();
        let opts = QueueOptions {
            auto_delete: true,
            ..QueueOptions::default()
        };
        store.declare(Some("tmp"), Some(opts)).await;
        bindings.bind("logs", "tmp", "").await;

        let handle = manager.attach(&"c1".into(), "tmp").await.unwrap();
        manager.detach(&handle).await;

        assert!(!store.contains("tmp").await);
        assert!(bindings.is_empty().await);
    }

    #[tokio::test]
    async fn test_disconnect_releases_every_attachment() {
        let (manager, store, bindings) = manager();
        let opts = QueueOptions {
            auto_delete: true,
            ..QueueOptions::default()
        };
        store.declare(Some("a"), Some(opts)).await;
        store.declare(Some("b"), Some(opts)).await;
        bindings.bind("logs", "a", "").await;
        bindings.bind("logs", "b", "").await;

        let conn: ConnectionId = "client-7".into();
        let mut ha = manager.attach(&conn, "a").await.unwrap();
        let _hb = manager.attach(&conn, "b").await.unwrap();

        assert_eq!(manager.disconnect(&conn).await, 2);
        assert_eq!(manager.disconnect(&conn).await, 0);
        assert!(store.is_empty().await);
        assert!(bindings.is_empty().await);
        assert_eq!(ha.recv().await, None);
    }

    #[tokio::test]
    async fn test_spawned_worker_delivers_and_survives_panic() {
        struct Recorder {
            tx: mpsc::UnboundedSender<Vec<u8>>,
        }

        #[async_trait::async_trait]
        impl Consume for Recorder {
            async fn on_message(&self, msg: Message) {
                if msg.payload == &b"boom"[..] {
                    panic!("consumer bug");
                }
                let _ = self.tx.send(msg.payload.to_vec());
            }
            fn name(&self) -> &'static str {
                "recorder"
            }
        }

        let (manager, store, _) = manager();
        store.declare(Some("q"), None).await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = manager.attach(&"c1".into(), "q").await.unwrap();
        let worker = manager.spawn(handle, Arc::new(Recorder { tx }));

        store.enqueue("q", Message::from("one")).await.unwrap();
        store.enqueue("q", Message::from("boom")).await.unwrap();
        store.enqueue("q", Message::from("two")).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), b"one");
        // "boom" panicked the consumer but the worker keeps going.
        assert_eq!(rx.recv().await.unwrap(), b"two");

        store.delete("q").await;
        tokio::time::timeout(Duration::from_secs(1), worker)
            .await
            .expect("worker exits once the queue is destroyed")
            .unwrap();
    }
}
