//! # Queue store - declaration, enqueue, and consumer attachment.
//!
//! The store owns the name → queue map. Queues are created on demand by
//! consumers and destroyed either explicitly or by the auto-delete cascade
//! when the last consumer detaches.
//!
//! ## Rules
//! - Declaring without a name yields a server-generated unique name
//!   (`gen-<token>`), collision-checked under the store's write lock.
//! - Redeclaring an existing name returns the existing descriptor
//!   unchanged (idempotent; original flags kept).
//! - Enqueue onto a missing or concurrently-destroyed queue is a silent
//!   best-effort drop — publish is decoupled from queue existence.
//! - Binding cleanup for a destroyed queue belongs to the caller, in the
//!   same logical operation as the destruction.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;

use rand::distr::Alphanumeric;
use rand::Rng;
use tokio::sync::{Mutex, RwLock};

use crate::config::BrokerConfig;
use crate::error::{BrokerError, Result};
use crate::message::Message;
use crate::policies::OverflowPolicy;
use crate::queues::buffer::{EnqueueOutcome, MessageBuffer};
use crate::queues::{QueueInfo, QueueOptions};

/// Length of the random token in server-generated queue names.
const GENERATED_TOKEN_LEN: usize = 12;

/// A live queue: descriptor, buffer, and attached consumer tags.
#[derive(Debug)]
pub(crate) struct QueueSlot {
    info: QueueInfo,
    buffer: MessageBuffer,
    consumers: Mutex<HashSet<u64>>,
}

impl QueueSlot {
    pub(crate) fn info(&self) -> &QueueInfo {
        &self.info
    }

    pub(crate) fn buffer(&self) -> &MessageBuffer {
        &self.buffer
    }
}

/// Result of detaching a consumer tag from a queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DetachOutcome {
    /// The tag was not attached (or the queue is already gone).
    NotAttached,
    /// The consumer detached; the queue lives on.
    Detached,
    /// The consumer was the last one on an auto-delete queue: the queue
    /// was destroyed and its buffer closed. The caller purges bindings.
    Destroyed,
}

/// Concurrent store of live queues, keyed by name.
pub struct QueueStore {
    queues: RwLock<HashMap<String, Arc<QueueSlot>>>,
    capacity: usize,
    policy: OverflowPolicy,
    wait_bound: Option<Duration>,
    server_named: QueueOptions,
    next_tag: AtomicU64,
}

impl QueueStore {
    /// Creates an empty store configured from `cfg`.
    #[must_use]
    pub fn new(cfg: &BrokerConfig) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            capacity: cfg.queue_capacity,
            policy: cfg.overflow,
            wait_bound: cfg.publish_timeout,
            server_named: QueueOptions {
                exclusive: cfg.server_named_exclusive,
                auto_delete: cfg.server_named_auto_delete,
                durable: false,
            },
            next_tag: AtomicU64::new(0),
        }
    }

    /// Declares a queue, creating it if absent.
    ///
    /// With `name` absent or empty, a unique server-generated name is
    /// assigned and `opts` defaults to the configured server-named flags.
    /// Redeclaring an existing name returns its descriptor unchanged.
    pub async fn declare(&self, name: Option<&str>, opts: Option<QueueOptions>) -> QueueInfo {
        let requested = name.filter(|n| !n.is_empty());
        let mut queues = self.queues.write().await;

        if let Some(n) = requested {
            if let Some(slot) = queues.get(n) {
                return slot.info.clone();
            }
        }

        let name = match requested {
            Some(n) => n.to_string(),
            None => Self::generate_name(&queues),
        };
        let opts = opts.unwrap_or(if requested.is_none() {
            self.server_named
        } else {
            QueueOptions::default()
        });

        let info = QueueInfo::new(&name, opts);
        let slot = Arc::new(QueueSlot {
            info: info.clone(),
            buffer: MessageBuffer::new(self.capacity, self.policy, self.wait_bound),
            consumers: Mutex::new(HashSet::new()),
        });
        queues.insert(name.clone(), slot);
        tracing::debug!(
            queue = %name,
            exclusive = opts.exclusive,
            auto_delete = opts.auto_delete,
            "queue declared"
        );
        info
    }

    /// Appends a message to the named queue's buffer.
    ///
    /// Returns `Ok(true)` when appended, `Ok(false)` when the queue does
    /// not exist or the overflow policy dropped the message. A blocking
    /// enqueue that exhausts the publish timeout is the one enqueue
    /// failure surfaced to the producer.
    pub async fn enqueue(&self, name: &str, msg: Message) -> Result<bool> {
        let Some(slot) = self.get(name).await else {
            return Ok(false);
        };
        self.enqueue_slot(&slot, msg).await
    }

    /// Enqueue against an already-resolved slot (the router's fan-out path).
    pub(crate) async fn enqueue_slot(&self, slot: &QueueSlot, msg: Message) -> Result<bool> {
        match slot.buffer.offer(msg).await {
            EnqueueOutcome::Appended => Ok(true),
            EnqueueOutcome::Dropped => {
                if !slot.buffer.is_closed() {
                    tracing::warn!(
                        queue = slot.info.name(),
                        policy = self.policy.as_label(),
                        "message dropped: buffer full"
                    );
                }
                Ok(false)
            }
            EnqueueOutcome::TimedOut => Err(BrokerError::BufferOverflow {
                queue: slot.info.name().to_string(),
                waited: self.wait_bound.unwrap_or_default(),
            }),
        }
    }

    /// Resolves a live queue slot by name.
    pub(crate) async fn get(&self, name: &str) -> Option<Arc<QueueSlot>> {
        self.queues.read().await.get(name).cloned()
    }

    /// Resolves many slots in one pass over the map (routing snapshot).
    pub(crate) async fn resolve(&self, names: &[String]) -> Vec<Arc<QueueSlot>> {
        let queues = self.queues.read().await;
        names
            .iter()
            .filter_map(|name| queues.get(name).cloned())
            .collect()
    }

    /// Attaches a consumer to the named queue.
    ///
    /// Fails with [`BrokerError::QueueNotFound`] if the queue is absent and
    /// [`BrokerError::ExclusiveQueueBusy`] if the queue is exclusive and
    /// already consumed. Returns the slot and a store-unique consumer tag.
    pub(crate) async fn attach(&self, name: &str) -> Result<(Arc<QueueSlot>, u64)> {
        let slot = self
            .get(name)
            .await
            .ok_or_else(|| BrokerError::QueueNotFound {
                name: name.to_string(),
            })?;

        let mut consumers = slot.consumers.lock().await;
        // The queue may have been destroyed between resolution and here.
        if slot.buffer.is_closed() {
            return Err(BrokerError::QueueNotFound {
                name: name.to_string(),
            });
        }
        if slot.info.exclusive() && !consumers.is_empty() {
            return Err(BrokerError::ExclusiveQueueBusy {
                name: name.to_string(),
            });
        }

        let tag = self.next_tag.fetch_add(1, AtomicOrdering::Relaxed);
        consumers.insert(tag);
        drop(consumers);
        Ok((slot, tag))
    }

    /// Detaches a consumer tag.
    ///
    /// Destroys the queue when the tag was the last consumer of an
    /// auto-delete queue; the caller purges bindings on
    /// [`DetachOutcome::Destroyed`]. Idempotent against repeated detach and
    /// against concurrent queue destruction.
    pub(crate) async fn detach(&self, name: &str, tag: u64) -> DetachOutcome {
        let mut queues = self.queues.write().await;
        let Some(slot) = queues.get(name).cloned() else {
            return DetachOutcome::NotAttached;
        };

        let mut consumers = slot.consumers.lock().await;
        if !consumers.remove(&tag) {
            return DetachOutcome::NotAttached;
        }
        if slot.info.auto_delete() && consumers.is_empty() {
            drop(consumers);
            queues.remove(name);
            drop(queues);
            slot.buffer.close().await;
            tracing::debug!(queue = name, "auto-delete queue destroyed");
            return DetachOutcome::Destroyed;
        }
        DetachOutcome::Detached
    }

    /// Explicitly destroys a queue; returns whether it existed.
    ///
    /// Closes the buffer, waking blocked producers and attached consumers.
    /// The caller purges bindings as part of the same logical operation.
    pub async fn delete(&self, name: &str) -> bool {
        let slot = self.queues.write().await.remove(name);
        match slot {
            Some(slot) => {
                slot.buffer.close().await;
                tracing::debug!(queue = name, "queue deleted");
                true
            }
            None => false,
        }
    }

    /// True if the queue currently exists.
    pub async fn contains(&self, name: &str) -> bool {
        self.queues.read().await.contains_key(name)
    }

    /// Returns sorted list of live queue names.
    pub async fn list(&self) -> Vec<String> {
        let queues = self.queues.read().await;
        let mut names: Vec<String> = queues.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of live queues.
    pub async fn len(&self) -> usize {
        self.queues.read().await.len()
    }

    /// True if no queues exist.
    pub async fn is_empty(&self) -> bool {
        self.queues.read().await.is_empty()
    }

    fn generate_name(existing: &HashMap<String, Arc<QueueSlot>>) -> String {
        loop {
            let token: String = rand::rng()
                .sample_iter(Alphanumeric)
                .take(GENERATED_TOKEN_LEN)
                .map(char::from)
                .collect();
            let name = format!("gen-{token}");
            if !existing.contains_key(&name) {
                return name;
            }
        }
    }
}
