//! Consumer handle: the pull side of one queue attachment.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::delivery::ConnectionId;
use crate::message::Message;
use crate::queues::QueueSlot;

/// Observable state of a consumer attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryState {
    /// Attached, buffer empty: waiting for a message.
    Idle,
    /// Attached, buffer non-empty: messages are being handed over.
    Delivering,
    /// Terminal: detached, disconnected, or the queue was destroyed.
    Detached,
}

/// Handle to one consumer attachment on one queue.
///
/// Messages arrive in FIFO order within the queue and are auto-acked: a
/// message returned from [`ConsumerHandle::recv`] is delivered and will
/// never be observed again, whatever the consumer does with it.
///
/// Dropping a handle does **not** release the attachment — call
/// [`DeliveryManager::detach`](crate::DeliveryManager::detach), or rely on
/// the transport's [`disconnect`](crate::DeliveryManager::disconnect)
/// contract for lost clients.
pub struct ConsumerHandle {
    conn: ConnectionId,
    queue: String,
    tag: u64,
    slot: Arc<QueueSlot>,
    detached: CancellationToken,
}

impl ConsumerHandle {
    pub(crate) fn new(
        conn: ConnectionId,
        queue: String,
        tag: u64,
        slot: Arc<QueueSlot>,
        detached: CancellationToken,
    ) -> Self {
        Self {
            conn,
            queue,
            tag,
            slot,
            detached,
        }
    }

    /// The connection that owns this attachment.
    #[must_use]
    pub fn connection(&self) -> &ConnectionId {
        &self.conn
    }

    /// The queue this attachment consumes from.
    #[must_use]
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Broker-unique consumer tag.
    #[must_use]
    pub fn tag(&self) -> u64 {
        self.tag
    }

    /// Receives the next message, waiting until one is buffered.
    ///
    /// Returns `None` once the attachment is detached or the queue has
    /// been destroyed; undelivered messages of a destroyed queue are
    /// discarded, never redelivered.
    pub async fn recv(&mut self) -> Option<Message> {
        tokio::select! {
            _ = self.detached.cancelled() => None,
            msg = self.slot.buffer().pop() => msg,
        }
    }

    /// Receives the next message only if one is already buffered.
    pub async fn try_recv(&mut self) -> Option<Message> {
        if self.detached.is_cancelled() {
            return None;
        }
        self.slot.buffer().try_pop().await
    }

    /// Current state of the attachment.
    pub async fn state(&self) -> DeliveryState {
        if self.detached.is_cancelled() || self.slot.buffer().is_closed() {
            return DeliveryState::Detached;
        }
        if self.slot.buffer().len().await == 0 {
            DeliveryState::Idle
        } else {
            DeliveryState::Delivering
        }
    }

    pub(crate) fn detach_token(&self) -> &CancellationToken {
        &self.detached
    }
}
