//! # Per-queue bounded FIFO buffer.
//!
//! `MessageBuffer` holds the undelivered messages of a single queue. Each
//! buffer synchronizes independently of every other queue, so fan-out to N
//! queues never contends on shared state.
//!
//! ## Wait/wake protocol
//! ```text
//! producers ── offer() ──► [VecDeque] ──► pop() ── consumers
//!                  │            ▲  │           ▲
//!                  │   vacancy  │  │  ready    │
//!                  └── notified ┘  └─ notify ──┘
//! ```
//! - `offer` appends and signals `ready` (one waiting consumer wakes).
//! - `pop` removes the head and signals `vacancy` (one blocked producer wakes).
//! - `close` cancels the token: blocked producers drop, waiting consumers
//!   observe end-of-queue. Locks are never held across an await.
//!
//! Auto-ack: a popped message is considered delivered regardless of what
//! the consumer does with it afterwards.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;

use crate::message::Message;
use crate::policies::OverflowPolicy;

/// Result of offering a message to a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EnqueueOutcome {
    /// The message was appended and counts as delivered to this queue.
    Appended,
    /// The message was discarded (buffer closed, or a lossy policy fired).
    Dropped,
    /// A blocking enqueue exhausted the configured publish timeout.
    TimedOut,
}

/// Bounded FIFO buffer with a configurable full-buffer policy.
#[derive(Debug)]
pub(crate) struct MessageBuffer {
    inner: Mutex<VecDeque<Message>>,
    capacity: usize,
    policy: OverflowPolicy,
    wait_bound: Option<Duration>,
    ready: Notify,
    vacancy: Notify,
    closed: CancellationToken,
}

impl MessageBuffer {
    pub(crate) fn new(
        capacity: usize,
        policy: OverflowPolicy,
        wait_bound: Option<Duration>,
    ) -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            policy,
            wait_bound,
            ready: Notify::new(),
            vacancy: Notify::new(),
            closed: CancellationToken::new(),
        }
    }

    /// Offers a message, applying the buffer's overflow policy when full.
    ///
    /// Under `Block` with a configured wait bound the whole attempt is
    /// capped; elapsing yields [`EnqueueOutcome::TimedOut`].
    pub(crate) async fn offer(&self, msg: Message) -> EnqueueOutcome {
        match (self.policy, self.wait_bound) {
            (OverflowPolicy::Block, Some(bound)) => {
                match tokio::time::timeout(bound, self.push(msg)).await {
                    Ok(outcome) => outcome,
                    Err(_) => EnqueueOutcome::TimedOut,
                }
            }
            _ => self.push(msg).await,
        }
    }

    async fn push(&self, msg: Message) -> EnqueueOutcome {
        loop {
            let vacancy = self.vacancy.notified();
            {
                let mut buf = self.inner.lock().await;
                if self.closed.is_cancelled() {
                    return EnqueueOutcome::Dropped;
                }
                if buf.len() < self.capacity {
                    buf.push_back(msg);
                    self.ready.notify_one();
                    return EnqueueOutcome::Appended;
                }
                match self.policy {
                    OverflowPolicy::DropNewest => return EnqueueOutcome::Dropped,
                    OverflowPolicy::DropOldest => {
                        buf.pop_front();
                        buf.push_back(msg);
                        self.ready.notify_one();
                        return EnqueueOutcome::Appended;
                    }
                    OverflowPolicy::Block => {}
                }
            }

            tokio::select! {
                _ = vacancy => {}
                _ = self.closed.cancelled() => return EnqueueOutcome::Dropped,
            }
        }
    }

    /// Pops the head message, waiting until one is available.
    ///
    /// Returns `None` once the buffer is closed. A message returned from
    /// here is delivered (auto-ack) — it will not be observed again.
    pub(crate) async fn pop(&self) -> Option<Message> {
        loop {
            let ready = self.ready.notified();
            if let Some(msg) = self.try_pop().await {
                return Some(msg);
            }
            if self.closed.is_cancelled() {
                return None;
            }

            tokio::select! {
                _ = ready => {}
                _ = self.closed.cancelled() => return None,
            }
        }
    }

    /// Pops the head message if one is buffered.
    pub(crate) async fn try_pop(&self) -> Option<Message> {
        let msg = self.inner.lock().await.pop_front();
        if msg.is_some() {
            self.vacancy.notify_one();
        }
        msg
    }

    /// Number of buffered (undelivered) messages.
    pub(crate) async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Closes the buffer: blocked producers drop their message, waiting
    /// consumers observe end-of-queue. Undelivered messages are discarded.
    pub(crate) async fn close(&self) {
        self.closed.cancel();
        self.inner.lock().await.clear();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn msg(text: &str) -> Message {
        Message::from(text)
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let buf = MessageBuffer::new(8, OverflowPolicy::Block, None);
        buf.offer(msg("a")).await;
        buf.offer(msg("b")).await;
        buf.offer(msg("c")).await;

        assert_eq!(buf.pop().await.unwrap().payload, &b"a"[..]);
        assert_eq!(buf.pop().await.unwrap().payload, &b"b"[..]);
        assert_eq!(buf.pop().await.unwrap().payload, &b"c"[..]);
        assert_eq!(buf.len().await, 0);
    }

    #[tokio::test]
    async fn test_drop_newest_keeps_oldest() {
        let buf = MessageBuffer::new(2, OverflowPolicy::DropNewest, None);
        assert_eq!(buf.offer(msg("a")).await, EnqueueOutcome::Appended);
        assert_eq!(buf.offer(msg("b")).await, EnqueueOutcome::Appended);
        assert_eq!(buf.offer(msg("c")).await, EnqueueOutcome::Dropped);

        assert_eq!(buf.pop().await.unwrap().payload, &b"a"[..]);
        assert_eq!(buf.pop().await.unwrap().payload, &b"b"[..]);
    }

    #[tokio::test]
    async fn test_drop_oldest_keeps_newest() {
        let buf = MessageBuffer::new(2, OverflowPolicy::DropOldest, None);
        buf.offer(msg("a")).await;
        buf.offer(msg("b")).await;
        assert_eq!(buf.offer(msg("c")).await, EnqueueOutcome::Appended);

        assert_eq!(buf.pop().await.unwrap().payload, &b"b"[..]);
        assert_eq!(buf.pop().await.unwrap().payload, &b"c"[..]);
    }

    #[tokio::test]
    async fn test_block_waits_for_vacancy() {
        let buf = Arc::new(MessageBuffer::new(1, OverflowPolicy::Block, None));
        buf.offer(msg("a")).await;

        let producer = {
            let buf = Arc::clone(&buf);
            tokio::spawn(async move { buf.offer(msg("b")).await })
        };

        // The producer cannot finish until the head is popped.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!producer.is_finished());

        assert_eq!(buf.pop().await.unwrap().payload, &b"a"[..]);
        assert_eq!(producer.await.unwrap(), EnqueueOutcome::Appended);
        assert_eq!(buf.pop().await.unwrap().payload, &b"b"[..]);
    }

    #[tokio::test]
    async fn test_block_times_out() {
        let bound = Some(Duration::from_millis(20));
        let buf = MessageBuffer::new(1, OverflowPolicy::Block, bound);
        buf.offer(msg("a")).await;
        assert_eq!(buf.offer(msg("b")).await, EnqueueOutcome::TimedOut);
        // The original head is untouched.
        assert_eq!(buf.pop().await.unwrap().payload, &b"a"[..]);
    }

    #[tokio::test]
    async fn test_close_wakes_blocked_producer() {
        let buf = Arc::new(MessageBuffer::new(1, OverflowPolicy::Block, None));
        buf.offer(msg("a")).await;

        let producer = {
            let buf = Arc::clone(&buf);
            tokio::spawn(async move { buf.offer(msg("b")).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        buf.close().await;

        assert_eq!(producer.await.unwrap(), EnqueueOutcome::Dropped);
        assert!(buf.is_closed());
    }

    #[tokio::test]
    async fn test_close_wakes_waiting_consumer() {
        let buf = Arc::new(MessageBuffer::new(1, OverflowPolicy::Block, None));

        let consumer = {
            let buf = Arc::clone(&buf);
            tokio::spawn(async move { buf.pop().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        buf.close().await;

        assert_eq!(consumer.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_offer_after_close_drops() {
        let buf = MessageBuffer::new(4, OverflowPolicy::Block, None);
        buf.close().await;
        assert_eq!(buf.offer(msg("late")).await, EnqueueOutcome::Dropped);
        assert_eq!(buf.pop().await, None);
    }
}
