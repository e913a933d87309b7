//! # Push-style consumer trait.
//!
//! `Consume` is the extension point for callback-driven consumption: the
//! [`DeliveryManager`](crate::DeliveryManager) spawns a worker per
//! attachment that pulls from the queue and invokes the consumer, so slow
//! or panicking consumers never block the routing path or each other.
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching) — back-pressure is local
//!   to their own queue buffer.
//! - Panics are caught by the worker and logged; the message that caused
//!   the panic is already delivered (auto-ack) and is not retried.
//!
//! ## Example (skeleton)
//! ```rust
//! use async_trait::async_trait;
//! use fanoutmq::{Consume, Message};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl Consume for Printer {
//!     async fn on_message(&self, msg: Message) {
//!         println!("got {} bytes", msg.len());
//!     }
//!     fn name(&self) -> &'static str {
//!         "printer"
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::message::Message;

/// Contract for push-style consumers.
///
/// Called from an attachment-dedicated worker task. Implementations should
/// avoid blocking the async runtime (prefer async I/O and cooperative
/// waits).
#[async_trait]
pub trait Consume: Send + Sync + 'static {
    /// Handle one delivered message.
    ///
    /// The message is owned: it was already removed from the queue buffer
    /// when this is called (auto-ack).
    async fn on_message(&self, msg: Message);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
