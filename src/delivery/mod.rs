//! # Delivery: streaming queued messages to attached consumers.
//!
//! This module models the hand-off from a queue's buffer to its consumers:
//! - [`ConnectionId`] — opaque per-connection identity supplied by the
//!   transport layer
//! - [`ConsumerHandle`] — pull interface (`recv`), FIFO per queue, auto-ack
//! - [`Consume`] — push-style callback trait driven by a worker task
//! - [`DeliveryManager`] — attachment bookkeeping and detach cascades
//!
//! ## State machine (per attachment)
//! ```text
//!             enqueue observed
//!   Idle ───────────────────────► Delivering
//!    ▲                                │ buffer drained
//!    └────────────────────────────────┘
//!    │ detach / disconnect / queue destroyed
//!    ▼
//!   Detached (terminal; triggers the auto-delete cascade)
//! ```
//!
//! Delivery is auto-ack: once a message is handed to the consumer it is
//! removed from the buffer regardless of downstream outcome — there is no
//! redelivery on consumer failure.

mod connection;
mod consume;
mod handle;
mod manager;

pub use connection::ConnectionId;
pub use consume::Consume;
pub use handle::{ConsumerHandle, DeliveryState};
pub use manager::DeliveryManager;
