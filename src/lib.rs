//! # fanoutmq
//!
//! **fanoutmq** is the embeddable routing core of a fanout message broker.
//!
//! It provides the pieces between a producer and its consumers — named
//! exchanges, on-demand queues, a binding table, snapshot-consistent
//! fanout routing, and per-attachment delivery — while leaving transport,
//! authentication, and persistence to the surrounding infrastructure.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  Producer ── publish("logs", msg) ──► Broker
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Broker (lifecycle-scoped context object)                         │
//! │  - ExchangeRegistry (declare / lookup / delete)                   │
//! │  - BindingTable     (exchange ◄──► queue relation)                │
//! │  - QueueStore       (bounded per-queue buffers)                   │
//! │  - Router           (snapshot ─► lock-free fan-out)               │
//! │  - DeliveryManager  (attachments per connection)                  │
//! └──────┬──────────────────────┬──────────────────────┬──────────────┘
//!        ▼                      ▼                      ▼
//!  [queue gen-x1]         [queue gen-x2]         [queue gen-xN]
//!        │                      │                      │
//!    recv() pull            recv() pull           worker ─► Consume
//!        ▼                      ▼                      ▼
//!    consumer A             consumer B             consumer N
//! ```
//!
//! ### Publish path
//! ```text
//! publish(exchange, message)
//!   ├─► ExchangeRegistry::lookup          (UnknownExchange if absent)
//!   ├─► BindingTable::bound_queues        (point-in-time snapshot)
//!   ├─► QueueStore enqueue per queue      (no shared lock held;
//!   │        │                             one logical copy per queue)
//!   │        ├─ buffer has room ──► appended, counts as delivered
//!   │        └─ buffer full ──► OverflowPolicy:
//!   │              Block      ─► wait for vacancy (publish_timeout caps
//!   │              │              the wait ─► BufferOverflow)
//!   │              DropNewest ─► incoming message discarded
//!   │              DropOldest ─► head evicted, incoming appended
//!   └─► returns delivered count           (0 = nobody listening, success)
//! ```
//!
//! Delivery is best-effort by design: a message published while no queue
//! is bound is discarded without error, and a queue destroyed between the
//! routing snapshot and its enqueue simply never receives its copy.
//!
//! ## Features
//! | Area            | Description                                              | Key types                                  |
//! |-----------------|----------------------------------------------------------|--------------------------------------------|
//! | **Exchanges**   | Named routing entry points, kind-checked redeclaration.  | [`Exchange`], [`ExchangeKind`]             |
//! | **Queues**      | Ephemeral, server-nameable, exclusive/auto-delete flags. | [`QueueInfo`], [`QueueOptions`]            |
//! | **Bindings**    | Idempotent exchange→queue relation with purge cascades.  | [`Binding`], [`BindingTable`]              |
//! | **Routing**     | Snapshot-consistent concurrent fanout.                   | [`Router`], [`Message`]                    |
//! | **Delivery**    | Pull (`recv`) and push ([`Consume`]) per attachment.     | [`ConsumerHandle`], [`DeliveryManager`]    |
//! | **Errors**      | Typed, per-operation, never process-fatal.               | [`BrokerError`]                            |
//! | **Configuration** | Buffer capacity, overflow policy, server-named flags.  | [`BrokerConfig`], [`OverflowPolicy`]       |
//!
//! ## Example
//! ```rust
//! use fanoutmq::{Broker, BrokerConfig, ConnectionId, ExchangeKind, Message};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let broker = Broker::new(BrokerConfig::default());
//!     broker.declare_exchange("logs", ExchangeKind::Fanout).await?;
//!
//!     // A consumer on a server-named queue, bound to the exchange.
//!     let conn = ConnectionId::new("receiver-1");
//!     let queue = broker.declare_queue(None, None).await;
//!     broker.bind("logs", queue.name(), "").await?;
//!     let mut handle = broker.consume(&conn, queue.name()).await?;
//!
//!     // Fire-and-forget publish; the count says how many queues got it.
//!     let delivered = broker.publish("logs", Message::from("hello")).await?;
//!     assert_eq!(delivered, 1);
//!
//!     let msg = handle.recv().await.expect("queue is live");
//!     assert_eq!(&msg.payload[..], b"hello");
//!
//!     // Transports must release everything a lost client owned.
//!     broker.disconnect(&conn).await;
//!     Ok(())
//! }
//! ```

mod bindings;
mod config;
mod core;
mod delivery;
mod error;
mod exchanges;
mod message;
mod policies;
mod queues;

// ---- Public re-exports ----

pub use bindings::{Binding, BindingTable};
pub use config::BrokerConfig;
pub use core::{Broker, BrokerStats, Router};
pub use delivery::{ConnectionId, Consume, ConsumerHandle, DeliveryManager, DeliveryState};
pub use error::{BrokerError, Result};
pub use exchanges::{Exchange, ExchangeKind, ExchangeRegistry};
pub use message::Message;
pub use policies::OverflowPolicy;
pub use queues::{QueueInfo, QueueOptions, QueueStore};
