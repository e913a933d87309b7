//! Broker core: routing and the owning context object.
//!
//! This module contains the wiring of the routing core. The public API
//! surface is [`Broker`] — the lifecycle-scoped owner of all shared broker
//! state — and [`Router`], the publish-side fan-out pipeline.
//!
//! Internal layout:
//! - [`router`]: exchange lookup, binding snapshot, lock-free fan-out;
//! - [`broker`]: context object tying registry, store, bindings, router,
//!   and delivery together, with the transport-facing operations.

mod broker;
mod router;

pub use broker::{Broker, BrokerStats};
pub use router::Router;
