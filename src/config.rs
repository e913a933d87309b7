//! # Broker configuration.
//!
//! [`BrokerConfig`] defines the operator surface of the routing core:
//! per-queue buffer capacity, the overflow policy applied when a buffer is
//! full, the optional bound on blocking publishes, and the default flags
//! for server-named queues.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use fanoutmq::{BrokerConfig, OverflowPolicy};
//!
//! let mut cfg = BrokerConfig::default();
//! cfg.queue_capacity = 64;
//! cfg.overflow = OverflowPolicy::DropOldest;
//! cfg.publish_timeout = Some(Duration::from_millis(50));
//!
//! assert_eq!(cfg.queue_capacity, 64);
//! ```

use std::time::Duration;

use crate::policies::OverflowPolicy;

/// Operator-facing configuration for a broker instance.
///
/// Controls queue buffering, overflow behavior, and the flags applied to
/// server-named queues.
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    /// Capacity of each queue's message buffer.
    pub queue_capacity: usize,
    /// Behavior when a queue buffer is full at enqueue time.
    pub overflow: OverflowPolicy,
    /// Bound on a blocking enqueue's wait for a vacancy
    /// (`None` = wait indefinitely). Only meaningful with
    /// [`OverflowPolicy::Block`].
    pub publish_timeout: Option<Duration>,
    /// `exclusive` flag applied to queues declared without a name.
    pub server_named_exclusive: bool,
    /// `auto_delete` flag applied to queues declared without a name.
    pub server_named_auto_delete: bool,
}

impl Default for BrokerConfig {
    /// Provides a default configuration:
    /// - `queue_capacity = 1024`
    /// - `overflow = OverflowPolicy::Block` (lossless back-pressure)
    /// - `publish_timeout = None` (wait indefinitely)
    /// - `server_named_exclusive = true`
    /// - `server_named_auto_delete = true`
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            overflow: OverflowPolicy::default(),
            publish_timeout: None,
            server_named_exclusive: true,
            server_named_auto_delete: true,
        }
    }
}
