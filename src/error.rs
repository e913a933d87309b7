//! Error types surfaced by broker operations.
//!
//! All failures are scoped to the single operation that detected them:
//! a bad publish never poisons the broker, and no error here is fatal to
//! the process. Retry policy, if any, belongs to the transport layer.
//!
//! A publish that finds zero bound queues is **not** an error — it returns
//! a delivered count of `0` (best-effort delivery).

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by broker operations.
///
/// Each variant maps to the operation that detects it: `publish` reports
/// [`BrokerError::UnknownExchange`] and [`BrokerError::BufferOverflow`],
/// `declare_exchange` reports [`BrokerError::ExchangeConflict`], `bind` and
/// `consume` report the queue/exchange existence failures.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BrokerError {
    /// The named exchange has not been declared.
    ///
    /// There is no implicit default exchange: publishing or binding against
    /// an undeclared name always fails with this variant.
    #[error("exchange '{name}' does not exist")]
    UnknownExchange {
        /// The exchange name that failed to resolve.
        name: String,
    },

    /// An exchange was redeclared with a different kind.
    ///
    /// Redeclaring with the *same* kind is an idempotent no-op; this error
    /// only fires on a kind mismatch.
    #[error("exchange '{name}' already declared as {existing}, requested {requested}")]
    ExchangeConflict {
        /// The conflicting exchange name.
        name: String,
        /// Kind recorded at first declaration (display form).
        existing: String,
        /// Kind requested by the failing redeclaration (display form).
        requested: String,
    },

    /// The named queue has not been declared (or was already destroyed).
    #[error("queue '{name}' does not exist")]
    QueueNotFound {
        /// The queue name that failed to resolve.
        name: String,
    },

    /// The queue is exclusive and already has a consumer attached.
    #[error("queue '{name}' is exclusive and already consumed")]
    ExclusiveQueueBusy {
        /// The exclusive queue name.
        name: String,
    },

    /// A blocking enqueue did not find buffer space within the publish timeout.
    ///
    /// Only raised under [`OverflowPolicy::Block`](crate::OverflowPolicy::Block)
    /// with a configured `publish_timeout`; the lossy policies drop instead.
    #[error("queue '{queue}' buffer still full after {waited:?}")]
    BufferOverflow {
        /// The queue whose buffer stayed full.
        queue: String,
        /// How long the publisher waited for a vacancy.
        waited: Duration,
    },
}

impl BrokerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use fanoutmq::BrokerError;
    ///
    /// let err = BrokerError::UnknownExchange { name: "logs".into() };
    /// assert_eq!(err.as_label(), "unknown_exchange");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BrokerError::UnknownExchange { .. } => "unknown_exchange",
            BrokerError::ExchangeConflict { .. } => "exchange_conflict",
            BrokerError::QueueNotFound { .. } => "queue_not_found",
            BrokerError::ExclusiveQueueBusy { .. } => "exclusive_queue_busy",
            BrokerError::BufferOverflow { .. } => "buffer_overflow",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BrokerError::UnknownExchange { name } => format!("unknown exchange: {name}"),
            BrokerError::ExchangeConflict {
                name,
                existing,
                requested,
            } => format!("exchange {name}: declared {existing}, requested {requested}"),
            BrokerError::QueueNotFound { name } => format!("queue not found: {name}"),
            BrokerError::ExclusiveQueueBusy { name } => format!("exclusive queue busy: {name}"),
            BrokerError::BufferOverflow { queue, waited } => {
                format!("buffer overflow on {queue} after {waited:?}")
            }
        }
    }
}

/// Result alias for broker operations.
pub type Result<T> = std::result::Result<T, BrokerError>;
