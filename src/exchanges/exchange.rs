//! Exchange data model: name plus routing kind.
//!
//! An exchange is the named entry point a producer publishes to. Its
//! [`ExchangeKind`] decides which bound queues a message reaches. Matching
//! is a method on the kind, not a special case inside the router, so new
//! kinds (direct, topic, headers) slot in as variants without touching the
//! routing pipeline.

use std::fmt;

/// Routing behavior of an exchange.
///
/// Only fanout is currently implemented. The enum is `#[non_exhaustive]`:
/// kinds like direct-by-name, topic, and headers are expected future
/// variants, selected by this tag.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExchangeKind {
    /// Deliver every message to every bound queue, ignoring routing keys.
    Fanout,
}

impl ExchangeKind {
    /// True if a binding with `binding_key` matches a message published
    /// with `routing_key` under this kind.
    ///
    /// Fanout treats every binding as a wildcard: both keys are ignored.
    pub fn matches(&self, binding_key: &str, routing_key: &str) -> bool {
        match self {
            ExchangeKind::Fanout => {
                let _ = (binding_key, routing_key);
                true
            }
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ExchangeKind::Fanout => "fanout",
        }
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// A declared exchange: unique name plus routing kind.
///
/// Immutable once declared; redeclaration rules are enforced by
/// [`ExchangeRegistry`](crate::exchanges::ExchangeRegistry).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exchange {
    name: String,
    kind: ExchangeKind,
}

impl Exchange {
    pub(crate) fn new(name: impl Into<String>, kind: ExchangeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// The exchange name (unique within its registry).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The routing kind fixed at declaration time.
    #[must_use]
    pub fn kind(&self) -> ExchangeKind {
        self.kind
    }
}
