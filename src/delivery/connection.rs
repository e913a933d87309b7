//! Per-connection identity supplied by the transport layer.

use std::fmt;
use std::sync::Arc;

/// Opaque identity of one transport connection.
///
/// The core never interprets the value; it only groups consumer
/// attachments so [`DeliveryManager::disconnect`](crate::DeliveryManager::disconnect)
/// can release everything a lost client owned.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(Arc<str>);

impl ConnectionId {
    /// Wraps a transport-supplied identity.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// The identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
