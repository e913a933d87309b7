//! Message type routed through exchanges into queue buffers.
//!
//! A [`Message`] is an opaque byte payload plus a routing key. It has no
//! identity or lifecycle beyond a single routing pass: once routed, each
//! destination queue owns an independent logical copy. Payloads are
//! [`bytes::Bytes`], so those copies share storage and cloning is cheap.
//!
//! Fanout exchanges ignore the routing key entirely; it is carried for
//! interface symmetry with other exchange kinds.
//!
//! ## Example
//! ```rust
//! use fanoutmq::Message;
//!
//! let msg = Message::new("hello").with_routing_key("info");
//! assert_eq!(&msg.payload[..], b"hello");
//! assert_eq!(msg.routing_key, "info");
//! ```

use bytes::Bytes;

/// A single message: opaque payload plus routing key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Routing key; ignored by fanout exchanges (wildcard match).
    pub routing_key: String,
    /// Opaque payload bytes.
    pub payload: Bytes,
}

impl Message {
    /// Creates a message with the given payload and an empty routing key.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            routing_key: String::new(),
            payload: payload.into(),
        }
    }

    /// Attaches a routing key.
    #[inline]
    #[must_use]
    pub fn with_routing_key(mut self, key: impl Into<String>) -> Self {
        self.routing_key = key.into();
        self
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl From<&str> for Message {
    fn from(payload: &str) -> Self {
        Message::new(Bytes::copy_from_slice(payload.as_bytes()))
    }
}

impl From<Vec<u8>> for Message {
    fn from(payload: Vec<u8>) -> Self {
        Message::new(payload)
    }
}
