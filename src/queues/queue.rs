//! Queue declaration flags and descriptors.

/// Flags supplied when declaring a queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueOptions {
    /// The queue admits at most one consumer attachment at a time.
    pub exclusive: bool,
    /// The queue is destroyed when its last consumer detaches.
    pub auto_delete: bool,
    /// Accepted for interface symmetry; durability is not implemented and
    /// the flag is never acted on.
    pub durable: bool,
}

/// Descriptor of a declared queue.
///
/// Returned by declaration so the transport learns server-generated names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueInfo {
    name: String,
    options: QueueOptions,
}

impl QueueInfo {
    pub(crate) fn new(name: impl Into<String>, options: QueueOptions) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    /// The queue name (unique within its store).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if the queue admits at most one consumer.
    #[must_use]
    pub fn exclusive(&self) -> bool {
        self.options.exclusive
    }

    /// True if the queue is destroyed when its last consumer detaches.
    #[must_use]
    pub fn auto_delete(&self) -> bool {
        self.options.auto_delete
    }

    /// Always `false`: durability is out of scope.
    #[must_use]
    pub fn durable(&self) -> bool {
        self.options.durable
    }
}
