//! # Overflow policy.
//!
//! [`OverflowPolicy`] selects what a full queue buffer does with a newly
//! offered message at enqueue time. It is plain configuration data — the
//! behavior it names is realized by the buffer (see
//! [`MessageBuffer`](crate::queues) `offer`).

/// Behavior of a full queue buffer when a message is offered.
///
/// The default is [`OverflowPolicy::Block`] — lossless producer
/// back-pressure. Operators opt into the lossy modes explicitly.
///
/// | Variant      | Full-buffer behavior                                   |
/// |--------------|--------------------------------------------------------|
/// | `Block`      | Wait for a vacancy (optionally bounded by a timeout).  |
/// | `DropNewest` | Discard the message being offered; keep the buffer.    |
/// | `DropOldest` | Evict the head, then append the new message.           |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Wait until a vacancy appears before appending (back-pressure).
    Block,
    /// Discard the incoming message, leaving buffered messages untouched.
    DropNewest,
    /// Evict the oldest buffered message to make room for the new one.
    DropOldest,
}

impl OverflowPolicy {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            OverflowPolicy::Block => "block",
            OverflowPolicy::DropNewest => "drop_newest",
            OverflowPolicy::DropOldest => "drop_oldest",
        }
    }
}

impl Default for OverflowPolicy {
    /// [`OverflowPolicy::Block`] — lossless back-pressure.
    fn default() -> Self {
        OverflowPolicy::Block
    }
}
