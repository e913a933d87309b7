//! # Queue lifecycle and buffering.
//!
//! This module provides the queue side of the routing core:
//! - [`QueueOptions`] / [`QueueInfo`] — declaration flags and descriptors
//! - `MessageBuffer` — per-queue bounded FIFO with overflow policy
//! - [`QueueStore`] — declare/enqueue/attach/detach with auto-delete cascade
//!
//! ## Lifecycle
//! ```text
//! declare(None, ..)  ──► server-named queue "gen-<token>" (config flags)
//! declare(Some(n),..)──► named queue, idempotent on redeclare
//!
//! enqueue ──► buffer (bounded; Block / DropNewest / DropOldest on full)
//!
//! attach  ──► consumer tag           (ExclusiveQueueBusy when capped)
//! detach  ──► last tag + auto_delete ──► queue destroyed, buffer closed
//! delete  ──► explicit destruction, buffer closed
//! ```
//!
//! Queue destruction wakes every blocked producer (message dropped) and
//! every waiting consumer (`recv → None`). Binding cleanup for a destroyed
//! queue is performed by the caller as part of the same logical operation.

mod buffer;
mod queue;
mod store;

pub use queue::{QueueInfo, QueueOptions};
pub use store::QueueStore;

pub(crate) use store::{DetachOutcome, QueueSlot};
