//! # Bindings: the exchange → queue relation that authorizes delivery.
//!
//! A binding links one exchange to one queue under a routing key. The
//! [`BindingTable`] keeps the full relation and answers the router's
//! point-in-time snapshot query; endpoint destruction purges every binding
//! that mentions the dead endpoint, so no orphaned bindings persist.

mod table;

pub use table::{Binding, BindingTable};
