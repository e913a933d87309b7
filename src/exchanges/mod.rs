//! # Named exchanges: the routing entry points.
//!
//! This module provides the exchange data model and its registry:
//! - [`Exchange`] — name plus routing kind, immutable once declared
//! - [`ExchangeKind`] — routing behavior tag; matching lives on the kind so
//!   the router stays polymorphic as kinds are added
//! - [`ExchangeRegistry`] — declare/lookup/delete with conflict validation

mod exchange;
mod registry;

pub use exchange::{Exchange, ExchangeKind};
pub use registry::ExchangeRegistry;
