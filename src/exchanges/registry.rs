//! # Exchange registry - declare/lookup/delete with conflict validation.
//!
//! The registry owns the name → exchange map. Declaration is
//! create-if-absent: redeclaring with the same kind returns the existing
//! exchange unchanged, redeclaring with a different kind is an
//! [`ExchangeConflict`](crate::BrokerError::ExchangeConflict). Lookup of an
//! undeclared name is [`UnknownExchange`](crate::BrokerError::UnknownExchange) —
//! there is no implicit default exchange.
//!
//! ## Rules
//! - The registry mutates nothing outside its own map; binding cascades on
//!   delete are orchestrated by the broker in the same logical operation.
//! - All operations are safe under concurrent declare/lookup/delete.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::error::{BrokerError, Result};
use crate::exchanges::{Exchange, ExchangeKind};

/// Concurrent registry of declared exchanges, keyed by name.
#[derive(Debug, Default)]
pub struct ExchangeRegistry {
    exchanges: RwLock<HashMap<String, Exchange>>,
}

impl ExchangeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an exchange, creating it if absent.
    ///
    /// Returns the existing exchange when `name` is already declared with
    /// the same `kind` (idempotent). Fails with
    /// [`BrokerError::ExchangeConflict`] when the kinds differ.
    pub async fn declare(&self, name: &str, kind: ExchangeKind) -> Result<Exchange> {
        let mut exchanges = self.exchanges.write().await;
        if let Some(existing) = exchanges.get(name) {
            if existing.kind() == kind {
                return Ok(existing.clone());
            }
            return Err(BrokerError::ExchangeConflict {
                name: name.to_string(),
                existing: existing.kind().to_string(),
                requested: kind.to_string(),
            });
        }

        let exchange = Exchange::new(name, kind);
        exchanges.insert(name.to_string(), exchange.clone());
        tracing::debug!(exchange = name, kind = kind.as_label(), "exchange declared");
        Ok(exchange)
    }

    /// Looks up a declared exchange by name.
    ///
    /// Fails with [`BrokerError::UnknownExchange`] if absent.
    pub async fn lookup(&self, name: &str) -> Result<Exchange> {
        let exchanges = self.exchanges.read().await;
        exchanges
            .get(name)
            .cloned()
            .ok_or_else(|| BrokerError::UnknownExchange {
                name: name.to_string(),
            })
    }

    /// True if the exchange is currently declared.
    pub async fn contains(&self, name: &str) -> bool {
        self.exchanges.read().await.contains_key(name)
    }

    /// Removes an exchange; returns whether it existed.
    ///
    /// The caller removes all bindings referencing the exchange as part of
    /// the same logical operation.
    pub async fn delete(&self, name: &str) -> bool {
        let existed = self.exchanges.write().await.remove(name).is_some();
        if existed {
            tracing::debug!(exchange = name, "exchange deleted");
        }
        existed
    }

    /// Returns sorted list of declared exchange names.
    pub async fn list(&self) -> Vec<String> {
        let exchanges = self.exchanges.read().await;
        let mut names: Vec<String> = exchanges.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of declared exchanges.
    pub async fn len(&self) -> usize {
        self.exchanges.read().await.len()
    }

    /// True if no exchanges are declared.
    pub async fn is_empty(&self) -> bool {
        self.exchanges.read().await.is_empty()
    }
}
