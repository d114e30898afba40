//! # Vitrine
//!
//! The data layer of a streetwear storefront: a typed, chainable query façade
//! over named relational resources, plus the page data loaders built on it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vitrine::{storefront, Client, Direction, Record};
//!
//! # async fn demo() {
//! let client = Client::in_memory(storefront::schema());
//!
//! let inserted = client
//!     .from("products")
//!     .insert(vec![Record::new()
//!         .with("name", "Tee")
//!         .with("slug", "tee")
//!         .with("price", 3000)
//!         .with("is_active", true)])
//!     .await;
//! assert!(inserted.is_ok());
//!
//! let active = client
//!     .from("products")
//!     .select("id, name, variants:product_variants(*)")
//!     .eq("is_active", true)
//!     .order("price", Direction::Descending)
//!     .limit(10)
//!     .await;
//!
//! match (active.data, active.error) {
//!     (Some(rows), None) => println!("{} products", rows.len()),
//!     (_, Some(error)) => eprintln!("query failed: {}", error),
//!     _ => unreachable!(),
//! }
//! # }
//! ```
//!
//! ## Results
//!
//! Terminal operations never fail with a Rust error; they return a
//! [`QueryResult`] holding either `data` or `error`. A query without
//! [`single`](Query::single) always yields a sequence, even for one row.
//!
//! ## Backing stores
//!
//! A [`Client`] wraps any [`Store`]. [`MemoryStore`] is the bundled one;
//! [`SnapshotManager`] saves and restores it.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::sync::Arc;

pub mod config;
pub mod logging;
pub mod params;
pub mod query;
pub mod result;
pub mod storefront;
pub mod validation;

// Re-export core types
pub use vitrine_core::query::{Direction, FilterOp};
pub use vitrine_core::{
    Error, ErrorKind, Record, Relationship, RelationshipKind, ResourceDef, Result, Schema, Store,
    Value,
};

// Store and snapshot components
pub use vitrine_snapshot::{SnapshotConfig, SnapshotManager, SnapshotMeta};
pub use vitrine_store::{MemoryStore, StoreImage, TableImage};

pub use config::ClientConfig;
pub use params::RequestParams;
pub use query::{DeleteQuery, InsertQuery, Query, ResourceHandle, SingleQuery, UpdateQuery};
pub use result::{ErrorInfo, QueryResult, ToJson};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The query façade's entry point.
///
/// Holds an explicit handle to the backing store; cloning is cheap and every
/// clone shares the same store.
#[derive(Clone)]
pub struct Client {
    store: Arc<dyn Store>,
    config: ClientConfig,
}

impl Client {
    /// Creates a client over `store` with the default configuration.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_config(store, ClientConfig::default())
    }

    /// Creates a client over `store` with custom configuration.
    pub fn with_config(store: Arc<dyn Store>, config: ClientConfig) -> Self {
        Self { store, config }
    }

    /// Creates a client over a fresh, empty [`MemoryStore`].
    pub fn in_memory(schema: Schema) -> Self {
        Self::new(Arc::new(MemoryStore::new(schema)))
    }

    /// Targets `resource`. The name is checked when a query executes.
    pub fn from(&self, resource: &str) -> ResourceHandle {
        ResourceHandle::new(self.clone(), resource.to_string())
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The backing store
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub(crate) fn executor(&self) -> vitrine_core::query::Executor<'_> {
        vitrine_core::query::Executor::new(self.store.as_ref()).with_limits(self.config.limits())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("resources", &self.store.schema().resources().count())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_clients_share_store() {
        let client = Client::in_memory(Schema::new().with_resource(ResourceDef::new("drops").column("name")));
        let other = client.clone();

        let inserted = client
            .from("drops")
            .insert(vec![Record::new().with("name", "Autumn capsule")])
            .execute();
        assert!(inserted.is_ok());

        let rows = other.from("drops").select("*").execute().data.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_from_does_not_validate() {
        let handle = Client::in_memory(Schema::new()).from("unknownTable");
        assert_eq!(handle.resource(), "unknownTable");
        let result = handle.select("*").execute();
        assert_eq!(result.error_kind(), Some(ErrorKind::NotFound));
    }
}
