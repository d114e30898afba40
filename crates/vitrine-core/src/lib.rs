//! # Vitrine Core
//!
//! Core types and the query engine behind the Vitrine storefront data layer.
//!
//! ## ⚠️ Internal Implementation Detail
//!
//! **This crate is an internal implementation detail of Vitrine.**
//!
//! Users should depend on the main `vitrine` crate instead, which provides the
//! chainable query façade. This crate's API may change without notice between
//! minor versions.
//!
//! ---
//!
//! The pieces living here:
//!
//! - [`Value`] and [`Record`]: the dynamically shaped rows every resource holds
//! - [`Schema`]: the registry of resources, columns and declared relationships
//! - [`query`]: the select mini-language, the query plan and the executor
//! - [`Store`]: the seam a backing store implements

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod query;
pub mod schema;
pub mod store;
/// Values and records
#[allow(missing_docs)]
pub mod value;

pub use error::{Error, ErrorKind, Result};
pub use schema::{ColumnDef, Relationship, RelationshipKind, ResourceDef, Schema};
pub use store::Store;
pub use value::{Record, Value};
