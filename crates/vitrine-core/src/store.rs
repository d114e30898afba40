//! The backing-store seam.
//!
//! The query executor only ever talks to a [`Store`]. The in-memory store in
//! `vitrine-store` implements it; tests may substitute their own.

use crate::error::Result;
use crate::schema::Schema;
use crate::value::Record;

/// Row predicate handed to store-side writes.
pub type RowFilter<'a> = &'a dyn Fn(&Record) -> bool;

/// Storage for the resources declared in a [`Schema`].
///
/// Each call is one statement: implementations must apply a write to every
/// matching row or to none of them.
pub trait Store: Send + Sync {
    /// The schema this store serves.
    fn schema(&self) -> &Schema;

    /// Every row of `resource`, in storage order.
    fn scan(&self, resource: &str) -> Result<Vec<Record>>;

    /// Inserts `rows` and returns them as stored (with assigned ids).
    fn insert(&self, resource: &str, rows: Vec<Record>) -> Result<Vec<Record>>;

    /// Merges `patch` into every row matching `filter`; returns the updated rows.
    fn update(&self, resource: &str, filter: RowFilter<'_>, patch: &Record) -> Result<Vec<Record>>;

    /// Removes every row matching `filter`; returns the removed rows.
    fn delete(&self, resource: &str, filter: RowFilter<'_>) -> Result<Vec<Record>>;
}
