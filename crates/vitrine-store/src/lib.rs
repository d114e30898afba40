//! # Vitrine Store
//!
//! In-memory relational backing store for Vitrine.
//!
//! One table per resource declared in the [`Schema`]. Tables keep insertion
//! order, assign `id` from a per-table sequence and enforce unique columns.
//! Every write is validated in full before any row changes, so a rejected
//! statement leaves the table untouched.

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;
use tracing::{debug, info};
use vitrine_core::schema::{ResourceDef, ID_COLUMN};
use vitrine_core::store::RowFilter;
use vitrine_core::{Error, Record, Result, Schema, Store, Value};

/// Point-in-time copy of every table, used for snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreImage {
    /// Tables ordered by resource name
    pub tables: Vec<TableImage>,
}

impl StoreImage {
    /// Total number of rows across all tables
    pub fn row_count(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }
}

/// Contents of a single table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableImage {
    /// Resource name
    pub name: String,
    /// Next id the sequence hands out
    pub next_id: i64,
    /// Rows in storage order
    pub rows: Vec<Record>,
}

#[derive(Debug, Clone)]
struct Table {
    next_id: i64,
    rows: Vec<Record>,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: Vec::new(),
        }
    }
}

/// In-memory store implementing [`Store`].
///
/// Readers share the table lock; writers hold it exclusively for the whole
/// statement.
#[derive(Debug)]
pub struct MemoryStore {
    schema: Schema,
    tables: RwLock<BTreeMap<String, Table>>,
}

impl MemoryStore {
    /// Creates an empty table for every resource in `schema`.
    pub fn new(schema: Schema) -> Self {
        let tables = schema
            .resources()
            .map(|r| (r.name().to_string(), Table::default()))
            .collect();

        Self {
            schema,
            tables: RwLock::new(tables),
        }
    }

    /// Creates a store and loads `image` into it.
    pub fn from_image(schema: Schema, image: StoreImage) -> Result<Self> {
        let store = Self::new(schema);
        store.import(image)?;
        Ok(store)
    }

    /// Number of rows currently stored for `resource`.
    pub fn row_count(&self, resource: &str) -> Result<usize> {
        let tables = self.tables.read().map_err(|_| Error::LockPoisoned)?;
        Ok(table(&tables, resource)?.rows.len())
    }

    /// Copies every table out of the store.
    pub fn export(&self) -> Result<StoreImage> {
        let tables = self.tables.read().map_err(|_| Error::LockPoisoned)?;
        let tables = tables
            .iter()
            .map(|(name, t)| TableImage {
                name: name.clone(),
                next_id: t.next_id,
                rows: t.rows.clone(),
            })
            .collect();
        Ok(StoreImage { tables })
    }

    /// Replaces the contents of the tables named in `image`.
    ///
    /// The image is checked against the schema first; an image naming an
    /// undeclared resource or column is rejected as corrupt and nothing is
    /// replaced.
    pub fn import(&self, image: StoreImage) -> Result<()> {
        for t in &image.tables {
            let def = self.schema.resource(&t.name).map_err(|_| {
                Error::Corruption(format!("image holds undeclared resource '{}'", t.name))
            })?;
            for row in &t.rows {
                if let Some(column) = row.columns().find(|c| !def.has_column(c)) {
                    return Err(Error::Corruption(format!(
                        "image row of '{}' holds undeclared column '{}'",
                        t.name, column
                    )));
                }
            }
        }

        let mut tables = self.tables.write().map_err(|_| Error::LockPoisoned)?;
        let rows = image.row_count();
        for t in image.tables {
            tables.insert(
                t.name,
                Table {
                    next_id: t.next_id,
                    rows: t.rows,
                },
            );
        }

        info!(rows, "vitrine.store.import");
        Ok(())
    }
}

impl Store for MemoryStore {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn scan(&self, resource: &str) -> Result<Vec<Record>> {
        let tables = self.tables.read().map_err(|_| Error::LockPoisoned)?;
        Ok(table(&tables, resource)?.rows.clone())
    }

    fn insert(&self, resource: &str, rows: Vec<Record>) -> Result<Vec<Record>> {
        let def = self.schema.resource(resource)?;
        let mut tables = self.tables.write().map_err(|_| Error::LockPoisoned)?;
        let table = table_mut(&mut tables, resource)?;

        let mut next_id = table.next_id;
        let mut staged = Vec::with_capacity(rows.len());
        for row in rows {
            let mut row = normalize(def, row)?;
            if row.value(ID_COLUMN).is_null() {
                row.insert(ID_COLUMN, next_id);
                next_id = next_id.checked_add(1).ok_or_else(|| {
                    Error::Conflict(format!("id sequence of '{}' is exhausted", resource))
                })?;
            } else {
                let id = integer_id(resource, row.value(ID_COLUMN))?;
                next_id = next_id.max(id.saturating_add(1));
            }
            staged.push(row);
        }

        for (i, row) in staged.iter().enumerate() {
            let others = table.rows.iter().chain(&staged[..i]);
            check_unique(def, row, others)?;
        }

        table.rows.extend(staged.iter().cloned());
        table.next_id = next_id;
        debug!(resource, rows = staged.len(), "vitrine.store.insert");
        Ok(staged)
    }

    fn update(&self, resource: &str, filter: RowFilter<'_>, patch: &Record) -> Result<Vec<Record>> {
        let def = self.schema.resource(resource)?;
        for column in patch.columns() {
            def.require_column(column)?;
        }
        let patched_id = match patch.get(ID_COLUMN) {
            Some(value) => Some(integer_id(resource, value)?),
            None => None,
        };

        let mut tables = self.tables.write().map_err(|_| Error::LockPoisoned)?;
        let table = table_mut(&mut tables, resource)?;

        let mut candidate = table.rows.clone();
        let mut touched = Vec::new();
        for (i, row) in candidate.iter_mut().enumerate() {
            if filter(row) {
                for (column, value) in patch.iter() {
                    row.insert(column, value.clone());
                }
                touched.push(i);
            }
        }

        for &i in &touched {
            let others = candidate
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, r)| r);
            check_unique(def, &candidate[i], others)?;
        }

        let updated: Vec<Record> = touched.iter().map(|&i| candidate[i].clone()).collect();
        table.rows = candidate;
        if let (Some(id), false) = (patched_id, updated.is_empty()) {
            table.next_id = table.next_id.max(id.saturating_add(1));
        }
        debug!(resource, rows = updated.len(), "vitrine.store.update");
        Ok(updated)
    }

    fn delete(&self, resource: &str, filter: RowFilter<'_>) -> Result<Vec<Record>> {
        self.schema.resource(resource)?;
        let mut tables = self.tables.write().map_err(|_| Error::LockPoisoned)?;
        let table = table_mut(&mut tables, resource)?;

        let (removed, kept): (Vec<Record>, Vec<Record>) =
            table.rows.drain(..).partition(|row| filter(row));
        table.rows = kept;
        debug!(resource, rows = removed.len(), "vitrine.store.delete");
        Ok(removed)
    }
}

fn table<'t>(tables: &'t BTreeMap<String, Table>, resource: &str) -> Result<&'t Table> {
    tables
        .get(resource)
        .ok_or_else(|| Error::NotFound(format!("resource '{}' does not exist", resource)))
}

fn table_mut<'t>(tables: &'t mut BTreeMap<String, Table>, resource: &str) -> Result<&'t mut Table> {
    tables
        .get_mut(resource)
        .ok_or_else(|| Error::NotFound(format!("resource '{}' does not exist", resource)))
}

/// An explicit `id` must be an integer.
fn integer_id(resource: &str, value: &Value) -> Result<i64> {
    value.as_i64().ok_or_else(|| {
        Error::BadRequest(format!(
            "'{}.{}' must be an integer, got {}",
            resource, ID_COLUMN, value
        ))
    })
}

/// Rejects unknown columns and fills absent declared columns with null.
fn normalize(def: &ResourceDef, row: Record) -> Result<Record> {
    for column in row.columns() {
        def.require_column(column)?;
    }

    let mut row = row;
    for column in def.columns() {
        if !row.contains(&column.name) {
            row.insert(column.name.clone(), Value::Null);
        }
    }
    Ok(row)
}

/// Fails with `Conflict` when `row` repeats a unique value held by `others`.
/// Nulls never collide.
fn check_unique<'r>(
    def: &ResourceDef,
    row: &Record,
    others: impl Iterator<Item = &'r Record> + Clone,
) -> Result<()> {
    for column in def.columns().iter().filter(|c| c.unique) {
        let value = row.value(&column.name);
        if value.is_null() {
            continue;
        }
        if others.clone().any(|other| other.value(&column.name).matches(value)) {
            return Err(Error::Conflict(format!(
                "duplicate value {} for unique column '{}.{}'",
                value,
                def.name(),
                column.name
            )));
        }
    }
    Ok(())
}
