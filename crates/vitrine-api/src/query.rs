//! The chainable query façade
//!
//! Builders are plain values: every chain call consumes the builder and
//! returns the refined one, so a half-built query can be cloned and reused as
//! a template. Nothing touches the store until a terminal operation runs,
//! either `execute()` or `.await`. Each run re-executes the whole pipeline.
//!
//! ```rust,no_run
//! # async fn demo(client: vitrine::Client) {
//! use vitrine::Direction;
//!
//! let hats = client
//!     .from("products")
//!     .select("id, name, price, variants:product_variants(size, stock)")
//!     .eq("is_active", true)
//!     .eq("category.slug", "hats")
//!     .order("price", Direction::Descending)
//!     .limit(12)
//!     .await;
//!
//! if let Some(error) = hats.error {
//!     eprintln!("{}", error);
//! }
//! # }
//! ```

use crate::result::QueryResult;
use crate::validation::{validate_column_path, validate_identifier, validate_select};
use crate::Client;
use futures_util::future::BoxFuture;
use std::future::IntoFuture;
use tracing::warn;
use vitrine_core::query::{
    parse_select, DeletePlan, Direction, FilterOp, InsertPlan, OrderKey, Predicate, Projection,
    QueryPlan, UpdatePlan, Window,
};
use vitrine_core::{Error, Record, Result, Value};

/// Adds the comparison filters to a builder holding `predicates`.
macro_rules! filter_methods {
    () => {
        /// Appends a conjunctive predicate.
        ///
        /// `column` is a base column or a dotted `relation.column` path.
        pub fn filter(mut self, column: &str, op: FilterOp, value: impl Into<Value>) -> Self {
            self.predicates.push(Predicate::new(column, op, value));
            self
        }

        /// `column = value`. Repeating `eq` on one column keeps both predicates,
        /// so the rows must satisfy each of them.
        pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
            self.filter(column, FilterOp::Eq, value)
        }

        /// `column != value`
        pub fn neq(self, column: &str, value: impl Into<Value>) -> Self {
            self.filter(column, FilterOp::Neq, value)
        }

        /// `column < value`
        pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
            self.filter(column, FilterOp::Lt, value)
        }

        /// `column <= value`
        pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
            self.filter(column, FilterOp::Lte, value)
        }

        /// `column > value`
        pub fn gt(self, column: &str, value: impl Into<Value>) -> Self {
            self.filter(column, FilterOp::Gt, value)
        }

        /// `column >= value`
        pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
            self.filter(column, FilterOp::Gte, value)
        }

        /// `column` equals one of `values`
        pub fn in_list<V: Into<Value>>(
            self,
            column: &str,
            values: impl IntoIterator<Item = V>,
        ) -> Self {
            let values: Vec<Value> = values.into_iter().map(Into::into).collect();
            self.filter(column, FilterOp::In, values)
        }
    };
}

/// Entry point for one resource, returned by [`Client::from`].
///
/// The resource name is not checked here; an unknown resource surfaces as a
/// `NotFound` error when the query executes.
#[derive(Clone)]
pub struct ResourceHandle {
    client: Client,
    resource: String,
}

impl ResourceHandle {
    pub(crate) fn new(client: Client, resource: String) -> Self {
        Self { client, resource }
    }

    /// Resource this handle targets
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Starts a read query with the given projection.
    ///
    /// `spec` is `*` or a comma list of columns and relationship expansions,
    /// e.g. `id, name, variants:product_variants(size, stock)`. A malformed
    /// spec is reported as `BadRequest` when the query executes.
    pub fn select(&self, spec: &str) -> Query {
        let projection = parse_projection(spec, self.client.config().max_select_length);

        Query {
            client: self.client.clone(),
            resource: self.resource.clone(),
            projection,
            predicates: Vec::new(),
            order: Vec::new(),
            window: Window::default(),
        }
    }

    /// Starts an insert of `rows`. Returns the rows as stored.
    pub fn insert(&self, rows: impl IntoIterator<Item = Record>) -> InsertQuery {
        InsertQuery {
            client: self.client.clone(),
            resource: self.resource.clone(),
            rows: rows.into_iter().collect(),
        }
    }

    /// Starts an update merging `patch` into the rows matched by the filters
    /// added next. Returns the updated rows.
    pub fn update(&self, patch: Record) -> UpdateQuery {
        UpdateQuery {
            client: self.client.clone(),
            resource: self.resource.clone(),
            patch,
            predicates: Vec::new(),
        }
    }

    /// Starts a delete of the rows matched by the filters added next.
    /// Returns the removed rows.
    pub fn delete(&self) -> DeleteQuery {
        DeleteQuery {
            client: self.client.clone(),
            resource: self.resource.clone(),
            predicates: Vec::new(),
        }
    }
}

/// Parses a select spec, keeping any failure message until execution.
fn parse_projection(spec: &str, max_length: usize) -> std::result::Result<Projection, String> {
    validate_select(spec, max_length).map_err(|e| match e {
        Error::BadRequest(msg) => msg,
        other => other.to_string(),
    })?;
    parse_select(spec).map_err(|e| format!("invalid select: {}", e))
}

/// An accumulated read query.
///
/// Awaiting it (or calling [`execute`](Query::execute)) yields every matching
/// row as a sequence, even when exactly one row matches.
#[derive(Clone)]
#[must_use = "queries do nothing until executed or awaited"]
pub struct Query {
    client: Client,
    resource: String,
    projection: std::result::Result<Projection, String>,
    predicates: Vec<Predicate>,
    order: Vec<OrderKey>,
    window: Window,
}

impl Query {
    filter_methods!();

    /// Sorts by `column`. Only one order key is supported; adding a second
    /// makes the query fail with `BadRequest`.
    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        self.order.push(OrderKey {
            column: column.to_string(),
            direction,
        });
        self
    }

    /// Sorts ascending by `column`
    pub fn order_asc(self, column: &str) -> Self {
        self.order(column, Direction::Ascending)
    }

    /// Returns at most `count` rows, starting at the current offset.
    pub fn limit(mut self, count: usize) -> Self {
        self.window = self.window.limit(count);
        self
    }

    /// Returns rows `from..=to` (zero-indexed). `from > to` yields no rows.
    pub fn range(mut self, from: usize, to: usize) -> Self {
        self.window = Window::range(from, to);
        self
    }

    /// Skips the first `offset` rows, keeping any limit.
    pub fn offset(mut self, offset: usize) -> Self {
        self.window.offset = offset;
        self
    }

    /// Expects exactly one matching row.
    pub fn single(self) -> SingleQuery {
        SingleQuery { query: self }
    }

    /// The plan this query would execute.
    pub fn plan(&self) -> Result<QueryPlan> {
        validate_identifier(&self.resource)?;
        for pred in &self.predicates {
            validate_column_path(&pred.path.to_string())?;
        }

        let projection = self.projection.clone().map_err(Error::BadRequest)?;

        Ok(QueryPlan {
            resource: self.resource.clone(),
            projection,
            predicates: self.predicates.clone(),
            order: self.order.clone(),
            window: self.window,
        })
    }

    /// Runs the query now, returning every matching row.
    pub fn execute(&self) -> QueryResult<Vec<Record>> {
        let result = self
            .plan()
            .and_then(|plan| self.client.executor().fetch(&plan));
        finish(&self.resource, "select", result)
    }
}

impl IntoFuture for Query {
    type Output = QueryResult<Vec<Record>>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.execute() })
    }
}

/// A read query that must match exactly one row.
#[derive(Clone)]
#[must_use = "queries do nothing until executed or awaited"]
pub struct SingleQuery {
    query: Query,
}

impl SingleQuery {
    /// Runs the query now. Zero or several matches fail with
    /// `SingleRowExpectationFailed`.
    pub fn execute(&self) -> QueryResult<Record> {
        let result = self
            .query
            .plan()
            .and_then(|plan| self.query.client.executor().fetch_single(&plan));
        finish(&self.query.resource, "single", result)
    }
}

impl IntoFuture for SingleQuery {
    type Output = QueryResult<Record>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.execute() })
    }
}

/// An insert statement.
#[derive(Clone)]
#[must_use = "queries do nothing until executed or awaited"]
pub struct InsertQuery {
    client: Client,
    resource: String,
    rows: Vec<Record>,
}

impl InsertQuery {
    /// Runs the insert now.
    pub fn execute(&self) -> QueryResult<Vec<Record>> {
        let result = validate_identifier(&self.resource).and_then(|()| {
            self.client.executor().insert(InsertPlan {
                resource: self.resource.clone(),
                rows: self.rows.clone(),
            })
        });
        finish(&self.resource, "insert", result)
    }
}

/// An update statement; filters scope the affected rows.
#[derive(Clone)]
#[must_use = "queries do nothing until executed or awaited"]
pub struct UpdateQuery {
    client: Client,
    resource: String,
    patch: Record,
    predicates: Vec<Predicate>,
}

impl UpdateQuery {
    filter_methods!();

    /// Runs the update now.
    pub fn execute(&self) -> QueryResult<Vec<Record>> {
        let result = validate_identifier(&self.resource).and_then(|()| {
            self.client.executor().update(UpdatePlan {
                resource: self.resource.clone(),
                patch: self.patch.clone(),
                predicates: self.predicates.clone(),
            })
        });
        finish(&self.resource, "update", result)
    }
}

/// A delete statement; filters scope the removed rows.
#[derive(Clone)]
#[must_use = "queries do nothing until executed or awaited"]
pub struct DeleteQuery {
    client: Client,
    resource: String,
    predicates: Vec<Predicate>,
}

impl DeleteQuery {
    filter_methods!();

    /// Runs the delete now.
    pub fn execute(&self) -> QueryResult<Vec<Record>> {
        let result = validate_identifier(&self.resource).and_then(|()| {
            self.client.executor().delete(DeletePlan {
                resource: self.resource.clone(),
                predicates: self.predicates.clone(),
            })
        });
        finish(&self.resource, "delete", result)
    }
}

macro_rules! into_future {
    ($($builder:ty),*) => {
        $(
            impl IntoFuture for $builder {
                type Output = QueryResult<Vec<Record>>;
                type IntoFuture = BoxFuture<'static, Self::Output>;

                fn into_future(self) -> Self::IntoFuture {
                    Box::pin(async move { self.execute() })
                }
            }
        )*
    };
}

into_future!(InsertQuery, UpdateQuery, DeleteQuery);

/// Wraps an execution outcome in the envelope, logging failures.
fn finish<T>(resource: &str, operation: &str, result: Result<T>) -> QueryResult<T> {
    if let Err(ref err) = result {
        warn!(resource, operation, kind = %err.kind(), error = %err, "vitrine.query.failed");
    }
    QueryResult::from(result)
}
