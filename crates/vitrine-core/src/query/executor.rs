/// Query executor
///
/// Executes query plans against a [`Store`]: validate against the schema,
/// scan, filter, sort, window, then project with relationship expansion.
use super::ast::*;
use crate::error::{Error, Result};
use crate::schema::{Relationship, ResourceDef, Schema};
use crate::store::Store;
use crate::value::{Record, Value};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Default cap on nested relationship expansions
pub const DEFAULT_MAX_EMBED_DEPTH: usize = 4;

/// Bounds enforced while executing a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Hard cap on rows returned by a sequence fetch, applied after the window
    pub max_rows: Option<usize>,
    /// Deepest relationship expansion a select may request
    pub max_embed_depth: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_rows: None,
            max_embed_depth: DEFAULT_MAX_EMBED_DEPTH,
        }
    }
}

/// Rows of related resources, loaded once per execution
type RelatedRows = HashMap<String, Vec<Record>>;

/// Query executor
pub struct Executor<'a> {
    store: &'a dyn Store,
    limits: ExecutionLimits,
}

impl<'a> Executor<'a> {
    /// Create new executor
    pub fn new(store: &'a dyn Store) -> Self {
        Self {
            store,
            limits: ExecutionLimits::default(),
        }
    }

    /// Replace the execution limits
    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Execute a plan, returning every matching row in order.
    pub fn fetch(&self, plan: &QueryPlan) -> Result<Vec<Record>> {
        let mut rows = self.run(plan)?;

        if let Some(max) = self.limits.max_rows {
            if rows.len() > max {
                debug!(resource = %plan.resource, matched = rows.len(), max, "vitrine.query.capped");
                rows.truncate(max);
            }
        }

        Ok(rows)
    }

    /// Execute a plan that must match exactly one row.
    pub fn fetch_single(&self, plan: &QueryPlan) -> Result<Record> {
        let mut rows = self.run(plan)?;
        match rows.len() {
            1 => Ok(rows.remove(0)),
            n => Err(Error::SingleRow { rows: n }),
        }
    }

    /// Execute an insert statement.
    pub fn insert(&self, plan: InsertPlan) -> Result<Vec<Record>> {
        let resource = self.store.schema().resource(&plan.resource)?;
        for row in &plan.rows {
            for column in row.columns() {
                resource.require_column(column)?;
            }
        }

        if plan.rows.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self.store.insert(&plan.resource, plan.rows)?;
        debug!(resource = %plan.resource, rows = rows.len(), "vitrine.write.insert");
        Ok(rows)
    }

    /// Execute an update statement.
    pub fn update(&self, plan: UpdatePlan) -> Result<Vec<Record>> {
        let resource = self.store.schema().resource(&plan.resource)?;
        for column in plan.patch.columns() {
            resource.require_column(column)?;
        }
        self.check_write_scope(resource, &plan.predicates, "update")?;

        let filter = |row: &Record| matches_all(row, &plan.predicates);
        let rows = self.store.update(&plan.resource, &filter, &plan.patch)?;
        debug!(resource = %plan.resource, rows = rows.len(), "vitrine.write.update");
        Ok(rows)
    }

    /// Execute a delete statement.
    pub fn delete(&self, plan: DeletePlan) -> Result<Vec<Record>> {
        let resource = self.store.schema().resource(&plan.resource)?;
        self.check_write_scope(resource, &plan.predicates, "delete")?;

        let filter = |row: &Record| matches_all(row, &plan.predicates);
        let rows = self.store.delete(&plan.resource, &filter)?;
        debug!(resource = %plan.resource, rows = rows.len(), "vitrine.write.delete");
        Ok(rows)
    }

    fn run(&self, plan: &QueryPlan) -> Result<Vec<Record>> {
        let schema = self.store.schema();
        let resource = schema.resource(&plan.resource)?;

        // Validate everything before touching the store
        let mut needed = BTreeSet::new();
        self.check_projection(schema, resource, &plan.projection, 0, &mut needed)?;
        let scopes = check_predicates(schema, resource, &plan.predicates, &mut needed)?;
        let order = check_order(resource, &plan.order)?;

        let mut related = RelatedRows::new();
        for name in needed {
            let rows = self.store.scan(&name)?;
            related.insert(name, rows);
        }

        let mut rows: Vec<Record> = self
            .store
            .scan(&plan.resource)?
            .into_iter()
            .filter(|row| {
                plan.predicates
                    .iter()
                    .zip(&scopes)
                    .all(|(pred, scope)| match scope {
                        None => pred.test(row.value(&pred.path.column)),
                        Some(rel) => related_rows(rel, row, &related)
                            .into_iter()
                            .any(|r| pred.test(r.value(&pred.path.column))),
                    })
            })
            .collect();

        if let Some(key) = order {
            // sort_by is stable: ties keep storage order
            rows.sort_by(|a, b| {
                let ordering = a.value(&key.column).sort_compare(b.value(&key.column));
                match key.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        let rows = plan.window.apply(rows);

        let projected = rows
            .iter()
            .map(|row| project(schema, resource, row, &plan.projection, &related))
            .collect::<Result<Vec<_>>>()?;

        debug!(plan = %plan, rows = projected.len(), "vitrine.query");
        Ok(projected)
    }

    fn check_projection(
        &self,
        schema: &Schema,
        resource: &ResourceDef,
        projection: &Projection,
        depth: usize,
        needed: &mut BTreeSet<String>,
    ) -> Result<()> {
        if depth > self.limits.max_embed_depth {
            return Err(Error::BadRequest(format!(
                "select nests relationships deeper than {} levels",
                self.limits.max_embed_depth
            )));
        }

        let mut outputs = BTreeSet::new();
        for item in &projection.items {
            if let Some(name) = item.output_name() {
                if !outputs.insert(name) {
                    return Err(Error::BadRequest(format!(
                        "select names '{}' more than once on '{}'",
                        name,
                        resource.name()
                    )));
                }
            }

            match item {
                SelectItem::Wildcard => {}
                SelectItem::Column { name, .. } => resource.require_column(name)?,
                SelectItem::Embed {
                    relation,
                    projection,
                    ..
                } => {
                    let rel = resource.relationship(relation)?;
                    let target = schema.resource(&rel.target)?;
                    needed.insert(rel.target.clone());
                    self.check_projection(schema, target, projection, depth + 1, needed)?;
                }
            }
        }

        Ok(())
    }

    fn check_write_scope(
        &self,
        resource: &ResourceDef,
        predicates: &[Predicate],
        statement: &str,
    ) -> Result<()> {
        if predicates.is_empty() {
            return Err(Error::BadRequest(format!(
                "{} on '{}' requires at least one filter",
                statement,
                resource.name()
            )));
        }

        for pred in predicates {
            if pred.path.relation.is_some() {
                return Err(Error::BadRequest(format!(
                    "{} cannot filter on related column '{}'",
                    statement, pred.path
                )));
            }
            check_operand(pred)?;
            resource.require_column(&pred.path.column)?;
        }

        Ok(())
    }
}

/// Resolves each predicate's scope: `None` for base columns, the relationship
/// for dotted paths.
fn check_predicates<'s>(
    schema: &'s Schema,
    resource: &'s ResourceDef,
    predicates: &[Predicate],
    needed: &mut BTreeSet<String>,
) -> Result<Vec<Option<&'s Relationship>>> {
    let mut scopes = Vec::with_capacity(predicates.len());

    for pred in predicates {
        check_operand(pred)?;
        match pred.path.relation {
            None => {
                resource.require_column(&pred.path.column)?;
                scopes.push(None);
            }
            Some(ref reference) => {
                let rel = resource.relationship(reference)?;
                schema
                    .resource(&rel.target)?
                    .require_column(&pred.path.column)?;
                needed.insert(rel.target.clone());
                scopes.push(Some(rel));
            }
        }
    }

    Ok(scopes)
}

fn check_operand(pred: &Predicate) -> Result<()> {
    if pred.op == FilterOp::In && pred.operand.as_list().is_none() {
        return Err(Error::BadRequest(format!(
            "filter on '{}' needs a list of values",
            pred.path
        )));
    }
    Ok(())
}

fn check_order<'p>(resource: &ResourceDef, order: &'p [OrderKey]) -> Result<Option<&'p OrderKey>> {
    if order.len() > 1 {
        return Err(Error::BadRequest(format!(
            "only one order key is supported per query, got {}",
            order.len()
        )));
    }

    match order.first() {
        Some(key) => {
            resource.require_column(&key.column)?;
            Ok(Some(key))
        }
        None => Ok(None),
    }
}

fn matches_all(row: &Record, predicates: &[Predicate]) -> bool {
    predicates
        .iter()
        .all(|pred| pred.test(row.value(&pred.path.column)))
}

/// Rows of the relationship's target whose foreign column equals this row's
/// local column. A null local value relates to nothing.
fn related_rows<'r>(rel: &Relationship, row: &Record, related: &'r RelatedRows) -> Vec<&'r Record> {
    let key = row.value(&rel.local_column);
    if key.is_null() {
        return Vec::new();
    }

    related
        .get(&rel.target)
        .map(|rows| {
            rows.iter()
                .filter(|r| r.value(&rel.foreign_column).matches(key))
                .collect()
        })
        .unwrap_or_default()
}

fn project(
    schema: &Schema,
    resource: &ResourceDef,
    row: &Record,
    projection: &Projection,
    related: &RelatedRows,
) -> Result<Record> {
    let mut out = Record::new();

    for item in &projection.items {
        match item {
            SelectItem::Wildcard => {
                for column in resource.columns() {
                    out.insert(column.name.clone(), row.value(&column.name).clone());
                }
            }
            SelectItem::Column { name, alias } => {
                let field = alias.as_ref().unwrap_or(name);
                out.insert(field.clone(), row.value(name).clone());
            }
            SelectItem::Embed {
                relation,
                alias,
                projection,
            } => {
                let rel = resource.relationship(relation)?;
                let target = schema.resource(&rel.target)?;
                let matches = related_rows(rel, row, related);

                let value = if rel.is_to_many() {
                    let records = matches
                        .into_iter()
                        .map(|r| project(schema, target, r, projection, related).map(Value::Record))
                        .collect::<Result<Vec<_>>>()?;
                    Value::List(records)
                } else {
                    match matches.first() {
                        Some(r) => Value::Record(project(schema, target, r, projection, related)?),
                        None => Value::Null,
                    }
                };

                let field = alias.as_ref().unwrap_or(relation);
                out.insert(field.clone(), value);
            }
        }
    }

    Ok(out)
}
