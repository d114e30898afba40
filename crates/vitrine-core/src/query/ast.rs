/// Query plan types
///
/// A plan is the fully accumulated description of one query: base resource,
/// projection, conjunctive predicates, ordering and pagination window.
use crate::value::{Record, Value};
use std::fmt;

/// A read query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub resource: String,
    pub projection: Projection,
    pub predicates: Vec<Predicate>,
    pub order: Vec<OrderKey>,
    pub window: Window,
}

impl QueryPlan {
    /// Plan selecting every column of `resource`, unfiltered.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            projection: Projection::wildcard(),
            predicates: Vec::new(),
            order: Vec::new(),
            window: Window::default(),
        }
    }
}

/// Insert statement
#[derive(Debug, Clone, PartialEq)]
pub struct InsertPlan {
    pub resource: String,
    pub rows: Vec<Record>,
}

/// Update statement; `predicates` scope the affected rows
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePlan {
    pub resource: String,
    pub patch: Record,
    pub predicates: Vec<Predicate>,
}

/// Delete statement; `predicates` scope the affected rows
#[derive(Debug, Clone, PartialEq)]
pub struct DeletePlan {
    pub resource: String,
    pub predicates: Vec<Predicate>,
}

/// Parsed select spec
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub items: Vec<SelectItem>,
}

impl Projection {
    /// `*`
    pub fn wildcard() -> Self {
        Self {
            items: vec![SelectItem::Wildcard],
        }
    }
}

/// One entry of a select spec
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// `*` - all columns of the resource
    Wildcard,
    /// `name` or `alias:name`
    Column { name: String, alias: Option<String> },
    /// `relation(...)` or `alias:relation(...)` - inline relationship expansion
    Embed {
        relation: String,
        alias: Option<String>,
        projection: Projection,
    },
}

impl SelectItem {
    /// Field name the item produces in the output record.
    pub fn output_name(&self) -> Option<&str> {
        match self {
            SelectItem::Wildcard => None,
            SelectItem::Column { name, alias } => Some(alias.as_deref().unwrap_or(name)),
            SelectItem::Embed {
                relation, alias, ..
            } => Some(alias.as_deref().unwrap_or(relation)),
        }
    }
}

/// Column reference in a filter: `column` or `relation.column`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPath {
    pub relation: Option<String>,
    pub column: String,
}

impl ColumnPath {
    /// Splits a dotted path at its last `.`.
    pub fn parse(path: &str) -> Self {
        match path.rsplit_once('.') {
            Some((relation, column)) => Self {
                relation: Some(relation.to_string()),
                column: column.to_string(),
            },
            None => Self {
                relation: None,
                column: path.to_string(),
            },
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,  // =
    Neq, // !=
    Lt,  // <
    Lte, // <=
    Gt,  // >
    Gte, // >=
    In,  // IN (...)
}

/// One conjunctive filter
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub path: ColumnPath,
    pub op: FilterOp,
    /// Comparison operand; a [`Value::List`] for [`FilterOp::In`]
    pub operand: Value,
}

impl Predicate {
    pub fn new(column: &str, op: FilterOp, operand: impl Into<Value>) -> Self {
        Self {
            path: ColumnPath::parse(column),
            op,
            operand: operand.into(),
        }
    }

    /// Evaluates the predicate against a column value.
    pub fn test(&self, value: &Value) -> bool {
        use std::cmp::Ordering;

        match self.op {
            FilterOp::Eq => value.matches(&self.operand),
            FilterOp::Neq => !value.matches(&self.operand),
            FilterOp::Lt => value.partial_compare(&self.operand) == Some(Ordering::Less),
            FilterOp::Lte => matches!(
                value.partial_compare(&self.operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOp::Gt => value.partial_compare(&self.operand) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(
                value.partial_compare(&self.operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::In => self
                .operand
                .as_list()
                .is_some_and(|values| values.iter().any(|v| value.matches(v))),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// ORDER key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub column: String,
    pub direction: Direction,
}

/// Zero-indexed pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    pub offset: usize,
    /// `None` means unbounded
    pub count: Option<usize>,
}

impl Window {
    /// Caps the count, keeping the current offset.
    pub fn limit(self, count: usize) -> Self {
        Self {
            count: Some(count),
            ..self
        }
    }

    /// Inclusive `from..=to`; empty when `from > to`.
    pub fn range(from: usize, to: usize) -> Self {
        Self {
            offset: from,
            count: Some(if from > to { 0 } else { (to - from).saturating_add(1) }),
        }
    }

    /// Applies the window to an already ordered row set.
    pub fn apply<T>(&self, rows: Vec<T>) -> Vec<T> {
        let rows = rows.into_iter().skip(self.offset);
        match self.count {
            Some(count) => rows.take(count).collect(),
            None => rows.collect(),
        }
    }
}

// Display implementations for logging and error messages

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT {} FROM {}", self.projection, self.resource)?;
        for (i, pred) in self.predicates.iter().enumerate() {
            write!(f, "{}{}", if i == 0 { " WHERE " } else { " AND " }, pred)?;
        }
        for key in &self.order {
            write!(f, " ORDER BY {}", key)?;
        }
        write!(f, "{}", self.window)
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", item)?;
        }
        Ok(())
    }
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectItem::Wildcard => write!(f, "*"),
            SelectItem::Column { name, alias } => {
                if let Some(ref alias) = alias {
                    write!(f, "{}:", alias)?;
                }
                write!(f, "{}", name)
            }
            SelectItem::Embed {
                relation,
                alias,
                projection,
            } => {
                if let Some(ref alias) = alias {
                    write!(f, "{}:", alias)?;
                }
                write!(f, "{}({})", relation, projection)
            }
        }
    }
}

impl fmt::Display for ColumnPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.relation {
            Some(ref relation) => write!(f, "{}.{}", relation, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterOp::Eq => write!(f, "="),
            FilterOp::Neq => write!(f, "!="),
            FilterOp::Lt => write!(f, "<"),
            FilterOp::Lte => write!(f, "<="),
            FilterOp::Gt => write!(f, ">"),
            FilterOp::Gte => write!(f, ">="),
            FilterOp::In => write!(f, "IN"),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.path, self.op, self.operand)
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Ascending => write!(f, "{} ASC", self.column),
            Direction::Descending => write!(f, "{} DESC", self.column),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(count) = self.count {
            write!(f, " LIMIT {}", count)?;
        }
        if self.offset > 0 {
            write!(f, " OFFSET {}", self.offset)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_range_is_inclusive() {
        let window = Window::range(1, 2);
        assert_eq!(window.apply(vec![0, 1, 2, 3]), vec![1, 2]);
    }

    #[test]
    fn test_window_empty_range() {
        assert_eq!(Window::range(2, 1).apply(vec![0, 1, 2, 3]), Vec::<i32>::new());
    }

    #[test]
    fn test_window_range_to_usize_max() {
        let window = Window::range(0, usize::MAX);
        assert_eq!(window.count, Some(usize::MAX));
        assert_eq!(window.apply(vec![0, 1, 2]), vec![0, 1, 2]);

        let window = Window::range(usize::MAX, usize::MAX);
        assert_eq!(window.apply(vec![0, 1, 2]), Vec::<i32>::new());
    }

    #[test]
    fn test_limit_keeps_offset() {
        let window = Window::range(2, 9).limit(1);
        assert_eq!(window.apply(vec![0, 1, 2, 3]), vec![2]);
        assert_eq!(Window::default().limit(0).apply(vec![1, 2]), Vec::<i32>::new());
    }

    #[test]
    fn test_column_path() {
        assert_eq!(ColumnPath::parse("size").relation, None);
        let path = ColumnPath::parse("variants.size");
        assert_eq!(path.relation.as_deref(), Some("variants"));
        assert_eq!(path.column, "size");
    }

    #[test]
    fn test_predicate_ops() {
        let price = Value::Integer(2500);
        assert!(Predicate::new("price", FilterOp::Lt, 3000).test(&price));
        assert!(Predicate::new("price", FilterOp::Gte, 2500).test(&price));
        assert!(!Predicate::new("price", FilterOp::Gt, 2500).test(&price));
        assert!(Predicate::new("price", FilterOp::Neq, 1).test(&price));
        assert!(!Predicate::new("price", FilterOp::Lt, 3000).test(&Value::Null));
        let within = Predicate::new(
            "price",
            FilterOp::In,
            vec![Value::Integer(100), Value::Integer(2500)],
        );
        assert!(within.test(&price));
    }

    #[test]
    fn test_plan_display() {
        let mut plan = QueryPlan::new("products");
        plan.predicates.push(Predicate::new("is_active", FilterOp::Eq, true));
        plan.order.push(OrderKey {
            column: "price".into(),
            direction: Direction::Descending,
        });
        plan.window = Window::default().limit(10);
        assert_eq!(
            plan.to_string(),
            "SELECT * FROM products WHERE is_active = true ORDER BY price DESC LIMIT 10"
        );
    }
}
