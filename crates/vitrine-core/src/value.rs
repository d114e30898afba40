//! Values and records.
//!
//! A [`Record`] maps column names to [`Value`]s. Expanded relationships are
//! stored inline: to-many expansions as [`Value::List`], to-one expansions as
//! [`Value::Record`] (or [`Value::Null`] when nothing is related).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// A column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Record(Record),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Equality used by filters.
    ///
    /// Integers and floats compare numerically, and `Null` equals `Null`.
    /// Values of unrelated types are never equal.
    pub fn matches(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Float(_), Value::Integer(_)) | (Value::Integer(_), Value::Float(_)) => {
                self.partial_compare(other) == Some(Ordering::Equal)
            }
            _ => self == other,
        }
    }

    /// Ordering used by range filters. `None` when the values are not comparable
    /// (different types, or either side null).
    pub fn partial_compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => compare_int_float(*a, *b),
            (Value::Float(a), Value::Integer(b)) => compare_int_float(*b, *a).map(Ordering::reverse),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total ordering used by `order`.
    ///
    /// Values rank by type first: bools, numbers, text, lists, records, then
    /// nulls last. Integers and floats share one numeric rank and compare by
    /// exact value; NaN sorts after every other number.
    pub fn sort_compare(&self, other: &Value) -> Ordering {
        self.sort_rank()
            .cmp(&other.sort_rank())
            .then_with(|| match (self, other) {
                (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
                (Value::Text(a), Value::Text(b)) => a.cmp(b),
                (Value::List(a), Value::List(b)) => a
                    .iter()
                    .zip(b)
                    .map(|(x, y)| x.sort_compare(y))
                    .find(|o| o.is_ne())
                    .unwrap_or_else(|| a.len().cmp(&b.len())),
                (Value::Record(a), Value::Record(b)) => a
                    .iter()
                    .zip(b.iter())
                    .map(|((ca, va), (cb, vb))| ca.cmp(cb).then_with(|| va.sort_compare(vb)))
                    .find(|o| o.is_ne())
                    .unwrap_or_else(|| a.len().cmp(&b.len())),
                _ => match self.partial_compare(other) {
                    Some(ordering) => ordering,
                    // Same numeric rank, so at least one side is NaN
                    None => self.is_nan().cmp(&other.is_nan()),
                },
            })
    }

    fn sort_rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Integer(_) | Value::Float(_) => 1,
            Value::Text(_) => 2,
            Value::List(_) => 3,
            Value::Record(_) => 4,
            Value::Null => 5,
        }
    }

    fn is_nan(&self) -> bool {
        matches!(self, Value::Float(f) if f.is_nan())
    }
}

/// Exact comparison of an integer with a float; `None` for NaN.
fn compare_int_float(i: i64, f: f64) -> Option<Ordering> {
    // 2^63, the first float above every i64
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    if f.is_nan() {
        return None;
    }
    if f >= LIMIT {
        return Some(Ordering::Less);
    }
    if f < -LIMIT {
        return Some(Ordering::Greater);
    }

    let whole = f.trunc();
    Some(i.cmp(&(whole as i64)).then_with(|| {
        if f > whole {
            Ordering::Less
        } else if f < whole {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Text(s) => write!(f, "'{}'", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Record(r) => write!(f, "{}", r),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A single row: column name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    ///
    /// ```
    /// use vitrine_core::Record;
    ///
    /// let tee = Record::new().with("name", "Tee").with("is_active", true);
    /// assert_eq!(tee.len(), 2);
    /// ```
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    /// Sets a column, returning the previous value.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(column.into(), value.into())
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Value of `column`, or `Null` when absent.
    pub fn value(&self, column: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(column).unwrap_or(&NULL)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.fields.remove(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", k, v)?;
        }
        write!(f, "}}")
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_matching() {
        assert!(Value::Integer(3).matches(&Value::Float(3.0)));
        assert!(!Value::Integer(3).matches(&Value::Text("3".into())));
        assert!(Value::Null.matches(&Value::Null));
        assert!(!Value::Null.matches(&Value::Integer(0)));
    }

    #[test]
    fn test_sort_compare_puts_nulls_last() {
        let mut values = vec![Value::Null, Value::Integer(2), Value::Integer(1)];
        values.sort_by(|a, b| a.sort_compare(b));
        assert_eq!(values, vec![Value::Integer(1), Value::Integer(2), Value::Null]);
    }

    #[test]
    fn test_sort_compare_ranks_types() {
        let mut values = vec![
            Value::Null,
            Value::from("t5"),
            Value::Float(f64::NAN),
            Value::Integer(1),
            Value::List(vec![Value::Integer(1)]),
            Value::Bool(true),
            Value::Float(0.5),
            Value::Record(Record::new().with("size", "M")),
            Value::Integer(0),
        ];
        values.sort_by(|a, b| a.sort_compare(b));

        assert_eq!(values[0], Value::Bool(true));
        assert_eq!(values[1..4], [Value::Integer(0), Value::Float(0.5), Value::Integer(1)]);
        assert!(values[4].is_nan());
        assert_eq!(values[5], Value::from("t5"));
        assert!(values[6].as_list().is_some());
        assert!(values[7].as_record().is_some());
        assert!(values[8].is_null());
    }

    #[test]
    fn test_sort_compare_is_a_total_order() {
        let pool = [
            Value::Null,
            Value::Bool(false),
            Value::Integer(i64::MAX),
            Value::Integer(i64::MAX - 1),
            Value::Integer(0),
            Value::Integer(-3),
            Value::Float(9_223_372_036_854_775_807.0),
            Value::Float(-0.0),
            Value::Float(0.0),
            Value::Float(-2.5),
            Value::Float(f64::NAN),
            Value::Float(f64::INFINITY),
            Value::from("a"),
            Value::from("b"),
        ];

        for a in &pool {
            assert_eq!(a.sort_compare(a), Ordering::Equal);
            for b in &pool {
                assert_eq!(a.sort_compare(b), b.sort_compare(a).reverse());
                for c in &pool {
                    if a.sort_compare(b).is_le() && b.sort_compare(c).is_le() {
                        assert!(a.sort_compare(c).is_le(), "{} <= {} <= {}", a, b, c);
                    }
                }
            }
        }
    }

    #[test]
    fn test_integer_float_compare_is_exact() {
        let big = Value::Integer(i64::MAX - 1);
        let float = Value::Float(9_223_372_036_854_775_807.0);
        assert_eq!(big.partial_compare(&float), Some(Ordering::Less));
        assert_eq!(Value::Integer(2).partial_compare(&Value::Float(1.5)), Some(Ordering::Greater));
        assert_eq!(Value::Float(-0.0).partial_compare(&Value::Integer(0)), Some(Ordering::Equal));
        assert_eq!(Value::Integer(1).partial_compare(&Value::Float(f64::NAN)), None);
    }

    #[test]
    fn test_record_builder() {
        let record = Record::new().with("id", 1).with("name", "Tee");
        assert_eq!(record.get("id"), Some(&Value::Integer(1)));
        assert_eq!(record.value("missing"), &Value::Null);
        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["id", "name"]);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("hats")), Value::Text("hats".into()));
    }
}
