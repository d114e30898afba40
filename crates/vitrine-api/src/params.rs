//! Request parameter forwarding
//!
//! Route handlers take a URL query string and forward it into a [`Query`]:
//!
//! ```text
//! GET /api/products?select=id,name&category_id=eq.3&price=lt.5000&order=price.desc&limit=20
//! ```
//!
//! | parameter | meaning |
//! |---|---|
//! | `select=<spec>` | projection, as for [`ResourceHandle::select`] |
//! | `order=<col>[.asc\|.desc]` | sort key |
//! | `limit=<n>`, `offset=<n>` | pagination |
//! | `<col>=<op>.<value>` | filter, `op` one of `eq neq lt lte gt gte in` |
//!
//! `in` takes a parenthesized list: `size=in.(M,L,XL)`. Values are typed:
//! `null`, `true`/`false`, integers and floats become those values, anything
//! else is text. Double quotes force text: `sku=eq."0042"`.

use crate::query::{Query, ResourceHandle};
use crate::result::QueryResult;
use crate::Client;
use percent_encoding::percent_decode_str;
use vitrine_core::query::{Direction, FilterOp};
use vitrine_core::{Error, Record, Result, Value};

/// Parsed query-string parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
    /// `select`, `*` when absent
    pub select: Option<String>,
    /// Filters in request order
    pub filters: Vec<Filter>,
    /// Order keys in request order
    pub order: Vec<(String, Direction)>,
    /// `limit`
    pub limit: Option<usize>,
    /// `offset`
    pub offset: Option<usize>,
}

/// One `<col>=<op>.<value>` parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Column or `relation.column` path
    pub column: String,
    /// Comparison
    pub op: FilterOp,
    /// Typed operand; a list for `in`
    pub value: Value,
}

impl RequestParams {
    /// Parses a raw query string (without the leading `?`).
    ///
    /// # Errors
    ///
    /// Returns `Error::BadRequest` for malformed pairs, unknown operators or
    /// non-numeric `limit`/`offset`.
    pub fn parse(query_string: &str) -> Result<Self> {
        let query_string = query_string.strip_prefix('?').unwrap_or(query_string);

        // form_urlencoded replaces invalid UTF-8; reject it instead
        if percent_decode_str(query_string).decode_utf8().is_err() {
            return Err(Error::BadRequest(
                "query string is not valid UTF-8 once decoded".to_string(),
            ));
        }

        Self::from_pairs(form_urlencoded::parse(query_string.as_bytes()))
    }

    /// Builds parameters from already decoded key/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = Self::default();

        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                "select" => params.select = Some(value.to_string()),
                "order" => {
                    for key in value.split(',').filter(|k| !k.is_empty()) {
                        params.order.push(parse_order(key)?);
                    }
                }
                "limit" => params.limit = Some(parse_count(key, value)?),
                "offset" => params.offset = Some(parse_count(key, value)?),
                column => params.filters.push(parse_filter(column, value)?),
            }
        }

        Ok(params)
    }

    /// Builds the query these parameters describe on `handle`.
    pub fn apply(&self, handle: &ResourceHandle) -> Query {
        let mut query = handle.select(self.select.as_deref().unwrap_or("*"));

        for filter in &self.filters {
            query = query.filter(&filter.column, filter.op, filter.value.clone());
        }
        for (column, direction) in &self.order {
            query = query.order(column, *direction);
        }
        if let Some(offset) = self.offset {
            query = query.offset(offset);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }

        query
    }
}

/// Runs a read on `resource` described by a raw query string, as a route
/// handler does. Parse failures come back in the envelope like any other
/// error.
pub async fn forward(client: &Client, resource: &str, query_string: &str) -> QueryResult<Vec<Record>> {
    match RequestParams::parse(query_string) {
        Ok(params) => params.apply(&client.from(resource)).await,
        Err(err) => QueryResult::err(err),
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::BadRequest(format!("{} must be a non-negative integer, got '{}'", key, value)))
}

fn parse_order(key: &str) -> Result<(String, Direction)> {
    let (column, direction) = match key.rsplit_once('.') {
        Some((column, "asc")) => (column, Direction::Ascending),
        Some((column, "desc")) => (column, Direction::Descending),
        _ => (key, Direction::Ascending),
    };

    if column.is_empty() {
        return Err(Error::BadRequest(format!("invalid order '{}'", key)));
    }
    Ok((column.to_string(), direction))
}

fn parse_filter(column: &str, value: &str) -> Result<Filter> {
    let (op, operand) = value.split_once('.').ok_or_else(|| {
        Error::BadRequest(format!(
            "filter '{}' must look like <op>.<value>, got '{}'",
            column, value
        ))
    })?;

    let op = match op {
        "eq" => FilterOp::Eq,
        "neq" => FilterOp::Neq,
        "lt" => FilterOp::Lt,
        "lte" => FilterOp::Lte,
        "gt" => FilterOp::Gt,
        "gte" => FilterOp::Gte,
        "in" => FilterOp::In,
        other => {
            return Err(Error::BadRequest(format!(
                "unknown filter operator '{}' on '{}'",
                other, column
            )))
        }
    };

    let value = if op == FilterOp::In {
        let inner = operand
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(|| {
                Error::BadRequest(format!("'in' filter on '{}' needs a (list)", column))
            })?;
        Value::List(split_list(inner).into_iter().map(parse_scalar).collect())
    } else {
        parse_scalar(operand)
    };

    Ok(Filter {
        column: column.to_string(),
        op,
        value,
    })
}

/// Splits an `in` list on commas outside double quotes.
fn split_list(inner: &str) -> Vec<&str> {
    if inner.trim().is_empty() {
        return Vec::new();
    }

    let mut items = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (i, ch) in inner.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                items.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(inner[start..].trim());
    items
}

fn parse_scalar(raw: &str) -> Value {
    if let Some(text) = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return Value::Text(text.to_string());
    }

    match raw {
        "null" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(i) = raw.parse::<i64>() {
                Value::Integer(i)
            } else if let Some(f) = raw.parse::<f64>().ok().filter(|f| f.is_finite()) {
                Value::Float(f)
            } else {
                Value::Text(raw.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalar() {
        assert_eq!(parse_scalar("null"), Value::Null);
        assert_eq!(parse_scalar("true"), Value::Bool(true));
        assert_eq!(parse_scalar("42"), Value::Integer(42));
        assert_eq!(parse_scalar("-1.5"), Value::Float(-1.5));
        assert_eq!(parse_scalar("hats"), Value::from("hats"));
        assert_eq!(parse_scalar("\"0042\""), Value::from("0042"));
        assert_eq!(parse_scalar("inf"), Value::from("inf"));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("M, L ,XL"), vec!["M", "L", "XL"]);
        assert_eq!(split_list("\"a,b\",c"), vec!["\"a,b\"", "c"]);
        assert!(split_list(" ").is_empty());
    }

    #[test]
    fn test_parse_order() {
        assert_eq!(
            parse_order("price.desc").unwrap(),
            ("price".to_string(), Direction::Descending)
        );
        assert_eq!(
            parse_order("created_at").unwrap(),
            ("created_at".to_string(), Direction::Ascending)
        );
        assert!(parse_order(".asc").is_err());
    }

    #[test]
    fn test_parse_decodes_pairs() {
        let params = RequestParams::parse("name=eq.Autumn+capsule&slug=eq.caf%C3%A9").unwrap();
        assert_eq!(params.filters[0].value, Value::from("Autumn capsule"));
        assert_eq!(params.filters[1].value, Value::from("café"));
        assert!(RequestParams::parse("slug=eq.%FF").is_err());
    }

    #[test]
    fn test_parse_key_without_value() {
        // A bare key is an empty value, which no parameter accepts
        for raw in ["price", "limit", "order=price&offset"] {
            let err = RequestParams::parse(raw).unwrap_err();
            assert_eq!(err.kind(), vitrine_core::ErrorKind::BadRequest, "{}", raw);
        }
    }
}
