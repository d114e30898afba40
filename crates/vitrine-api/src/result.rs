//! The `{ data, error }` result envelope
//!
//! Every terminal operation returns a [`QueryResult`]. Exactly one of `data`
//! and `error` is set; an empty sequence is valid data. The envelope
//! serializes to JSON as
//!
//! ```json
//! {"data": [...], "error": null}
//! {"data": null, "error": {"kind": "NotFound", "message": "..."}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number};
use vitrine_core::{Error, ErrorKind, Record, Result, Value};

/// Structured error carried in the envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error category
    pub kind: ErrorKind,
    /// Human-readable description
    pub message: String,
}

impl From<&Error> for ErrorInfo {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<Error> for ErrorInfo {
    fn from(err: Error) -> Self {
        Self::from(&err)
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome of one query execution
#[derive(Debug, Clone, PartialEq)]
#[must_use = "check `error` before trusting `data`"]
pub struct QueryResult<T> {
    /// Result data; `None` when the query failed
    pub data: Option<T>,
    /// Failure; `None` when the query succeeded
    pub error: Option<ErrorInfo>,
}

impl<T> QueryResult<T> {
    /// Successful result
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    /// Failed result
    pub fn err(error: impl Into<ErrorInfo>) -> Self {
        Self {
            data: None,
            error: Some(error.into()),
        }
    }

    /// Whether the query succeeded
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Kind of the failure, if any
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// Converts into a `Result`, for callers that prefer `?`
    pub fn into_result(self) -> std::result::Result<T, ErrorInfo> {
        match (self.data, self.error) {
            (_, Some(error)) => Err(error),
            (Some(data), None) => Ok(data),
            (None, None) => Err(ErrorInfo {
                kind: ErrorKind::Backend,
                message: "result carries neither data nor error".to_string(),
            }),
        }
    }

    /// Maps the data, keeping any error
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryResult<U> {
        QueryResult {
            data: self.data.map(f),
            error: self.error,
        }
    }
}

impl<T> From<Result<T>> for QueryResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::err(err),
        }
    }
}

/// Conversion of result data into JSON
pub trait ToJson {
    /// JSON representation
    fn to_json(&self) -> serde_json::Value;
}

impl ToJson for Value {
    fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::Number((*i).into()),
            // NaN and infinities have no JSON form
            Value::Float(f) => Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(ToJson::to_json).collect()),
            Value::Record(record) => record.to_json(),
        }
    }
}

impl ToJson for Record {
    fn to_json(&self) -> serde_json::Value {
        let map: Map<String, serde_json::Value> = self
            .iter()
            .map(|(column, value)| (column.to_string(), value.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl<T: ToJson> ToJson for Vec<T> {
    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.iter().map(ToJson::to_json).collect())
    }
}

impl<T: ToJson> QueryResult<T> {
    /// The envelope as a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "data": self.data.as_ref().map(ToJson::to_json),
            "error": self.error,
        })
    }

    /// The envelope as a JSON string, as a route handler would return it
    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}

/// Converts a JSON value (e.g. a request body) into a [`Value`].
pub fn value_from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        serde_json::Value::String(s) => Value::Text(s.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(value_from_json).collect()),
        serde_json::Value::Object(map) => Value::Record(
            map.iter()
                .map(|(k, v)| (k.clone(), value_from_json(v)))
                .collect(),
        ),
    }
}

/// Converts a JSON object into a [`Record`], failing with `BadRequest`
/// for anything else.
pub fn record_from_json(json: &serde_json::Value) -> Result<Record> {
    match value_from_json(json) {
        Value::Record(record) => Ok(record),
        _ => Err(Error::BadRequest("expected a JSON object".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let rows = vec![Record::new().with("id", 1).with("name", "Tee").with("is_active", true)];
        let result = QueryResult::ok(rows);

        assert_eq!(
            result.to_json(),
            json!({
                "data": [{"id": 1, "name": "Tee", "is_active": true}],
                "error": null,
            })
        );
    }

    #[test]
    fn test_error_envelope() {
        let result: QueryResult<Vec<Record>> =
            QueryResult::err(Error::NotFound("resource 'unknownTable' does not exist".into()));

        let json = result.to_json();
        assert_eq!(json["data"], serde_json::Value::Null);
        assert_eq!(json["error"]["kind"], "NotFound");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("unknownTable"));
    }

    #[test]
    fn test_empty_sequence_is_data() {
        let result: QueryResult<Vec<Record>> = QueryResult::ok(Vec::new());
        assert_eq!(result.to_json_string(), r#"{"data":[],"error":null}"#);
    }

    #[test]
    fn test_into_result() {
        assert_eq!(QueryResult::ok(3).into_result(), Ok(3));
        let failed: QueryResult<i32> = QueryResult::err(Error::SingleRow { rows: 0 });
        assert_eq!(
            failed.into_result().unwrap_err().kind,
            ErrorKind::SingleRowExpectationFailed
        );
    }

    #[test]
    fn test_json_conversion() {
        let body = json!({"name": "Cap", "price": 2500, "weight": 0.2, "tags": ["hats"], "drop_id": null});
        let record = record_from_json(&body).unwrap();

        assert_eq!(record.value("price"), &Value::Integer(2500));
        assert_eq!(record.value("weight"), &Value::Float(0.2));
        assert!(record.value("drop_id").is_null());
        assert_eq!(record.to_json(), body);

        assert!(record_from_json(&json!([1, 2])).is_err());
        assert_eq!(Value::Float(f64::NAN).to_json(), serde_json::Value::Null);
    }
}
