//! # Result Records
//!
//! Provides [`Record`] and [`RecordList`], thin read-only views over the
//! JSON replies of `…j` commands.
//!
//! radare2's JSON output is schemaless from release to release, so these
//! types do not model fields statically. Field access returns [`Option`]:
//! a missing field or a field of the wrong type is absent, never an error
//! and never a panic. Shape errors (a reply that is not an object or not an
//! array of objects) are the only hard failures.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::addr::Addr;
use crate::errors::{R2Error, Result};

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One JSON object from a reply
///
/// ```
/// use r2kit::record::Record;
///
/// let v = serde_json::json!({"name": "main", "offset": 4198400});
/// let rec = Record::from_value(v).unwrap();
/// assert_eq!(rec.get_str("name"), Some("main"));
/// assert_eq!(rec.get_u64("offset"), Some(4198400));
/// assert_eq!(rec.get_str("signature"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Wraps a parsed JSON value, requiring an object
    ///
    /// # Errors
    ///
    /// Fails with [`R2Error::UnexpectedShape`] when the value is anything
    /// but a JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(R2Error::UnexpectedShape {
                expected: "object",
                got: value_kind(&other),
            }),
        }
    }

    /// Raw field access
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    #[must_use]
    pub fn get_u64(&self, field: &str) -> Option<u64> {
        self.get(field).and_then(Value::as_u64)
    }

    #[must_use]
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    #[must_use]
    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    /// Numeric field read as an [`Addr`]
    #[must_use]
    pub fn get_addr(&self, field: &str) -> Option<Addr> {
        self.get_u64(field).map(Addr::from)
    }

    /// Nested object field as its own [`Record`]
    #[must_use]
    pub fn get_record(&self, field: &str) -> Option<Record> {
        match self.get(field) {
            Some(Value::Object(map)) => Some(Record(map.clone())),
            _ => None,
        }
    }

    /// The field names present in this record
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Gives the underlying JSON object back
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// A JSON array of objects from a reply
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RecordList(Vec<Record>);

impl RecordList {
    /// Wraps a parsed JSON value, requiring an array of objects
    ///
    /// # Errors
    ///
    /// Fails with [`R2Error::UnexpectedShape`] when the value is not an
    /// array or any element is not an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(Record::from_value)
                .collect::<Result<Vec<_>>>()
                .map(Self),
            other => Err(R2Error::UnexpectedShape {
                expected: "array",
                got: value_kind(&other),
            }),
        }
    }

    /// Like [`RecordList::from_value`], with an absent reply counting as an
    /// empty list
    ///
    /// # Errors
    ///
    /// Same shape requirements as [`RecordList::from_value`] for present
    /// values.
    pub fn from_opt(value: Option<Value>) -> Result<Self> {
        match value {
            Some(v) => Self::from_value(v),
            None => Ok(Self::default()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.0.get(index)
    }

    #[must_use]
    pub fn first(&self) -> Option<&Record> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.0.iter()
    }
}

impl IntoIterator for RecordList {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordList {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
