//! Audit event records and field lookup.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Default location of the event type inside an audit event.
pub const DEFAULT_TYPE_FIELD: &str = "data.eventType";
/// Default location of the event name inside an audit event.
pub const DEFAULT_NAME_FIELD: &str = "data.eventName";

/// One event as returned by the audit service.
///
/// Treated as opaque JSON; only the type and name fields are ever looked at.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord(Value);

impl EventRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// String value at `path`, if present and a string.
    pub fn field(&self, path: &FieldPath) -> Option<&str> {
        path.lookup(&self.0).and_then(Value::as_str)
    }
}

impl From<Value> for EventRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl Serialize for EventRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Dotted path into a JSON object, e.g. `data.eventName`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Walk the path through nested objects.
    pub fn lookup<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        self.segments
            .iter()
            .try_fold(value, |current, key| current.get(key.as_str()))
    }
}

impl FromStr for FieldPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<String> = s.split('.').map(str::to_string).collect();
        if segments.iter().any(|seg| seg.is_empty()) {
            return Err(format!("invalid field path '{}'", s));
        }
        Ok(Self { segments })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Which record fields drive filtering and tallying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFields {
    /// Categorical field matched against filter patterns
    pub type_field: FieldPath,
    /// Field counted in the frequency tally
    pub name_field: FieldPath,
}

impl RecordFields {
    pub fn new(type_field: &str, name_field: &str) -> Result<Self, String> {
        Ok(Self {
            type_field: type_field.parse()?,
            name_field: name_field.parse()?,
        })
    }
}

impl Default for RecordFields {
    fn default() -> Self {
        Self {
            type_field: FieldPath {
                segments: vec!["data".to_string(), "eventType".to_string()],
            },
            name_field: FieldPath {
                segments: vec!["data".to_string(), "eventName".to_string()],
            },
        }
    }
}
