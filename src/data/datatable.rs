use anyhow::{anyhow, Result};
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

use crate::data::type_inference::TypeInference;

/// Represents the data type of a value or column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    String,
    Integer,
    Float,
    Boolean,
    DateTime,
    Null,
    Mixed, // For columns with mixed types
}

impl DataType {
    /// Merge two types (for columns with mixed types)
    pub fn merge(&self, other: &DataType) -> DataType {
        if self == other {
            return *self;
        }

        match (self, other) {
            (DataType::Null, t) | (t, DataType::Null) => *t,
            (DataType::Integer, DataType::Float) | (DataType::Float, DataType::Integer) => {
                DataType::Float
            }
            _ => DataType::Mixed,
        }
    }

    /// Numeric types right-align by default when rendered
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }
}

/// A single field value of a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
    Null,
}

impl DataValue {
    /// Build a value from raw text, inferring its type
    pub fn from_string(s: &str) -> Self {
        TypeInference::parse_value(s)
    }

    /// Convert a JSON scalar into a value. Arrays and objects are kept as
    /// their JSON text so they stay searchable.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => DataValue::Null,
            JsonValue::Bool(b) => DataValue::Boolean(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    DataValue::Integer(i)
                } else {
                    n.as_f64().map(DataValue::Float).unwrap_or(DataValue::Null)
                }
            }
            JsonValue::String(s) => match TypeInference::parse_datetime(s) {
                Some(dt) => DataValue::DateTime(dt),
                None => DataValue::String(s.clone()),
            },
            other => DataValue::String(other.to_string()),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            DataValue::String(s) => JsonValue::String(s.clone()),
            DataValue::Integer(i) => JsonValue::from(*i),
            DataValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            DataValue::Boolean(b) => JsonValue::Bool(*b),
            DataValue::DateTime(dt) => JsonValue::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            DataValue::Null => JsonValue::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    pub fn data_type(&self) -> DataType {
        match self {
            DataValue::String(_) => DataType::String,
            DataValue::Integer(_) => DataType::Integer,
            DataValue::Float(_) => DataType::Float,
            DataValue::Boolean(_) => DataType::Boolean,
            DataValue::DateTime(_) => DataType::DateTime,
            DataValue::Null => DataType::Null,
        }
    }

    /// Render a date using the given chrono format; other values use Display
    pub fn format_with(&self, date_format: &str) -> String {
        match self {
            DataValue::DateTime(dt) => dt.format(date_format).to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::String(s) => write!(f, "{}", s),
            DataValue::Integer(i) => write!(f, "{}", i),
            DataValue::Float(fl) => write!(f, "{}", fl),
            DataValue::Boolean(b) => write!(f, "{}", b),
            DataValue::DateTime(dt) => {
                if dt.num_seconds_from_midnight() == 0 {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                }
            }
            DataValue::Null => write!(f, ""),
        }
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::String(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::String(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Integer(value)
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        DataValue::Integer(value as i64)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Float(value)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Boolean(value)
    }
}

impl From<NaiveDateTime> for DataValue {
    fn from(value: NaiveDateTime) -> Self {
        DataValue::DateTime(value)
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(DataValue::Null)
    }
}

/// Stable identity of a row, as issued by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Text(String),
}

impl RowId {
    /// Extract an id from a JSON value. Only integers and non-empty strings qualify.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Number(n) => n.as_i64().map(RowId::Int),
            JsonValue::String(s) if !s.is_empty() => Some(RowId::Text(s.clone())),
            _ => None,
        }
    }

    /// Extract an id from a field value
    pub fn from_value(value: &DataValue) -> Option<Self> {
        match value {
            DataValue::Integer(i) => Some(RowId::Int(*i)),
            DataValue::String(s) if !s.is_empty() => Some(RowId::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(i) => write!(f, "{}", i),
            RowId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RowId {
    fn from(value: i64) -> Self {
        RowId::Int(value)
    }
}

impl From<i32> for RowId {
    fn from(value: i32) -> Self {
        RowId::Int(value as i64)
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        RowId::Text(value.to_string())
    }
}

static NULL_VALUE: DataValue = DataValue::Null;

/// One application record. Fields keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    pub id: Option<RowId>,
    pub values: Vec<(String, DataValue)>,
}

impl DataRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<RowId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a field, replacing an existing value for the same key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<DataValue>) {
        let key = key.into();
        let value = value.into();
        match self.values.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.values.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&DataValue> {
        self.values.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Missing fields read as Null
    pub fn value_or_null(&self, key: &str) -> &DataValue {
        self.get(key).unwrap_or(&NULL_VALUE)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build a row from a JSON object. An `id` field becomes the row identity
    /// and also stays available as a regular field.
    pub fn from_json_object(object: &serde_json::Map<String, JsonValue>) -> Self {
        let mut row = DataRow::new();
        if let Some(id) = object.get("id").and_then(RowId::from_json) {
            row.id = Some(id);
        }
        for (key, value) in object {
            row.set(key.clone(), DataValue::from_json(value));
        }
        row
    }

    pub fn to_json_object(&self) -> serde_json::Map<String, JsonValue> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

/// The row collection handed to a table by its host screen
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataTable {
    pub name: String,
    pub rows: Vec<DataRow>,
    pub metadata: HashMap<String, String>,
}

fn first_duplicate_id(rows: &[DataRow]) -> Option<&RowId> {
    let mut seen: HashSet<&RowId> = HashSet::with_capacity(rows.len());
    rows.iter()
        .filter_map(|r| r.id.as_ref())
        .find(|id| !seen.insert(*id))
}

impl DataTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Build a table from rows whose ids must be unique. Rows without an id
    /// are always accepted.
    pub fn from_rows(name: impl Into<String>, rows: Vec<DataRow>) -> Result<Self> {
        let name = name.into();
        if let Some(id) = first_duplicate_id(&rows) {
            return Err(anyhow!("Duplicate row id {} in table {}", id, name));
        }
        Ok(Self {
            name,
            rows,
            metadata: HashMap::new(),
        })
    }

    /// Add a row, rejecting a duplicate id. Scans existing rows; bulk
    /// construction goes through `from_rows`.
    pub fn add_row(&mut self, row: DataRow) -> Result<()> {
        if let Some(id) = &row.id {
            if self.find_index(id).is_some() {
                return Err(anyhow!("Duplicate row id {} in table {}", id, self.name));
            }
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get_row(&self, index: usize) -> Option<&DataRow> {
        self.rows.get(index)
    }

    pub fn find_index(&self, id: &RowId) -> Option<usize> {
        self.rows.iter().position(|r| r.id.as_ref() == Some(id))
    }

    pub fn find_by_id(&self, id: &RowId) -> Option<&DataRow> {
        self.find_index(id).map(|idx| &self.rows[idx])
    }

    pub fn contains_id(&self, id: &RowId) -> bool {
        self.find_index(id).is_some()
    }

    /// Field names in first-seen order across all rows
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if !names.iter().any(|n| n == key) {
                    names.push(key.to_string());
                }
            }
        }
        names
    }

    /// Dominant type of a field across all rows
    pub fn infer_field_type(&self, key: &str) -> DataType {
        let inferred = self
            .rows
            .iter()
            .map(|row| row.value_or_null(key).data_type())
            .fold(DataType::Null, |acc, t| acc.merge(&t));
        debug!(target: "table", "Inferred type {:?} for field '{}'", inferred, key);
        inferred
    }
}
