//! Shared type inference logic for data loaders
//!
//! CSV cells arrive as text; this module decides which tagged value each
//! cell becomes so that sorting compares numbers numerically and dates
//! chronologically.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

use crate::data::datatable::DataValue;

/// Static compiled regex patterns for date detection
static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // YYYY-MM-DD
        Regex::new(r"^(19|20)\d{2}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").unwrap(),
        // DD/MM/YYYY (the console is used by a Brazilian school)
        Regex::new(r"^(0[1-9]|[12]\d|3[01])/(0[1-9]|1[0-2])/(19|20)\d{2}$").unwrap(),
        // YYYY-MM-DD HH:MM:SS or YYYY-MM-DDTHH:MM:SS, optional fraction and zone
        Regex::new(
            r"^(19|20)\d{2}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])[T ]\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$",
        )
        .unwrap(),
    ]
});

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Detected data type for a value or column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferredType {
    Boolean,
    Integer,
    Float,
    DateTime,
    String,
    Null,
}

/// Type inference utilities
pub struct TypeInference;

impl TypeInference {
    /// Infer the type of a single string value
    ///
    /// Order of checks matters: booleans and numbers are cheap, the date
    /// regexes run last.
    pub fn infer_from_string(value: &str) -> InferredType {
        if value.is_empty() || value.eq_ignore_ascii_case("null") {
            return InferredType::Null;
        }

        if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
            return InferredType::Boolean;
        }

        if value.parse::<i64>().is_ok() {
            return InferredType::Integer;
        }

        if value.parse::<f64>().is_ok() {
            return InferredType::Float;
        }

        if Self::looks_like_datetime(value) {
            return InferredType::DateTime;
        }

        InferredType::String
    }

    /// Check if a string looks like a datetime value
    ///
    /// Uses strict patterns so ids like "TURMA-2024-01" stay strings.
    pub fn looks_like_datetime(value: &str) -> bool {
        if value.len() < 8 || value.len() > 35 {
            return false;
        }

        DATE_PATTERNS.iter().any(|pattern| pattern.is_match(value))
    }

    /// Parse a date or datetime string. Zoned timestamps are normalized to UTC.
    pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
        if !Self::looks_like_datetime(value) {
            return None;
        }

        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
            return Some(dt.naive_utc());
        }

        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
                return Some(dt);
            }
        }

        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    /// Convert raw text into a typed value
    pub fn parse_value(value: &str) -> DataValue {
        let trimmed = value.trim();
        match Self::infer_from_string(trimmed) {
            InferredType::Null => DataValue::Null,
            InferredType::Boolean => DataValue::Boolean(trimmed.eq_ignore_ascii_case("true")),
            InferredType::Integer => trimmed
                .parse::<i64>()
                .map(DataValue::Integer)
                .unwrap_or_else(|_| DataValue::String(value.to_string())),
            InferredType::Float => trimmed
                .parse::<f64>()
                .map(DataValue::Float)
                .unwrap_or_else(|_| DataValue::String(value.to_string())),
            InferredType::DateTime => Self::parse_datetime(trimmed)
                .map(DataValue::DateTime)
                .unwrap_or_else(|| DataValue::String(value.to_string())),
            InferredType::String => DataValue::String(value.to_string()),
        }
    }

    /// Merge two types when a column has mixed types
    ///
    /// Rules:
    /// - Same type -> keep it
    /// - Null with anything -> the other type
    /// - Integer + Float -> Float
    /// - Everything else -> String
    pub fn merge_types(type1: InferredType, type2: InferredType) -> InferredType {
        use InferredType::*;

        match (type1, type2) {
            (t1, t2) if t1 == t2 => t1,
            (Null, t) | (t, Null) => t,
            (Integer, Float) | (Float, Integer) => Float,
            _ => String,
        }
    }

    /// Infer a column type from a sample of values
    pub fn infer_from_samples<'a, I>(values: I) -> InferredType
    where
        I: Iterator<Item = &'a str>,
    {
        let mut result_type = InferredType::Null;

        for value in values {
            result_type = Self::merge_types(result_type, Self::infer_from_string(value));

            // Early exit once degraded to String
            if result_type == InferredType::String {
                break;
            }
        }

        result_type
    }
}
