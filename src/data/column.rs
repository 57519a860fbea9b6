//! Column descriptors: how one field of a row is labelled, searched,
//! sorted and formatted.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::data::datatable::{DataTable, DataValue};

/// Caller-supplied cell formatter
pub type FormatFn = Arc<dyn Fn(&DataValue) -> Result<String> + Send + Sync>;

/// Text alignment within a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone)]
pub struct ColumnDescriptor {
    pub key: String,
    pub label: String,
    pub sortable: bool,
    pub searchable: bool,
    pub align: Align,
    pub min_width: Option<u16>,
    format: Option<FormatFn>,
}

impl fmt::Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("sortable", &self.sortable)
            .field("searchable", &self.searchable)
            .field("align", &self.align)
            .field("min_width", &self.min_width)
            .field("format", &self.format.is_some())
            .finish()
    }
}

impl ColumnDescriptor {
    /// A column is searchable by default and not sortable until asked
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            sortable: false,
            searchable: true,
            align: Align::Left,
            min_width: None,
            format: None,
        }
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn min_width(mut self, width: u16) -> Self {
        self.min_width = Some(width);
        self
    }

    pub fn format<F>(mut self, format: F) -> Self
    where
        F: Fn(&DataValue) -> Result<String> + Send + Sync + 'static,
    {
        self.format = Some(Arc::new(format));
        self
    }

    pub fn has_format(&self) -> bool {
        self.format.is_some()
    }

    /// Display text for a cell.
    ///
    /// A failing formatter is logged and the raw value is shown instead, so
    /// one bad row cannot blank the page. Nulls render as `null_display`
    /// without reaching the formatter.
    pub fn display_value(&self, value: &DataValue, null_display: &str, date_format: &str) -> String {
        if value.is_null() {
            return null_display.to_string();
        }

        match &self.format {
            Some(format) => match format(value) {
                Ok(text) => text,
                Err(e) => {
                    warn!(target: "table", "Formatter for column '{}' failed on {:?}: {}", self.key, value, e);
                    value.format_with(date_format)
                }
            },
            None => value.format_with(date_format),
        }
    }
}

/// Build descriptors for every field in the table, sortable and searchable,
/// right-aligning numeric fields.
pub fn infer_columns(table: &DataTable) -> Vec<ColumnDescriptor> {
    table
        .field_names()
        .into_iter()
        .map(|key| {
            let align = if table.infer_field_type(&key).is_numeric() {
                Align::Right
            } else {
                Align::Left
            };
            ColumnDescriptor::new(key.clone(), key)
                .sortable(true)
                .align(align)
        })
        .collect()
}
