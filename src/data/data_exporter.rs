use anyhow::{anyhow, Context, Result};
use serde_json::Value as JsonValue;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::data::column::ColumnDescriptor;
use crate::data::datatable::DataRow;

/// Export format, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(ExportFormat::Csv),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(ExportFormat::Json),
            _ => Err(anyhow!("Cannot export to {:?}: use a .csv or .json file", path)),
        }
    }
}

/// Writes a set of rows (a page or a selection) out of the table
pub struct DataExporter;

impl DataExporter {
    /// Write rows as CSV with one column per descriptor, headed by labels.
    /// Cells hold raw values; nulls are empty.
    pub fn write_csv<W: Write>(
        writer: W,
        columns: &[ColumnDescriptor],
        rows: &[&DataRow],
    ) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(columns.iter().map(|c| c.label.as_str()))?;

        for row in rows {
            wtr.write_record(
                columns
                    .iter()
                    .map(|c| row.value_or_null(&c.key).to_string()),
            )?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Write rows as a JSON array of objects keyed by column key
    pub fn write_json<W: Write>(
        writer: W,
        columns: &[ColumnDescriptor],
        rows: &[&DataRow],
    ) -> Result<()> {
        let items: Vec<JsonValue> = rows
            .iter()
            .map(|row| {
                let object: serde_json::Map<String, JsonValue> = columns
                    .iter()
                    .map(|c| (c.key.clone(), row.value_or_null(&c.key).to_json()))
                    .collect();
                JsonValue::Object(object)
            })
            .collect();

        serde_json::to_writer_pretty(writer, &items)?;
        Ok(())
    }

    /// Export to a file, format chosen by extension. Returns a status message.
    pub fn export_to_file(
        path: &Path,
        columns: &[ColumnDescriptor],
        rows: &[&DataRow],
    ) -> Result<String> {
        if rows.is_empty() {
            return Err(anyhow!("No data to export"));
        }

        let format = ExportFormat::from_path(path)?;
        let file = File::create(path)
            .with_context(|| format!("Failed to create export file: {:?}", path))?;

        match format {
            ExportFormat::Csv => Self::write_csv(file, columns, rows)?,
            ExportFormat::Json => Self::write_json(file, columns, rows)?,
        }

        info!(target: "table", "Exported {} rows to {:?}", rows.len(), path);
        Ok(format!("Exported {} rows to {}", rows.len(), path.display()))
    }
}
