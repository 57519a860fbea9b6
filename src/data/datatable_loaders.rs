use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use serde_json::Value as JsonValue;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

use crate::data::datatable::{DataRow, DataTable, DataValue, RowId};
use crate::data::type_inference::{InferredType, TypeInference};

/// Rows sampled per column to decide its type
const TYPE_SAMPLE_SIZE: usize = 100;

/// Load a CSV file into a DataTable
pub fn load_csv_to_datatable<P: AsRef<Path>>(path: P, table_name: &str) -> Result<DataTable> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path.as_ref()))?;

    let mut table = read_csv_to_datatable(file, table_name)?;
    table
        .metadata
        .insert("source_path".to_string(), path.as_ref().display().to_string());
    Ok(table)
}

/// Read CSV with a header row from any reader.
///
/// Each column gets one type from a sample of its cells, so a column of
/// codes like "007" next to "A12" stays text. An `id` column supplies row ids.
pub fn read_csv_to_datatable<R: Read>(reader: R, table_name: &str) -> Result<DataTable> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut string_rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        string_rows.push(record.iter().map(|s| s.to_string()).collect::<Vec<String>>());
    }

    let column_types: Vec<InferredType> = (0..headers.len())
        .map(|col_idx| {
            TypeInference::infer_from_samples(
                string_rows
                    .iter()
                    .take(TYPE_SAMPLE_SIZE)
                    .filter_map(|row| row.get(col_idx))
                    .map(|s| s.as_str()),
            )
        })
        .collect();

    debug!(target: "loader", "CSV column types: {:?}", column_types);

    let mut rows = Vec::with_capacity(string_rows.len());
    for string_row in string_rows {
        let mut row = DataRow::new();
        for (col_idx, header) in headers.iter().enumerate() {
            let raw = string_row.get(col_idx).map(|s| s.as_str()).unwrap_or("");
            let value = match column_types[col_idx] {
                InferredType::String if !raw.is_empty() => DataValue::String(raw.to_string()),
                _ => TypeInference::parse_value(raw),
            };
            row.set(header.clone(), value);
        }
        row.id = row.get("id").and_then(RowId::from_value);
        rows.push(row);
    }

    let mut table = DataTable::from_rows(table_name, rows)?;
    table
        .metadata
        .insert("source_type".to_string(), "csv".to_string());

    info!(target: "loader", "Loaded {} rows from CSV into '{}'", table.row_count(), table_name);
    Ok(table)
}

/// Load a JSON file into a DataTable
pub fn load_json_to_datatable<P: AsRef<Path>>(path: P, table_name: &str) -> Result<DataTable> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open JSON file: {:?}", path.as_ref()))?;

    let json: JsonValue = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse JSON file: {:?}", path.as_ref()))?;

    let mut table = json_to_datatable(&json, table_name)?;
    table
        .metadata
        .insert("source_path".to_string(), path.as_ref().display().to_string());
    Ok(table)
}

/// Convert a JSON array of objects into a DataTable. The backend's paged
/// envelope (`{"data": [...]}`) is unwrapped as well.
pub fn json_to_datatable(json: &JsonValue, table_name: &str) -> Result<DataTable> {
    let items = match json {
        JsonValue::Array(items) => items,
        JsonValue::Object(obj) => match obj.get("data") {
            Some(JsonValue::Array(items)) => items,
            _ => return Err(anyhow!("JSON object has no 'data' array")),
        },
        _ => return Err(anyhow!("JSON must be an array of objects")),
    };

    let rows = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            item.as_object()
                .map(DataRow::from_json_object)
                .ok_or_else(|| anyhow!("Item {} is not a JSON object", idx))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut table = DataTable::from_rows(table_name, rows)?;
    table
        .metadata
        .insert("source_type".to_string(), "json".to_string());

    info!(target: "loader", "Loaded {} rows from JSON into '{}'", table.row_count(), table_name);
    Ok(table)
}

/// Load by file extension (.csv or .json)
pub fn load_file_to_datatable<P: AsRef<Path>>(path: P) -> Result<DataTable> {
    let path = path.as_ref();
    let table_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("data")
        .to_string();

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => load_csv_to_datatable(path, &table_name),
        Some(ext) if ext.eq_ignore_ascii_case("json") => load_json_to_datatable(path, &table_name),
        _ => Err(anyhow!("Unsupported file type: {:?} (expected .csv or .json)", path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_column_types() {
        let csv = "id,name,code,fee\n1,Ana,007,150.5\n2,Bruno,A12,\n";
        let table = read_csv_to_datatable(csv.as_bytes(), "students").unwrap();
        assert_eq!(table.row_count(), 2);

        let first = &table.rows[0];
        assert_eq!(first.id, Some(RowId::Int(1)));
        assert_eq!(first.get("code"), Some(&DataValue::String("007".to_string())));
        assert_eq!(first.get("fee"), Some(&DataValue::Float(150.5)));
        assert_eq!(table.rows[1].get("fee"), Some(&DataValue::Null));
    }

    #[test]
    fn test_json_envelope_unwrapped() {
        let json = serde_json::json!({"data": [{"id": "a1", "name": "Unit A"}]});
        let table = json_to_datatable(&json, "units").unwrap();
        assert_eq!(table.rows[0].id, Some(RowId::Text("a1".to_string())));
    }

    #[test]
    fn test_csv_duplicate_id_rejected() {
        let csv = "id,name\n1,Ana\n2,Bruno\n1,Carla\n";
        let err = read_csv_to_datatable(csv.as_bytes(), "students").unwrap_err();
        assert!(err.to_string().contains("Duplicate row id 1"));
    }

    #[test]
    fn test_large_csv_loads_with_unique_ids() {
        let mut csv = String::from("id,name,fee\n");
        for i in 0..50_000 {
            csv.push_str(&format!("{},Student {},{}.5\n", i, i, i % 300));
        }

        let table = read_csv_to_datatable(csv.as_bytes(), "students").unwrap();
        assert_eq!(table.row_count(), 50_000);
        assert!(table.contains_id(&RowId::Int(49_999)));
        assert_eq!(table.rows[42].get("fee"), Some(&DataValue::Float(42.5)));
    }

    #[test]
    fn test_large_json_loads_with_unique_ids() {
        let items: Vec<JsonValue> = (0..50_000)
            .map(|i| serde_json::json!({"id": format!("s{}", i), "name": "Student"}))
            .collect();
        let table = json_to_datatable(&JsonValue::Array(items), "students").unwrap();
        assert_eq!(table.row_count(), 50_000);
        assert_eq!(table.rows[7].id, Some(RowId::Text("s7".to_string())));
    }

    #[test]
    fn test_json_duplicate_id_rejected() {
        let json = serde_json::json!([{"id": 3, "name": "A"}, {"id": 3, "name": "B"}]);
        assert!(json_to_datatable(&json, "units").is_err());
    }

    #[test]
    fn test_json_rejects_scalars() {
        let json = serde_json::json!([1, 2]);
        assert!(json_to_datatable(&json, "bad").is_err());
    }
}
