//! Pure filter -> sort -> paginate pipeline.
//!
//! Everything here is a function of `(rows, columns, query state)` and can
//! be re-run at any time with identical results. Row positions refer to
//! indices into `DataTable::rows`.

use anyhow::{anyhow, Result};
use tracing::trace;

use crate::data::column::ColumnDescriptor;
use crate::data::datatable::DataTable;
use crate::data::datavalue_compare::compare_for_sort;
use crate::data::query_state::{QueryState, SortSpec};

/// The result of one derivation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedView {
    /// Filtered and sorted row indices
    pub ordered_rows: Vec<usize>,
    /// Row indices on the requested page
    pub page_rows: Vec<usize>,
    /// Page index after clamping into range
    pub page_index: usize,
    pub page_size: usize,
}

impl DerivedView {
    pub fn total(&self) -> usize {
        self.ordered_rows.len()
    }

    pub fn page_info(&self) -> PageInfo {
        PageInfo::new(self.total(), self.page_index, self.page_size)
    }
}

/// Pagination arithmetic for one page of a filtered result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub total: usize,
    pub page_index: usize,
    pub page_size: usize,
    /// First offset on the page (inclusive)
    pub start: usize,
    /// One past the last offset on the page
    pub end: usize,
}

impl PageInfo {
    pub fn new(total: usize, page_index: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let page_index = clamp_page_index(total, page_index, page_size);
        let (start, end) = page_bounds(total, page_index, page_size);
        Self {
            total,
            page_index,
            page_size,
            start,
            end,
        }
    }

    pub fn page_count(&self) -> usize {
        page_count(self.total, self.page_size)
    }

    /// "21-25 of 25" style label; "0-0 of 0" when nothing is shown
    pub fn range_label(&self) -> String {
        if self.total == 0 {
            return "0-0 of 0".to_string();
        }
        format!("{}-{} of {}", self.start + 1, self.end, self.total)
    }

    pub fn has_previous(&self) -> bool {
        self.page_index > 0
    }

    pub fn has_next(&self) -> bool {
        self.page_index + 1 < self.page_count()
    }
}

/// True when the row at `row_idx` matches in some searchable column, either
/// on the value's canonical text or on the cell text as rendered.
/// `needle` must already be lowercase.
fn row_matches(
    table: &DataTable,
    columns: &[ColumnDescriptor],
    row_idx: usize,
    needle: &str,
    date_format: &str,
) -> bool {
    let row = &table.rows[row_idx];
    columns.iter().filter(|c| c.searchable).any(|column| {
        match row.get(&column.key) {
            Some(value) if !value.is_null() => {
                value.to_string().to_lowercase().contains(needle)
                    || column
                        .display_value(value, "", date_format)
                        .to_lowercase()
                        .contains(needle)
            }
            _ => false,
        }
    })
}

/// Keep rows where some searchable column contains `term`, case-insensitively.
/// An empty term keeps every row.
pub fn filter_rows(
    table: &DataTable,
    columns: &[ColumnDescriptor],
    term: &str,
    date_format: &str,
) -> Vec<usize> {
    if term.is_empty() {
        return (0..table.row_count()).collect();
    }

    let needle = term.to_lowercase();
    let rows: Vec<usize> = (0..table.row_count())
        .filter(|&idx| row_matches(table, columns, idx, &needle, date_format))
        .collect();
    trace!(target: "query", "Search '{}' kept {} of {} rows", term, rows.len(), table.row_count());
    rows
}

/// Stable sort of row indices by one column, nulls last
pub fn sort_rows(table: &DataTable, rows: &mut [usize], sort: &SortSpec) {
    rows.sort_by(|&a, &b| {
        let val_a = table.rows[a].value_or_null(&sort.column);
        let val_b = table.rows[b].value_or_null(&sort.column);
        compare_for_sort(val_a, val_b, sort.direction)
    });
}

/// Check that a sort targets a known, sortable column
pub fn validate_sort(columns: &[ColumnDescriptor], column_key: &str) -> Result<()> {
    match columns.iter().find(|c| c.key == column_key) {
        None => Err(anyhow!("Unknown sort column '{}'", column_key)),
        Some(column) if !column.sortable => {
            Err(anyhow!("Column '{}' is not sortable", column_key))
        }
        Some(_) => Ok(()),
    }
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

/// Clamp a page index to the last page holding rows (0 when empty)
pub fn clamp_page_index(total: usize, page_index: usize, page_size: usize) -> usize {
    let pages = page_count(total, page_size);
    if pages == 0 {
        0
    } else {
        page_index.min(pages - 1)
    }
}

/// Offsets `[start, end)` of a page, clamped to `total`
pub fn page_bounds(total: usize, page_index: usize, page_size: usize) -> (usize, usize) {
    let start = page_index.saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);
    (start, end)
}

/// Slice the page out of already ordered rows
pub fn paginate(ordered: &[usize], page_index: usize, page_size: usize) -> Vec<usize> {
    let (start, end) = page_bounds(ordered.len(), page_index, page_size);
    ordered[start..end].to_vec()
}

/// Run the whole pipeline. Sort keys that name no column are ignored here
/// (mutators reject them before they reach the state). `date_format` is the
/// one cells render with, so search matches what is on screen.
pub fn derive_view(
    table: &DataTable,
    columns: &[ColumnDescriptor],
    state: &QueryState,
    searchable: bool,
    date_format: &str,
) -> DerivedView {
    let term = if searchable { state.search_term.as_str() } else { "" };
    let mut ordered_rows = filter_rows(table, columns, term, date_format);

    if let Some(sort) = &state.sort {
        if validate_sort(columns, &sort.column).is_ok() {
            sort_rows(table, &mut ordered_rows, sort);
        }
    }

    let page_index = clamp_page_index(ordered_rows.len(), state.page_index, state.page_size);
    let page_rows = paginate(&ordered_rows, page_index, state.page_size);

    DerivedView {
        ordered_rows,
        page_rows,
        page_index,
        page_size: state.page_size.max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datatable::{DataRow, DataValue};

    const ISO_DATE: &str = "%Y-%m-%d";

    fn people() -> DataTable {
        DataTable::from_rows(
            "people",
            vec![
                DataRow::new().with_id(1).with_value("name", "Alice").with_value("dept", "Math"),
                DataRow::new().with_id(2).with_value("name", "Bob").with_value("dept", "CS"),
            ],
        )
        .unwrap()
    }

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("name", "Name").sortable(true),
            ColumnDescriptor::new("dept", "Dept"),
        ]
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let table = people();
        assert_eq!(filter_rows(&table, &columns(), "al", ISO_DATE), vec![0]);
        assert_eq!(filter_rows(&table, &columns(), "CS", ISO_DATE), vec![1]);
        assert_eq!(filter_rows(&table, &columns(), "", ISO_DATE), vec![0, 1]);
    }

    #[test]
    fn test_filter_skips_unsearchable_columns() {
        let table = people();
        let cols = vec![
            ColumnDescriptor::new("name", "Name"),
            ColumnDescriptor::new("dept", "Dept").searchable(false),
        ];
        assert!(filter_rows(&table, &cols, "math", ISO_DATE).is_empty());
    }

    #[test]
    fn test_null_never_matches() {
        let table = DataTable::from_rows(
            "t",
            vec![DataRow::new().with_value("name", DataValue::Null)],
        )
        .unwrap();
        let cols = vec![ColumnDescriptor::new("name", "Name")];
        assert!(filter_rows(&table, &cols, "null", ISO_DATE).is_empty());
    }

    #[test]
    fn test_filter_matches_rendered_date_text() {
        let born = chrono::NaiveDate::from_ymd_opt(2001, 3, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let table = DataTable::from_rows(
            "students",
            vec![
                DataRow::new().with_id(1).with_value("birth_date", born),
                DataRow::new().with_id(2).with_value("birth_date", DataValue::Null),
            ],
        )
        .unwrap();
        let cols = vec![ColumnDescriptor::new("birth_date", "Birth date")];

        // Shown as 15/03/2001; the canonical form still matches too
        assert_eq!(filter_rows(&table, &cols, "15/03", "%d/%m/%Y"), vec![0]);
        assert_eq!(filter_rows(&table, &cols, "2001-03", "%d/%m/%Y"), vec![0]);
        assert!(filter_rows(&table, &cols, "15/03", ISO_DATE).is_empty());
    }

    #[test]
    fn test_filter_matches_custom_formatted_text() {
        let table = DataTable::from_rows(
            "fees",
            vec![DataRow::new().with_id(1).with_value("fee", 150.5)],
        )
        .unwrap();
        let cols = vec![ColumnDescriptor::new("fee", "Fee")
            .format(|v| Ok(format!("R$ {}", v)))];
        assert_eq!(filter_rows(&table, &cols, "r$ 150", ISO_DATE), vec![0]);
    }

    #[test]
    fn test_page_bounds_clamp() {
        assert_eq!(page_bounds(25, 2, 10), (20, 25));
        assert_eq!(page_bounds(25, 5, 10), (25, 25));
        assert_eq!(clamp_page_index(25, 9, 10), 2);
        assert_eq!(clamp_page_index(0, 3, 10), 0);
    }

    #[test]
    fn test_range_label() {
        assert_eq!(PageInfo::new(25, 2, 10).range_label(), "21-25 of 25");
        assert_eq!(PageInfo::new(0, 0, 10).range_label(), "0-0 of 0");
        assert_eq!(PageInfo::new(7, 0, 5).range_label(), "1-5 of 7");
    }

    #[test]
    fn test_validate_sort() {
        let cols = columns();
        assert!(validate_sort(&cols, "name").is_ok());
        assert!(validate_sort(&cols, "dept").is_err());
        assert!(validate_sort(&cols, "missing").is_err());
    }

    #[test]
    fn test_derive_view_clamps_page() {
        let table = people();
        let state = QueryState {
            page_index: 4,
            page_size: 5,
            ..QueryState::default()
        };
        let view = derive_view(&table, &columns(), &state, true, ISO_DATE);
        assert_eq!(view.page_index, 0);
        assert_eq!(view.page_rows, vec![0, 1]);
    }

    #[test]
    fn test_search_ignored_when_table_not_searchable() {
        let table = people();
        let state = QueryState {
            search_term: "zzz".to_string(),
            ..QueryState::default()
        };
        let view = derive_view(&table, &columns(), &state, false, ISO_DATE);
        assert_eq!(view.total(), 2);
    }
}
