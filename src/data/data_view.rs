use std::sync::Arc;
use tracing::debug;

use crate::data::column::ColumnDescriptor;
use crate::data::datatable::{DataRow, DataTable};
use crate::data::query_engine::{filter_rows, sort_rows, validate_sort, PageInfo};
use crate::data::query_state::{QueryState, SortSpec};

/// Inputs that decide the filtered and sorted order
#[derive(Debug, Clone, PartialEq, Eq)]
struct ViewKey {
    search_term: String,
    sort: Option<SortSpec>,
}

/// A memoized view over a DataTable.
///
/// The filtered and sorted order is kept until the row collection (by `Arc`
/// identity), the search term or the sort changes. Page changes only
/// re-slice `visible_rows`.
#[derive(Debug, Clone)]
pub struct DataView {
    /// The underlying row collection
    source: Arc<DataTable>,

    /// Row indices that are visible (after filtering and sorting)
    visible_rows: Vec<usize>,

    key: Option<ViewKey>,

    /// Number of times filter and sort actually ran
    derivations: usize,
}

impl DataView {
    /// Create a view showing all rows in source order
    pub fn new(source: Arc<DataTable>) -> Self {
        let row_count = source.row_count();
        Self {
            source,
            visible_rows: (0..row_count).collect(),
            key: None,
            derivations: 0,
        }
    }

    /// Swap the row collection. The cached order is dropped unless it is the
    /// same collection.
    pub fn set_source(&mut self, source: Arc<DataTable>) {
        if Arc::ptr_eq(&self.source, &source) {
            return;
        }
        self.visible_rows = (0..source.row_count()).collect();
        self.source = source;
        self.key = None;
    }

    /// Bring the filtered and sorted order up to date with `state`.
    /// Returns true when filter and sort had to run again.
    pub fn refresh(
        &mut self,
        columns: &[ColumnDescriptor],
        state: &QueryState,
        searchable: bool,
        date_format: &str,
    ) -> bool {
        let sort = state
            .sort
            .clone()
            .filter(|s| validate_sort(columns, &s.column).is_ok());
        let key = ViewKey {
            search_term: if searchable {
                state.search_term.clone()
            } else {
                String::new()
            },
            sort,
        };

        if self.key.as_ref() == Some(&key) {
            return false;
        }

        let mut rows = filter_rows(&self.source, columns, &key.search_term, date_format);
        if let Some(sort) = &key.sort {
            sort_rows(&self.source, &mut rows, sort);
        }

        debug!(
            target: "query",
            "Derived {} of {} rows (search='{}', sort={:?})",
            rows.len(),
            self.source.row_count(),
            key.search_term,
            key.sort
        );

        self.visible_rows = rows;
        self.key = Some(key);
        self.derivations += 1;
        true
    }

    /// Pagination for the given page request, clamped into range
    pub fn page_info(&self, page_index: usize, page_size: usize) -> PageInfo {
        PageInfo::new(self.visible_rows.len(), page_index, page_size)
    }

    /// Row indices on one page
    pub fn page_indices(&self, info: &PageInfo) -> &[usize] {
        &self.visible_rows[info.start..info.end]
    }

    /// Rows on one page
    pub fn page_rows(&self, info: &PageInfo) -> Vec<&DataRow> {
        self.page_indices(info)
            .iter()
            .map(|&idx| &self.source.rows[idx])
            .collect()
    }

    /// Number of rows after filtering
    pub fn row_count(&self) -> usize {
        self.visible_rows.len()
    }

    pub fn source(&self) -> &Arc<DataTable> {
        &self.source
    }

    /// Visible row indices (before pagination)
    pub fn visible_row_indices(&self) -> &[usize] {
        &self.visible_rows
    }

    pub fn derivation_count(&self) -> usize {
        self.derivations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datatable::{DataValue, RowId};

    fn table(n: i64) -> Arc<DataTable> {
        let rows = (0..n)
            .map(|i| {
                DataRow::new()
                    .with_id(i)
                    .with_value("name", format!("Student {}", i))
                    .with_value("grade", DataValue::Integer(n - i))
            })
            .collect();
        Arc::new(DataTable::from_rows("students", rows).unwrap())
    }

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("name", "Name").sortable(true),
            ColumnDescriptor::new("grade", "Grade").sortable(true),
        ]
    }

    #[test]
    fn test_page_change_does_not_rederive() {
        let mut view = DataView::new(table(30));
        let mut state = QueryState {
            sort: Some(SortSpec::ascending("grade")),
            ..QueryState::default()
        };
        assert!(view.refresh(&columns(), &state, true, "%Y-%m-%d"));

        state.page_index = 2;
        assert!(!view.refresh(&columns(), &state, true, "%Y-%m-%d"));
        assert_eq!(view.derivation_count(), 1);

        let info = view.page_info(state.page_index, state.page_size);
        assert_eq!(info.start, 20);
        assert_eq!(view.page_rows(&info)[0].id, Some(RowId::Int(9)));
    }

    #[test]
    fn test_same_source_keeps_cache() {
        let source = table(5);
        let mut view = DataView::new(source.clone());
        let state = QueryState::default();
        view.refresh(&columns(), &state, true, "%Y-%m-%d");
        view.set_source(source);
        assert!(!view.refresh(&columns(), &state, true, "%Y-%m-%d"));
    }

    #[test]
    fn test_new_source_rederives() {
        let mut view = DataView::new(table(5));
        let state = QueryState::default();
        view.refresh(&columns(), &state, true, "%Y-%m-%d");
        view.set_source(table(3));
        assert!(view.refresh(&columns(), &state, true, "%Y-%m-%d"));
        assert_eq!(view.row_count(), 3);
    }

    #[test]
    fn test_search_change_rederives() {
        let mut view = DataView::new(table(12));
        let mut state = QueryState::default();
        view.refresh(&columns(), &state, true, "%Y-%m-%d");
        state.search_term = "student 1".to_string();
        assert!(view.refresh(&columns(), &state, true, "%Y-%m-%d"));
        // "Student 1", "Student 10", "Student 11"
        assert_eq!(view.row_count(), 3);
    }
}
