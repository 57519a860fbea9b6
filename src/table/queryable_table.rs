use anyhow::{anyhow, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::data::column::ColumnDescriptor;
use crate::data::data_view::DataView;
use crate::data::datatable::{DataRow, DataTable, RowId};
use crate::data::query_engine::{validate_sort, PageInfo};
use crate::data::query_state::{QueryState, SortSpec};
use crate::table::options::TableOptions;
use crate::table::render::{
    HeaderCell, Pagination, RenderedCell, RenderedRow, RenderedTable, SearchBox, SelectAllState,
    SortControl, TableBody,
};

/// Per-row action affordances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    View,
    Edit,
    Delete,
}

/// A searchable, sortable, paginated and optionally multi-selectable grid
/// over a host-owned row collection.
///
/// Every mutator brings the derived view up to date before returning, so
/// `render` and the accessors always reflect the current state. The page
/// index is clamped into range after every change; selection only ever
/// holds ids present in the current rows.
pub struct QueryableTable {
    columns: Vec<ColumnDescriptor>,
    options: TableOptions,
    state: QueryState,
    view: DataView,
}

impl QueryableTable {
    pub fn new(columns: Vec<ColumnDescriptor>, rows: Arc<DataTable>, options: TableOptions) -> Self {
        let state = QueryState::with_page_size(options.initial_page_size());
        let mut table = Self {
            columns,
            options,
            state,
            view: DataView::new(rows),
        };
        table.rederive();
        table
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn rows(&self) -> &Arc<DataTable> {
        self.view.source()
    }

    pub fn is_loading(&self) -> bool {
        self.options.loading
    }

    /// Loading is supplied by the host; while set, mutators and actions are inert
    pub fn set_loading(&mut self, loading: bool) {
        self.options.loading = loading;
    }

    /// Replace the rows after a reload. Search, sort and page survive (the
    /// page is clamped); ids of rows that are gone leave the selection.
    pub fn set_rows(&mut self, rows: Arc<DataTable>) {
        let before = self.state.selected_ids.len();
        if !self.state.selected_ids.is_empty() {
            let present: HashSet<&RowId> = rows.rows.iter().filter_map(|r| r.id.as_ref()).collect();
            self.state.selected_ids.retain(|id| present.contains(id));
        }
        let dropped = before - self.state.selected_ids.len();
        if dropped > 0 {
            debug!(target: "table", "Dropped {} selected ids no longer in rows", dropped);
        }

        self.view.set_source(rows);
        self.rederive();
    }

    /// The host switched to a different dataset: fresh query state
    pub fn reset_context(&mut self, rows: Arc<DataTable>) {
        debug!(target: "table", "Resetting query state for '{}'", rows.name);
        self.state = QueryState::with_page_size(self.options.initial_page_size());
        self.view = DataView::new(rows);
        self.rederive();
    }

    /// Update the search term and go back to the first page
    pub fn set_search_term(&mut self, text: impl Into<String>) {
        if self.options.loading {
            return;
        }
        self.state.search_term = text.into();
        self.state.page_index = 0;
        self.rederive();
    }

    /// Sort by a column: the active column flips direction, a new column
    /// starts ascending. Unknown or non-sortable columns are rejected.
    pub fn set_sort(&mut self, column_key: &str) -> Result<()> {
        if self.options.loading {
            return Ok(());
        }
        validate_sort(&self.columns, column_key)?;

        self.state.sort = Some(match self.state.sort.take() {
            Some(current) if current.column == column_key => SortSpec {
                direction: current.direction.toggle(),
                ..current
            },
            _ => SortSpec::ascending(column_key),
        });
        debug!(target: "table", "Sort set to {:?}", self.state.sort);
        self.rederive();
        Ok(())
    }

    pub fn clear_sort(&mut self) {
        if self.options.loading {
            return;
        }
        self.state.sort = None;
        self.rederive();
    }

    /// Go to a page; indices past the end land on the last page
    pub fn set_page(&mut self, index: usize) {
        if self.options.loading {
            return;
        }
        self.state.page_index = index;
        self.rederive();
    }

    pub fn next_page(&mut self) {
        let next = self.state.page_index + 1;
        self.set_page(next);
    }

    pub fn previous_page(&mut self) {
        let previous = self.state.page_index.saturating_sub(1);
        self.set_page(previous);
    }

    /// Change rows per page (must be one of the presets) and go back to the first page
    pub fn set_page_size(&mut self, size: usize) -> Result<()> {
        if self.options.loading {
            return Ok(());
        }
        if !self.options.page_size_options.contains(&size) {
            return Err(anyhow!(
                "Page size {} is not one of {:?}",
                size,
                self.options.page_size_options
            ));
        }
        self.state.page_size = size;
        self.state.page_index = 0;
        self.rederive();
        Ok(())
    }

    /// Checked: the selection becomes exactly the current page's rows.
    /// Unchecked: the selection is emptied.
    pub fn toggle_select_all(&mut self, checked: bool) {
        if self.options.loading || !self.options.selectable {
            return;
        }

        self.state.selected_ids = if checked {
            self.page_rows()
                .into_iter()
                .filter_map(|row| row.id.clone())
                .collect()
        } else {
            Default::default()
        };
        self.notify_selection();
    }

    /// Flip one row in or out of the selection. Returns whether it is now selected.
    pub fn toggle_row_selection(&mut self, id: &RowId) -> Result<bool> {
        if self.options.loading || !self.options.selectable {
            return Ok(self.state.is_selected(id));
        }
        if !self.rows().contains_id(id) {
            return Err(anyhow!("No row with id {} in '{}'", id, self.rows().name));
        }

        let selected = self.state.toggle_selected(id.clone());
        self.notify_selection();
        Ok(selected)
    }

    /// Selected rows, in row order
    pub fn selected_rows(&self) -> Vec<&DataRow> {
        self.rows()
            .rows
            .iter()
            .filter(|row| {
                row.id
                    .as_ref()
                    .is_some_and(|id| self.state.selected_ids.contains(id))
            })
            .collect()
    }

    pub fn page_info(&self) -> PageInfo {
        self.view
            .page_info(self.state.page_index, self.state.page_size)
    }

    /// Rows visible on the current page
    pub fn page_rows(&self) -> Vec<&DataRow> {
        self.view.page_rows(&self.page_info())
    }

    /// Number of rows after filtering
    pub fn filtered_count(&self) -> usize {
        self.view.row_count()
    }

    /// Invoke the host callback for an action on a row. Returns false when
    /// the action is not wired up, the row is unknown, or the table is loading.
    pub fn trigger(&mut self, action: RowAction, id: &RowId) -> bool {
        if self.options.loading {
            return false;
        }

        let source = Arc::clone(self.view.source());
        let Some(row) = source.find_by_id(id) else {
            warn!(target: "table", "{:?} requested for unknown row id {}", action, id);
            return false;
        };

        let callback = match action {
            RowAction::View => self.options.on_view.as_mut(),
            RowAction::Edit => self.options.on_edit.as_mut(),
            RowAction::Delete => self.options.on_delete.as_mut(),
        };

        match callback {
            Some(callback) => {
                callback(row);
                true
            }
            None => false,
        }
    }

    pub fn view(&mut self, id: &RowId) -> bool {
        self.trigger(RowAction::View, id)
    }

    pub fn edit(&mut self, id: &RowId) -> bool {
        self.trigger(RowAction::Edit, id)
    }

    pub fn delete(&mut self, id: &RowId) -> bool {
        self.trigger(RowAction::Delete, id)
    }

    /// Build the UI tree for the current state
    pub fn render(&self) -> RenderedTable {
        let info = self.page_info();
        let page_rows = self.page_rows();

        let header = self
            .columns
            .iter()
            .map(|column| HeaderCell {
                key: column.key.clone(),
                label: column.label.clone(),
                align: column.align,
                min_width: column.min_width,
                sort: column.sortable.then(|| SortControl {
                    active: self
                        .state
                        .sort
                        .as_ref()
                        .filter(|s| s.column == column.key)
                        .map(|s| s.direction),
                }),
            })
            .collect();

        let body = if self.options.loading {
            TableBody::Loading(self.options.loading_message.clone())
        } else if page_rows.is_empty() {
            TableBody::Empty(self.options.empty_message.clone())
        } else {
            TableBody::Rows(page_rows.iter().map(|row| self.render_row(row)).collect())
        };

        let select_all = self.options.selectable.then(|| {
            let ids: Vec<&RowId> = page_rows.iter().filter_map(|r| r.id.as_ref()).collect();
            let selected = ids.iter().filter(|id| self.state.is_selected(id)).count();
            SelectAllState {
                checked: !ids.is_empty() && selected == ids.len(),
                indeterminate: selected > 0 && selected < ids.len(),
            }
        });

        RenderedTable {
            title: self.options.title.clone(),
            search: self.options.searchable.then(|| SearchBox {
                term: self.state.search_term.clone(),
            }),
            select_all,
            header,
            actions: self.options.actions(),
            body,
            pagination: Pagination {
                page_index: info.page_index,
                page_size: info.page_size,
                page_count: info.page_count(),
                total: info.total,
                range_label: info.range_label(),
                page_size_options: self.options.page_size_options.clone(),
                has_previous: info.has_previous(),
                has_next: info.has_next(),
            },
        }
    }

    fn render_row(&self, row: &DataRow) -> RenderedRow {
        let selected = if self.options.selectable {
            row.id.as_ref().map(|id| self.state.is_selected(id))
        } else {
            None
        };

        RenderedRow {
            id: row.id.clone(),
            selected,
            cells: self
                .columns
                .iter()
                .map(|column| RenderedCell {
                    text: column.display_value(
                        row.value_or_null(&column.key),
                        &self.options.null_display,
                        &self.options.date_format,
                    ),
                    align: column.align,
                })
                .collect(),
        }
    }

    /// Recompute the derived view and clamp the page index
    fn rederive(&mut self) {
        self.view
            .refresh(
                &self.columns,
                &self.state,
                self.options.searchable,
                &self.options.date_format,
            );
        let info = self.page_info();
        if info.page_index != self.state.page_index {
            debug!(
                target: "table",
                "Clamped page {} to {} ({} rows)",
                self.state.page_index,
                info.page_index,
                info.total
            );
            self.state.page_index = info.page_index;
        }
    }

    fn notify_selection(&mut self) {
        let source = Arc::clone(self.view.source());
        let selected: Vec<&DataRow> = source
            .rows
            .iter()
            .filter(|row| {
                row.id
                    .as_ref()
                    .is_some_and(|id| self.state.selected_ids.contains(id))
            })
            .collect();

        debug!(target: "table", "Selection changed: {} rows", selected.len());
        if let Some(callback) = self.options.on_selection_change.as_mut() {
            callback(&selected);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datatable::DataValue;
    use crate::data::query_state::SortDirection;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn students(n: i64) -> Arc<DataTable> {
        let rows = (1..=n)
            .map(|i| {
                DataRow::new()
                    .with_id(i)
                    .with_value("name", format!("Student {:02}", i))
                    .with_value("unit", if i % 2 == 0 { "Centro" } else { "Norte" })
            })
            .collect();
        Arc::new(DataTable::from_rows("students", rows).unwrap())
    }

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("name", "Name").sortable(true),
            ColumnDescriptor::new("unit", "Unit"),
        ]
    }

    #[test]
    fn test_sort_toggles_and_new_column_starts_ascending() {
        let cols = vec![
            ColumnDescriptor::new("name", "Name").sortable(true),
            ColumnDescriptor::new("unit", "Unit").sortable(true),
        ];
        let mut table = QueryableTable::new(cols, students(3), TableOptions::default());

        table.set_sort("name").unwrap();
        assert_eq!(table.state().sort, Some(SortSpec::ascending("name")));
        table.set_sort("name").unwrap();
        assert_eq!(table.state().sort, Some(SortSpec::descending("name")));
        table.set_sort("name").unwrap();
        assert_eq!(
            table.state().sort.as_ref().map(|s| s.direction),
            Some(SortDirection::Ascending)
        );

        table.set_sort("name").unwrap();
        table.set_sort("unit").unwrap();
        assert_eq!(table.state().sort, Some(SortSpec::ascending("unit")));
    }

    #[test]
    fn test_non_sortable_column_rejected() {
        let mut table = QueryableTable::new(columns(), students(3), TableOptions::default());
        assert!(table.set_sort("unit").is_err());
        assert!(table.set_sort("nope").is_err());
        assert!(table.state().sort.is_none());
    }

    #[test]
    fn test_page_size_must_be_preset_and_resets_page() {
        let mut table = QueryableTable::new(columns(), students(60), TableOptions::default());
        table.set_page(4);
        assert_eq!(table.state().page_index, 4);

        assert!(table.set_page_size(7).is_err());
        assert_eq!(table.state().page_index, 4);

        table.set_page_size(25).unwrap();
        assert_eq!(table.state().page_index, 0);
        assert_eq!(table.page_rows().len(), 25);
    }

    #[test]
    fn test_set_page_clamps() {
        let mut table = QueryableTable::new(columns(), students(12), TableOptions::default());
        table.set_page(9);
        assert_eq!(table.state().page_index, 1);
        table.next_page();
        assert_eq!(table.state().page_index, 1);
        table.previous_page();
        table.previous_page();
        assert_eq!(table.state().page_index, 0);
    }

    #[test]
    fn test_loading_makes_mutators_inert() {
        let mut table = QueryableTable::new(
            columns(),
            students(12),
            TableOptions::new().loading(true).selectable(true),
        );
        table.set_search_term("Student 01");
        table.set_page(1);
        table.toggle_select_all(true);
        assert_eq!(table.state().search_term, "");
        assert_eq!(table.state().page_index, 0);
        assert!(table.state().selected_ids.is_empty());
        assert!(matches!(table.render().body, TableBody::Loading(_)));

        table.set_loading(false);
        table.set_page(1);
        assert_eq!(table.state().page_index, 1);
    }

    #[test]
    fn test_actions_invoke_callbacks() {
        let edited = Rc::new(RefCell::new(Vec::new()));
        let sink = edited.clone();
        let mut table = QueryableTable::new(
            columns(),
            students(3),
            TableOptions::new().on_edit(move |row| sink.borrow_mut().push(row.id.clone())),
        );

        assert!(table.edit(&RowId::Int(2)));
        assert!(!table.delete(&RowId::Int(2)));
        assert!(!table.edit(&RowId::Int(99)));
        assert_eq!(*edited.borrow(), vec![Some(RowId::Int(2))]);
    }

    #[test]
    fn test_render_header_sort_controls() {
        let mut table = QueryableTable::new(columns(), students(3), TableOptions::default());
        table.set_sort("name").unwrap();
        let rendered = table.render();
        assert_eq!(
            rendered.header[0].sort,
            Some(SortControl {
                active: Some(SortDirection::Ascending)
            })
        );
        assert_eq!(rendered.header[1].sort, None);
        assert!(!rendered.has_action_column());
    }

    #[test]
    fn test_render_select_all_state() {
        let mut table = QueryableTable::new(
            columns(),
            students(3),
            TableOptions::new().selectable(true),
        );
        table.toggle_row_selection(&RowId::Int(1)).unwrap();
        let partial = table.render().select_all.unwrap();
        assert!(partial.indeterminate && !partial.checked);

        table.toggle_select_all(true);
        let full = table.render().select_all.unwrap();
        assert!(full.checked && !full.indeterminate);
    }

    #[test]
    fn test_selection_ignored_when_not_selectable() {
        let mut table = QueryableTable::new(columns(), students(3), TableOptions::default());
        assert!(!table.toggle_row_selection(&RowId::Int(1)).unwrap());
        assert!(table.render().select_all.is_none());
        assert!(table.render().rows()[0].selected.is_none());
    }

    #[test]
    fn test_render_cells_use_null_display() {
        let rows = Arc::new(DataTable::from_rows(
            "t",
            vec![DataRow::new().with_id(1).with_value("name", DataValue::Null)],
        )
        .unwrap());
        let mut options = TableOptions::default();
        options.null_display = "-".to_string();
        let table = QueryableTable::new(columns(), rows, options);
        let rendered = table.render();
        assert_eq!(rendered.rows()[0].cells[0].text, "-");
        assert_eq!(rendered.rows()[0].cells[1].text, "-");
    }
}
