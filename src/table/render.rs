//! The UI tree produced by `QueryableTable::render`.
//!
//! Plain data: a toolkit (or `table_display` for terminals) walks it and
//! draws. Nothing here holds callbacks.

use crate::data::column::Align;
use crate::data::datatable::RowId;
use crate::data::query_state::SortDirection;
use crate::table::options::ActionSet;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTable {
    pub title: Option<String>,
    /// Present when the table is searchable
    pub search: Option<SearchBox>,
    /// Present when the table is selectable
    pub select_all: Option<SelectAllState>,
    pub header: Vec<HeaderCell>,
    /// Empty when the host wired up no row actions (no action column)
    pub actions: ActionSet,
    pub body: TableBody,
    pub pagination: Pagination,
}

impl RenderedTable {
    /// Rows shown in the body (none while loading or empty)
    pub fn rows(&self) -> &[RenderedRow] {
        match &self.body {
            TableBody::Rows(rows) => rows,
            _ => &[],
        }
    }

    pub fn has_action_column(&self) -> bool {
        self.actions.any()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchBox {
    pub term: String,
}

/// Header checkbox state for the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectAllState {
    pub checked: bool,
    pub indeterminate: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub key: String,
    pub label: String,
    pub align: Align,
    pub min_width: Option<u16>,
    /// None for columns that are not sortable (no sort control)
    pub sort: Option<SortControl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortControl {
    /// Direction when this column is the active sort
    pub active: Option<SortDirection>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableBody {
    Loading(String),
    Empty(String),
    Rows(Vec<RenderedRow>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRow {
    pub id: Option<RowId>,
    /// None when the table is not selectable or the row has no id
    pub selected: Option<bool>,
    pub cells: Vec<RenderedCell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCell {
    pub text: String,
    pub align: Align,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page_index: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total: usize,
    /// e.g. "21-25 of 25"
    pub range_label: String,
    pub page_size_options: Vec<usize>,
    pub has_previous: bool,
    pub has_next: bool,
}
