//! Query state owned by a table instance: search, sort, page and selection.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::data::datatable::RowId;

/// Rows-per-page presets offered by the pagination control
pub const DEFAULT_PAGE_SIZE_OPTIONS: [usize; 4] = [5, 10, 25, 50];

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Sort order for columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => write!(f, "asc"),
            SortDirection::Descending => write!(f, "desc"),
        }
    }
}

/// Active sort: column key plus direction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// The table's own view parameters. Plain value: mutate it, then derive again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    pub search_term: String,
    pub sort: Option<SortSpec>,
    pub page_index: usize,
    pub page_size: usize,
    pub selected_ids: HashSet<RowId>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl QueryState {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            search_term: String::new(),
            sort: None,
            page_index: 0,
            page_size: page_size.max(1),
            selected_ids: HashSet::new(),
        }
    }

    pub fn is_selected(&self, id: &RowId) -> bool {
        self.selected_ids.contains(id)
    }

    /// Symmetric difference of one id into the selection.
    /// Returns true when the id ended up selected.
    pub fn toggle_selected(&mut self, id: RowId) -> bool {
        if self.selected_ids.remove(&id) {
            false
        } else {
            self.selected_ids.insert(id);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_specs_hash_by_column_and_direction() {
        let mut seen = HashSet::new();
        assert!(seen.insert(SortSpec::ascending("name")));
        assert!(seen.insert(SortSpec::descending("name")));
        assert!(!seen.insert(SortSpec::ascending("name")));
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_defaults() {
        let state = QueryState::default();
        assert_eq!(state.page_size, 10);
        assert_eq!(state.page_index, 0);
        assert!(state.sort.is_none());
        assert!(state.selected_ids.is_empty());
    }

    #[test]
    fn test_toggle_selected() {
        let mut state = QueryState::default();
        assert!(state.toggle_selected(RowId::Int(3)));
        assert!(state.is_selected(&RowId::Int(3)));
        assert!(!state.toggle_selected(RowId::Int(3)));
        assert!(state.selected_ids.is_empty());
    }

    #[test]
    fn test_direction_toggle_and_display() {
        assert_eq!(SortDirection::Ascending.toggle(), SortDirection::Descending);
        assert_eq!(SortDirection::Descending.toggle().to_string(), "asc");
    }
}
