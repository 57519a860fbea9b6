use std::fmt;

use crate::config::config::Config;
use crate::data::datatable::DataRow;
use crate::data::query_state::{DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZE_OPTIONS};

pub type RowCallback = Box<dyn FnMut(&DataRow)>;
pub type SelectionCallback = Box<dyn FnMut(&[&DataRow])>;

/// Host-supplied configuration of one table instance
pub struct TableOptions {
    pub title: Option<String>,
    pub searchable: bool,
    pub selectable: bool,
    pub loading: bool,
    pub empty_message: String,
    pub loading_message: String,
    pub page_size_options: Vec<usize>,
    pub default_page_size: usize,
    /// Shown for null cells
    pub null_display: String,
    /// chrono format for date cells
    pub date_format: String,
    pub(crate) on_edit: Option<RowCallback>,
    pub(crate) on_delete: Option<RowCallback>,
    pub(crate) on_view: Option<RowCallback>,
    pub(crate) on_selection_change: Option<SelectionCallback>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            title: None,
            searchable: true,
            selectable: false,
            loading: false,
            empty_message: "No data found".to_string(),
            loading_message: "Loading...".to_string(),
            page_size_options: DEFAULT_PAGE_SIZE_OPTIONS.to_vec(),
            default_page_size: DEFAULT_PAGE_SIZE,
            null_display: String::new(),
            date_format: "%Y-%m-%d".to_string(),
            on_edit: None,
            on_delete: None,
            on_view: None,
            on_selection_change: None,
        }
    }
}

impl fmt::Debug for TableOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableOptions")
            .field("title", &self.title)
            .field("searchable", &self.searchable)
            .field("selectable", &self.selectable)
            .field("loading", &self.loading)
            .field("empty_message", &self.empty_message)
            .field("page_size_options", &self.page_size_options)
            .field("default_page_size", &self.default_page_size)
            .field("actions", &self.actions())
            .finish()
    }
}

/// Which per-row actions the host wired up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionSet {
    pub view: bool,
    pub edit: bool,
    pub delete: bool,
}

impl ActionSet {
    pub fn any(&self) -> bool {
        self.view || self.edit || self.delete
    }
}

impl TableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults taken from the user's config file
    pub fn from_config(config: &Config) -> Self {
        let table = &config.table;
        Self {
            searchable: table.searchable,
            selectable: table.selectable,
            empty_message: table.empty_message.clone(),
            loading_message: table.loading_message.clone(),
            page_size_options: table.page_size_options.clone(),
            default_page_size: table.default_page_size,
            null_display: config.display.null_display.clone(),
            date_format: config.display.date_format.clone(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    pub fn selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    pub fn page_size_options(mut self, options: Vec<usize>) -> Self {
        self.page_size_options = options;
        self
    }

    pub fn default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }

    /// chrono format for date cells; search matches this text as well
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    pub fn on_edit(mut self, callback: impl FnMut(&DataRow) + 'static) -> Self {
        self.on_edit = Some(Box::new(callback));
        self
    }

    pub fn on_delete(mut self, callback: impl FnMut(&DataRow) + 'static) -> Self {
        self.on_delete = Some(Box::new(callback));
        self
    }

    pub fn on_view(mut self, callback: impl FnMut(&DataRow) + 'static) -> Self {
        self.on_view = Some(Box::new(callback));
        self
    }

    pub fn on_selection_change(mut self, callback: impl FnMut(&[&DataRow]) + 'static) -> Self {
        self.on_selection_change = Some(Box::new(callback));
        self
    }

    pub fn actions(&self) -> ActionSet {
        ActionSet {
            view: self.on_view.is_some(),
            edit: self.on_edit.is_some(),
            delete: self.on_delete.is_some(),
        }
    }

    /// The initial page size: the configured default if it is a preset,
    /// otherwise the first preset.
    pub fn initial_page_size(&self) -> usize {
        if self.page_size_options.contains(&self.default_page_size) {
            self.default_page_size
        } else {
            self.page_size_options
                .first()
                .copied()
                .unwrap_or(DEFAULT_PAGE_SIZE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_console() {
        let options = TableOptions::default();
        assert!(options.searchable);
        assert!(!options.selectable);
        assert_eq!(options.empty_message, "No data found");
        assert_eq!(options.page_size_options, vec![5, 10, 25, 50]);
        assert!(!options.actions().any());
    }

    #[test]
    fn test_actions_follow_callbacks() {
        let options = TableOptions::new().on_edit(|_| {}).on_view(|_| {});
        let actions = options.actions();
        assert!(actions.edit && actions.view && !actions.delete);
    }

    #[test]
    fn test_initial_page_size_falls_back_to_first_preset() {
        let options = TableOptions::new()
            .page_size_options(vec![20, 40])
            .default_page_size(10);
        assert_eq!(options.initial_page_size(), 20);
    }
}
