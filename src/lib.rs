pub mod config;
pub mod data;
pub mod session;
pub mod table;
pub mod table_display;
pub mod utils;

pub use data::column::{Align, ColumnDescriptor};
pub use data::datatable::{DataRow, DataTable, DataValue, RowId};
pub use data::query_state::{QueryState, SortDirection, SortSpec};
pub use table::{QueryableTable, RenderedTable, RowAction, TableOptions};
