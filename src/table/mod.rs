//! The queryable table component: query state, host callbacks and the
//! rendered UI tree.

pub mod options;
pub mod queryable_table;
pub mod render;

pub use options::{ActionSet, TableOptions};
pub use queryable_table::{QueryableTable, RowAction};
pub use render::RenderedTable;
