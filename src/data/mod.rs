//! Data layer for the DataTable/DataView architecture
//!
//! Rows, column descriptors and the filter -> sort -> paginate pipeline.
//! Nothing here knows how the table is drawn.

pub mod column;
pub mod data_view;
pub mod datatable;
pub mod datavalue_compare;
pub mod query_engine;
pub mod query_state;
pub mod type_inference;

// Moving rows in and out
pub mod data_exporter;
pub mod datatable_loaders;
