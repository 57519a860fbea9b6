//! Configuration module
//!
//! User-level defaults for tables and terminal display.

pub mod config;
