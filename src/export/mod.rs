//! Training-log exports

pub mod csv;

pub use csv::{export_acwr_series, export_set_history};
