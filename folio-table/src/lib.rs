//! Headless table controller
//!
//! Drives tabular CRUD views: pagination, free-text and per-column filtering,
//! client- or server-side sorting, row selection and modal create/update/delete,
//! all against injected async data contracts. Rendering is left to the caller;
//! the controller only exposes state and reacts to operations.

pub mod action;
pub mod column;
pub mod config;
pub mod error;
pub mod filter;
pub mod form;
pub mod memory;
pub mod pagination;
pub mod record;
pub mod row;
pub mod sort;
pub mod source;

mod controller;

pub use controller::*;
pub use error::Operation;
pub use error::TableError;
pub use record::FormData;
pub use record::TableRecord;
pub use row::Row;
pub use row::RowId;
