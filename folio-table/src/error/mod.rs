//! Error types

mod config;
mod table;

pub use config::*;
pub use table::*;
