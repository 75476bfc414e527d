use std::path::PathBuf;

use folio_table::error::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{0} must hold a JSON array of objects")]
    NotRecords(PathBuf),

    #[error("invalid table configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid assignment `{0}`, expected FIELD=VALUE")]
    Assignment(String),

    #[error("unknown column `{0}`")]
    UnknownColumn(String),

    #[error("{0}")]
    Rejected(String),

    #[error("no record with {field} = {key}")]
    NoSuchRecord { field: String, key: String },

    #[error("cannot initialize logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}

pub type Result<T> = std::result::Result<T, CliError>;
