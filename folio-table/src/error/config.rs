//! Construction error types

/// Errors raised while building a [`TableController`](crate::TableController).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The default page size is zero.
    #[error("per_page must be at least 1")]
    InvalidPerPage,

    /// Bulk delete was enabled without a primary key to collect.
    #[error("bulk delete requires a primary key field")]
    BulkDeleteWithoutKey,

    /// Two columns share the same key.
    #[error("duplicate column key: {0}")]
    DuplicateColumn(String),
}
