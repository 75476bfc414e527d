//! Table operation error types

use crate::form::FieldError;
use crate::row::RowId;

/// An asynchronous controller operation.
///
/// Every failure surfaced to the renderer is tagged with the operation that
/// produced it, so loading flags and alerts stay independent per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Loading rows through the data source.
    Fetch,
    /// Creating a row from the create form.
    Create,
    /// Updating a row from the update form.
    Update,
    /// Deleting a single row.
    Delete,
    /// Deleting every selected row.
    BulkDelete,
}

impl Operation {
    /// Returns a short lowercase name for logging.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::BulkDelete => "bulk delete",
        }
    }

    /// Generic message used when a failed response carries no message of its own.
    pub fn fallback_message(self) -> &'static str {
        match self {
            Self::Fetch => "Data load error",
            Self::Create => "Create failed",
            Self::Update => "Update failed",
            Self::Delete => "Delete failed",
            Self::BulkDelete => "Bulk delete failed",
        }
    }

    /// Message returned by a contract the caller did not provide.
    pub fn disabled_message(self) -> &'static str {
        match self {
            Self::Fetch => "Fetch disabled",
            Self::Create => "Create disabled",
            Self::Update => "Update disabled",
            Self::Delete => "Delete disabled",
            Self::BulkDelete => "Bulk delete disabled",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while running a controller operation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TableError {
    /// The data source answered with `success: false`.
    #[error("Fetch failed: {message}")]
    Fetch {
        /// Message to show the user.
        message: String,
    },

    /// The create contract answered with `success: false`.
    #[error("Create failed: {message}")]
    Create {
        /// Message to show the user.
        message: String,
    },

    /// The update contract answered with `success: false`.
    #[error("Update failed: {message}")]
    Update {
        /// Message to show the user.
        message: String,
    },

    /// The delete contract answered with `success: false`.
    #[error("Delete failed: {message}")]
    Delete {
        /// Message to show the user.
        message: String,
    },

    /// The bulk delete contract answered with `success: false`.
    #[error("Bulk delete failed: {message}")]
    BulkDelete {
        /// Message to show the user.
        message: String,
    },

    /// A delete was requested but the table declares no primary key.
    #[error("No primary key declared for this table")]
    MissingPrimaryKey,

    /// The targeted row is no longer loaded.
    #[error("Row {0} not found")]
    RowNotFound(RowId),

    /// The submitted form did not pass validation.
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// The contract implementation failed before producing a response
    /// (network error, rejected future, malformed body).
    #[error("Contract error: {0}")]
    Contract(String),
}

impl TableError {
    /// Creates the rejection error for an operation.
    ///
    /// Blank messages fall back to [`Operation::fallback_message`].
    pub fn rejected(operation: Operation, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| operation.fallback_message().to_string());
        match operation {
            Operation::Fetch => Self::Fetch { message },
            Operation::Create => Self::Create { message },
            Operation::Update => Self::Update { message },
            Operation::Delete => Self::Delete { message },
            Operation::BulkDelete => Self::BulkDelete { message },
        }
    }

    /// Creates a contract error.
    pub fn contract(message: impl Into<String>) -> Self {
        Self::Contract(message.into())
    }

    /// Returns the operation this error was raised by, if it is operation specific.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Fetch { .. } => Some(Operation::Fetch),
            Self::Create { .. } => Some(Operation::Create),
            Self::Update { .. } => Some(Operation::Update),
            Self::Delete { .. } => Some(Operation::Delete),
            Self::BulkDelete { .. } => Some(Operation::BulkDelete),
            _ => None,
        }
    }

    /// Returns the message to show the user, if the error carries one.
    ///
    /// Contract errors return `None`: transport details are logged, and the
    /// caller shows the operation's generic fallback instead.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Fetch { message }
            | Self::Create { message }
            | Self::Update { message }
            | Self::Delete { message }
            | Self::BulkDelete { message } => Some(message.clone()),
            Self::MissingPrimaryKey | Self::RowNotFound(_) => Some(self.to_string()),
            Self::Validation(errors) => errors.first().map(|e| e.message.clone()),
            Self::Contract(_) => None,
        }
    }
}
