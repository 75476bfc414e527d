//! Controller state.

use std::collections::HashSet;

use crate::error::Operation;
use crate::filter::FilterState;
use crate::filter::Params;
use crate::pagination::Pagination;
use crate::record::FormData;
use crate::row::Row;
use crate::row::RowId;
use crate::sort::SortState;

/// Which collaborator drives the row list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    /// Rows come from a data source; filters and sort go to the server.
    Fetch,
    /// Rows are supplied by the caller; only client-side sort applies.
    Controlled,
}

/// The create/update modal.
///
/// Only one modal is open at a time; opening one while another is open is
/// refused by the controller.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Modal {
    /// No modal open.
    #[default]
    Closed,
    /// Create form, with its initial values.
    Create {
        /// Initial form values.
        values: FormData,
    },
    /// Update form for a row, pre-populated from the row.
    Update {
        /// The row being edited.
        row: RowId,
        /// Initial form values.
        values: FormData,
    },
}

impl Modal {
    /// Returns `true` if a modal is open.
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

/// Per-operation loading flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Loading {
    /// A fetch is in flight.
    pub fetch: bool,
    /// A create or update submit is in flight.
    pub submit: bool,
    /// At least one single-row delete is in flight.
    pub delete: bool,
    /// A bulk delete is in flight.
    pub bulk_delete: bool,
}

impl Loading {
    /// Returns `true` if any operation is in flight.
    pub fn any(&self) -> bool {
        self.fetch || self.submit || self.delete || self.bulk_delete
    }

    pub(super) fn set(&mut self, operation: Operation, value: bool) {
        match operation {
            Operation::Fetch => self.fetch = value,
            Operation::Create | Operation::Update => self.submit = value,
            Operation::Delete => self.delete = value,
            Operation::BulkDelete => self.bulk_delete = value,
        }
    }
}

/// A dismissable, user-visible failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// The operation that failed.
    pub operation: Operation,
    /// Message to show.
    pub message: String,
}

/// What became of a controller operation.
///
/// Failures are already reported through the alert state; the outcome only
/// tells the caller whether anything changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The operation completed and its result was applied.
    Applied,
    /// The operation failed; an alert was raised.
    Failed,
    /// The user declined the confirmation prompt.
    Cancelled,
    /// The operation does not apply in the current state.
    Ignored,
    /// A newer fetch was issued; this response was discarded.
    Stale,
    /// The controller was unmounted before the response arrived.
    Inactive,
}

impl Outcome {
    /// Returns `true` for [`Outcome::Applied`].
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

/// Mutable state of a controller.
#[derive(Debug)]
pub(super) struct ControllerInner<T> {
    /// Loaded rows, in server order (fetch mode) or caller order (controlled mode).
    pub rows: Vec<Row<T>>,
    /// Committed filters.
    pub filters: FilterState,
    /// Uncommitted search text.
    pub search_draft: String,
    /// Uncommitted per-column filter values.
    pub column_filters: Params,
    /// Current sort (mirrors the committed order in fetch mode).
    pub sort: Option<SortState>,
    /// Metadata of the last successful fetch.
    pub pagination: Pagination,
    /// Rows selected for bulk delete.
    pub selection: HashSet<RowId>,
    /// Rows with a single-row delete in flight.
    pub deleting: HashSet<RowId>,
    /// Active modal.
    pub modal: Modal,
    /// Loading flags.
    pub loading: Loading,
    /// Last surfaced failure.
    pub alert: Option<Alert>,
}

impl<T> ControllerInner<T> {
    pub fn new(rows: Vec<Row<T>>, filters: FilterState) -> Self {
        let pagination = Pagination::new(rows.len(), filters.per_page);
        Self {
            rows,
            filters,
            search_draft: String::new(),
            column_filters: Params::new(),
            sort: None,
            pagination,
            selection: HashSet::new(),
            deleting: HashSet::new(),
            modal: Modal::Closed,
            loading: Loading::default(),
            alert: None,
        }
    }

    pub fn position(&self, id: &RowId) -> Option<usize> {
        self.rows.iter().position(|row| row.id() == id)
    }

    pub fn find(&self, id: &RowId) -> Option<&Row<T>> {
        self.rows.iter().find(|row| row.id() == id)
    }
}
