//! Tabular CRUD controller

mod builder;
mod refresh;
mod state;

pub use builder::*;
pub use refresh::*;
pub use state::Alert;
pub use state::Loading;
pub use state::Modal;
pub use state::ModeKind;
pub use state::Outcome;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use futures::FutureExt;
use serde_json::Value;

use self::state::ControllerInner;
use crate::action::{self, Action, ActionKind};
use crate::column::Column;
use crate::config::TableConfig;
use crate::error::{Operation, TableError};
use crate::filter::{FilterAction, FilterState, Params};
use crate::form::{FormSchema, Schemas, ValidationResult};
use crate::pagination::Pagination;
use crate::record::{FormData, TableRecord};
use crate::row::{IdentityStrategy, Row, RowId};
use crate::sort::{self, SortState};
use crate::source::{ApiResponse, Confirm, CrudHandler, DataSource};

/// Collaborators and settings fixed at construction.
struct Shared<T: TableRecord> {
    source: Option<Arc<dyn DataSource<T>>>,
    crud: Arc<dyn CrudHandler<T>>,
    confirm: Arc<dyn Confirm>,
    columns: Vec<Column<T>>,
    actions: Vec<Action<T>>,
    schemas: Schemas,
    config: TableConfig,
    strategy: IdentityStrategy,
    initial_filters: FilterState,
    /// Cleared on unmount; responses resolving afterwards are dropped.
    active: AtomicBool,
    /// Sequence number of the latest issued fetch.
    fetch_seq: AtomicU64,
}

/// A headless table controller.
///
/// `TableController<T>` owns the state behind a tabular CRUD view:
/// - Committed filters, search and per-column filter drafts
/// - Sort state, sent to the server (fetch mode) or applied locally (controlled mode)
/// - Pagination metadata from the last successful fetch
/// - Loaded rows with stable internal identities
/// - Row selection and bulk delete
/// - The create/update modal and its submit lifecycle
///
/// Every async operation catches its own failures, raises an [`Alert`] and
/// resets its own loading flag. Nothing is returned as an error; the
/// [`Outcome`] only says whether the operation took effect.
///
/// The controller is cheap to clone (uses `Arc` internally). Locks are never
/// held across an await, so operations may interleave freely; only the
/// response of the latest fetch is ever applied.
///
/// # Example
///
/// ```ignore
/// let table = TableController::builder()
///     .fetch(source)
///     .columns(columns)
///     .config(TableConfig::default().with_primary_key("id"))
///     .build()?;
///
/// table.mount().await;
/// table.toggle_sort("ticker").await;
/// table.next_page().await;
/// ```
pub struct TableController<T: TableRecord> {
    shared: Arc<Shared<T>>,
    inner: Arc<RwLock<ControllerInner<T>>>,
    /// Dirty flag for re-render.
    dirty: Arc<AtomicBool>,
}

impl<T: TableRecord> Clone for TableController<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            inner: Arc::clone(&self.inner),
            dirty: Arc::clone(&self.dirty),
        }
    }
}

impl<T: TableRecord> std::fmt::Debug for TableController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableController")
            .field("mode", &self.mode())
            .field("rows", &self.len())
            .field("filters", &self.filters())
            .finish_non_exhaustive()
    }
}

impl<T: TableRecord> TableController<T> {
    /// Creates a builder.
    pub fn builder() -> TableBuilder<T, Missing> {
        TableBuilder::new()
    }

    pub(crate) fn from_parts(
        mode: Mode<T>,
        columns: Vec<Column<T>>,
        actions: Vec<Action<T>>,
        schemas: Schemas,
        crud: Arc<dyn CrudHandler<T>>,
        confirm: Arc<dyn Confirm>,
        config: TableConfig,
    ) -> Self {
        let strategy = config.identity_strategy();
        let initial_filters = config.initial_filter_state();
        let (source, rows) = match mode {
            Mode::Fetch(source) => (Some(source), Vec::new()),
            Mode::Controlled(rows) => (None, strategy.reconcile(&[], rows)),
        };
        let inner = ControllerInner::new(rows, initial_filters.clone());

        Self {
            shared: Arc::new(Shared {
                source,
                crud,
                confirm,
                columns,
                actions,
                schemas,
                config,
                strategy,
                initial_filters,
                active: AtomicBool::new(true),
                fetch_seq: AtomicU64::new(0),
            }),
            inner: Arc::new(RwLock::new(inner)),
            dirty: Arc::new(AtomicBool::new(false)),
        }
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    fn read<R>(&self, f: impl FnOnce(&ControllerInner<T>) -> R) -> Option<R> {
        let guard = self.inner.read().ok()?;
        Some(f(&guard))
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut ControllerInner<T>) -> R) -> Option<R> {
        let mut guard = self.inner.write().ok()?;
        Some(f(&mut guard))
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    fn is_fetch_mode(&self) -> bool {
        self.shared.source.is_some()
    }

    /// Converts a contract response into data or a rejection.
    fn settle<D>(
        &self,
        operation: Operation,
        result: Result<ApiResponse<D>, TableError>,
    ) -> Result<Option<D>, TableError> {
        let mut response = result?;
        let blank = response.message.as_deref().is_none_or(|m| m.trim().is_empty());
        if !response.success && blank && operation == Operation::Fetch {
            response.message = Some(self.shared.config.fetch_error_message.clone());
        }
        response.into_result(operation)
    }

    /// Surfaces a failure as the current alert.
    fn raise(&self, inner: &mut ControllerInner<T>, operation: Operation, error: &TableError) {
        let message = error.user_message().unwrap_or_else(|| match operation {
            Operation::Fetch => self.shared.config.fetch_error_message.clone(),
            other => other.fallback_message().to_string(),
        });
        log::warn!("{operation} failed: {error}");
        inner.alert = Some(Alert { operation, message });
    }

    /// Applies a filter action produced from the current state, if any.
    ///
    /// Only meaningful in fetch mode; returns `false` otherwise.
    fn commit(&self, action: impl FnOnce(&mut ControllerInner<T>) -> Option<FilterAction>) -> bool {
        if !self.is_fetch_mode() {
            return false;
        }
        let committed = self
            .with_inner(|inner| match action(inner) {
                Some(action) => {
                    inner.filters = inner.filters.clone().reduce(action);
                    true
                }
                None => false,
            })
            .unwrap_or(false);
        if committed {
            self.mark_dirty();
        }
        committed
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Returns the operating mode.
    pub fn mode(&self) -> ModeKind {
        if self.is_fetch_mode() {
            ModeKind::Fetch
        } else {
            ModeKind::Controlled
        }
    }

    /// Runs the initial load (fetch mode only).
    pub async fn mount(&self) -> Outcome {
        if self.is_fetch_mode() {
            self.refresh().await
        } else {
            Outcome::Ignored
        }
    }

    /// Stops applying responses. In-flight requests resolve into nothing.
    pub fn unmount(&self) {
        self.shared.active.store(false, Ordering::SeqCst);
        log::debug!("table unmounted");
    }

    /// Returns `false` once the controller was unmounted.
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Returns and clears the dirty flag.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::SeqCst)
    }

    // -------------------------------------------------------------------------
    // Fetching
    // -------------------------------------------------------------------------

    /// Re-runs the committed filters against the data source.
    ///
    /// Each call takes a new sequence number. When the response arrives after
    /// a newer fetch was issued it is discarded, whatever order the responses
    /// resolve in.
    pub async fn refresh(&self) -> Outcome {
        let Some(source) = self.shared.source.clone() else {
            return Outcome::Ignored;
        };
        if !self.is_active() {
            return Outcome::Inactive;
        }

        let seq = self.shared.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let Some(params) = self.with_inner(|inner| {
            inner.loading.fetch = true;
            inner.filters.to_params()
        }) else {
            return Outcome::Failed;
        };
        self.mark_dirty();
        log::debug!("fetch #{seq}: {}", Value::Object(params.clone()));

        let result = self.settle(Operation::Fetch, source.fetch(params).await);

        if !self.is_active() {
            log::trace!("fetch #{seq} resolved after unmount, dropped");
            return Outcome::Inactive;
        }
        if self.shared.fetch_seq.load(Ordering::SeqCst) != seq {
            log::trace!("fetch #{seq} superseded, response discarded");
            return Outcome::Stale;
        }

        let outcome = self
            .with_inner(|inner| {
                inner.loading.fetch = false;
                match result {
                    Ok(Some(payload)) => {
                        inner.pagination = Pagination::from_response(
                            payload.rows.len(),
                            payload.total,
                            payload.per_page,
                            inner.filters.per_page,
                        );
                        let previous = std::mem::take(&mut inner.rows);
                        inner.rows = self.shared.strategy.reconcile(&previous, payload.rows);
                        inner.selection.clear();
                        Outcome::Applied
                    }
                    Ok(None) => {
                        let error = TableError::contract("successful fetch without data");
                        self.raise(inner, Operation::Fetch, &error);
                        Outcome::Failed
                    }
                    Err(error) => {
                        self.raise(inner, Operation::Fetch, &error);
                        Outcome::Failed
                    }
                }
            })
            .unwrap_or(Outcome::Failed);
        self.mark_dirty();
        outcome
    }

    /// Registers this table's refresh in `slot`, replacing any previous handle.
    pub fn register_refresh(&self, slot: &RefreshSlot) {
        let this = self.clone();
        slot.set(RefreshHandle::new(Arc::new(move || {
            let this = this.clone();
            async move { this.refresh().await }.boxed()
        })));
    }

    // -------------------------------------------------------------------------
    // Search and column filters
    // -------------------------------------------------------------------------

    /// Edits the search text without committing it.
    pub fn set_search_draft(&self, text: impl Into<String>) {
        let text = text.into();
        if self.with_inner(|inner| inner.search_draft = text).is_some() {
            self.mark_dirty();
        }
    }

    /// Returns the uncommitted search text.
    pub fn search_draft(&self) -> String {
        self.read(|inner| inner.search_draft.clone())
            .unwrap_or_default()
    }

    /// Commits the search text (back to page 1) and refetches.
    pub async fn search(&self) -> Outcome {
        if !self.commit(|inner| Some(FilterAction::Search(inner.search_draft.clone()))) {
            return Outcome::Ignored;
        }
        self.refresh().await
    }

    /// Edits a column filter without committing it.
    ///
    /// The raw value is normalized by the column's input type; empty input
    /// removes the filter. Returns `false` for columns without a filter input.
    pub fn set_column_filter(&self, column: &str, raw: Value) -> bool {
        let Some(kind) = self.column(column).and_then(Column::filter_input) else {
            return false;
        };
        let value = kind.coerce(raw);
        let changed = self
            .with_inner(|inner| {
                match value {
                    Some(value) => inner.column_filters.insert(column.to_string(), value),
                    None => inner.column_filters.remove(column),
                };
            })
            .is_some();
        if changed {
            self.mark_dirty();
        }
        changed
    }

    /// Returns the uncommitted column filter values.
    pub fn column_filters(&self) -> Params {
        self.read(|inner| inner.column_filters.clone())
            .unwrap_or_default()
    }

    /// Commits the column filters (back to page 1) and refetches.
    ///
    /// Filterable columns without a draft value drop their committed filter.
    pub async fn apply_filters(&self) -> Outcome {
        let committed = self.commit(|inner| {
            let filters: Params = self
                .shared
                .columns
                .iter()
                .filter(|c| c.filter_input().is_some())
                .map(|c| {
                    let value = inner
                        .column_filters
                        .get(c.key())
                        .cloned()
                        .unwrap_or(Value::Null);
                    (c.key().to_string(), value)
                })
                .collect();
            Some(FilterAction::ApplyFilters(filters))
        });
        if !committed {
            return Outcome::Ignored;
        }
        self.refresh().await
    }

    /// Resets drafts, committed filters and sort to the initial state and refetches.
    pub async fn clear_filters(&self) -> Outcome {
        let initial = self.shared.initial_filters.clone();
        let committed = self.commit(|inner| {
            inner.column_filters.clear();
            inner.search_draft.clear();
            inner.sort = None;
            Some(FilterAction::Reset(initial))
        });
        if !committed {
            return Outcome::Ignored;
        }
        self.refresh().await
    }

    /// Returns the committed filters.
    pub fn filters(&self) -> FilterState {
        self.read(|inner| inner.filters.clone())
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Sorting
    // -------------------------------------------------------------------------

    /// Advances the sort cycle of a sortable column.
    ///
    /// Fetch mode sends the new sort to the server (back to page 1);
    /// controlled mode reorders [`rows`](Self::rows) locally.
    pub async fn toggle_sort(&self, column: &str) -> Outcome {
        if !self.column(column).is_some_and(Column::is_sortable) {
            return Outcome::Ignored;
        }
        let fetch_mode = self.is_fetch_mode();
        let toggled = self.with_inner(|inner| {
            let next = sort::next_sort(inner.sort.as_ref(), column);
            if fetch_mode {
                inner.filters = inner.filters.clone().reduce(FilterAction::Sort(next.clone()));
            }
            inner.sort = next;
        });
        if toggled.is_none() {
            return Outcome::Failed;
        }
        self.mark_dirty();

        if fetch_mode {
            self.refresh().await
        } else {
            Outcome::Applied
        }
    }

    /// Returns the current sort.
    pub fn sort(&self) -> Option<SortState> {
        self.read(|inner| inner.sort.clone()).flatten()
    }

    // -------------------------------------------------------------------------
    // Pagination
    // -------------------------------------------------------------------------

    /// Goes to a page, keeping every other filter, and refetches.
    pub async fn set_page(&self, page: usize) -> Outcome {
        let committed = self.commit(|inner| {
            (inner.pagination.contains(page) && page != inner.filters.page)
                .then_some(FilterAction::SetPage(page))
        });
        if !committed {
            return Outcome::Ignored;
        }
        self.refresh().await
    }

    /// Goes to the next page, if there is one.
    pub async fn next_page(&self) -> Outcome {
        let page = self.filters().page;
        self.set_page(page + 1).await
    }

    /// Goes to the previous page, if there is one.
    pub async fn prev_page(&self) -> Outcome {
        let page = self.filters().page;
        if page <= 1 {
            return Outcome::Ignored;
        }
        self.set_page(page - 1).await
    }

    /// Changes the page size (back to page 1) and refetches.
    pub async fn set_per_page(&self, per_page: usize) -> Outcome {
        if !self.shared.config.allows_per_page(per_page) {
            return Outcome::Ignored;
        }
        let committed = self.commit(|inner| {
            (per_page != inner.filters.per_page).then_some(FilterAction::SetPerPage(per_page))
        });
        if !committed {
            return Outcome::Ignored;
        }
        self.refresh().await
    }

    /// Returns the pagination metadata.
    pub fn pagination(&self) -> Pagination {
        self.read(|inner| inner.pagination).unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Rows
    // -------------------------------------------------------------------------

    /// Returns the loaded rows in display order.
    ///
    /// In controlled mode this is the client-sorted view; in fetch mode the
    /// server order is kept as is.
    pub fn rows(&self) -> Vec<Row<T>> {
        self.read(|inner| {
            let mut rows = inner.rows.clone();
            if !self.is_fetch_mode()
                && let Some(sort) = &inner.sort
                && let Some(column) = self.column(&sort.column)
            {
                sort::sort_by_value(&mut rows, sort.direction, |row| column.value(row.data()));
            }
            rows
        })
        .unwrap_or_default()
    }

    /// Returns a row by identity.
    pub fn row(&self, id: &RowId) -> Option<Row<T>> {
        self.read(|inner| inner.find(id).cloned()).flatten()
    }

    /// Returns the number of loaded rows.
    pub fn len(&self) -> usize {
        self.read(|inner| inner.rows.len()).unwrap_or(0)
    }

    /// Returns `true` if no rows are loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces the caller-supplied rows (controlled mode only).
    ///
    /// Identities carry over according to the identity strategy.
    pub fn set_rows(&self, rows: Vec<T>) -> bool {
        if self.is_fetch_mode() {
            return false;
        }
        let replaced = self
            .with_inner(|inner| {
                let previous = std::mem::take(&mut inner.rows);
                inner.rows = self.shared.strategy.reconcile(&previous, rows);
                inner.pagination = Pagination::new(inner.rows.len(), inner.filters.per_page);
                let loaded: HashSet<RowId> = inner.rows.iter().map(|r| r.id().clone()).collect();
                inner.selection.retain(|id| loaded.contains(id));
            })
            .is_some();
        if replaced {
            self.mark_dirty();
        }
        replaced
    }

    /// Returns the value of a cell.
    pub fn cell(&self, id: &RowId, column: &str) -> Option<Value> {
        let column = self.column(column)?;
        self.read(|inner| inner.find(id).map(|row| column.value(row.data())))
            .flatten()
    }

    /// Returns the column definitions.
    pub fn columns(&self) -> &[Column<T>] {
        &self.shared.columns
    }

    /// Returns a column by key.
    pub fn column(&self, key: &str) -> Option<&Column<T>> {
        self.shared.columns.iter().find(|c| c.key() == key)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TableConfig {
        &self.shared.config
    }

    // -------------------------------------------------------------------------
    // Actions
    // -------------------------------------------------------------------------

    /// Returns the declared row actions.
    pub fn actions(&self) -> &[Action<T>] {
        &self.shared.actions
    }

    /// Returns the actions visible for a row, in placement order.
    pub fn visible_actions(&self, id: &RowId) -> Vec<ActionKind> {
        self.read(|inner| {
            inner
                .find(id)
                .map(|row| {
                    action::visible_actions(&self.shared.actions, row.data())
                        .into_iter()
                        .map(|a| a.kind().clone())
                        .collect()
                })
                .unwrap_or_default()
        })
        .unwrap_or_default()
    }

    /// Resolves a custom action for a row.
    ///
    /// Returns the row's data when the action is declared and visible for it;
    /// what the action does with the data is up to the caller.
    pub fn run_action(&self, name: &str, id: &RowId) -> Option<T> {
        let kind = ActionKind::Custom(name.to_string());
        self.read(|inner| {
            inner
                .find(id)
                .filter(|row| action::is_allowed(&self.shared.actions, &kind, row.data()))
                .map(|row| row.data().clone())
        })
        .flatten()
    }

    // -------------------------------------------------------------------------
    // Create / update
    // -------------------------------------------------------------------------

    /// Opens the create modal. Refused while another modal is open.
    pub fn open_create(&self) -> bool {
        let opened = self
            .with_inner(|inner| {
                if inner.modal.is_open() {
                    return false;
                }
                inner.modal = Modal::Create {
                    values: self.shared.schemas.create().defaults(),
                };
                true
            })
            .unwrap_or(false);
        if opened {
            self.mark_dirty();
        }
        opened
    }

    /// Opens the update modal for a row, pre-populated from its data.
    ///
    /// Refused while another modal is open, or when the edit action is hidden
    /// for the row.
    pub fn open_update(&self, id: &RowId) -> bool {
        let opened = self
            .with_inner(|inner| {
                if inner.modal.is_open() {
                    return false;
                }
                let Some(row) = inner.find(id) else {
                    return false;
                };
                if !action::is_allowed(&self.shared.actions, &ActionKind::Edit, row.data()) {
                    return false;
                }
                let values = self.shared.schemas.update().initial_values(row.data());
                inner.modal = Modal::Update {
                    row: id.clone(),
                    values,
                };
                true
            })
            .unwrap_or(false);
        if opened {
            self.mark_dirty();
        }
        opened
    }

    /// Closes the modal.
    pub fn close_modal(&self) {
        if self.with_inner(|inner| inner.modal = Modal::Closed).is_some() {
            self.mark_dirty();
        }
    }

    /// Returns the modal state.
    pub fn modal(&self) -> Modal {
        self.read(|inner| inner.modal.clone()).unwrap_or_default()
    }

    /// Returns the form schema of the open modal.
    pub fn modal_schema(&self) -> Option<FormSchema> {
        match self.modal() {
            Modal::Closed => None,
            Modal::Create { .. } => Some(self.shared.schemas.create().clone()),
            Modal::Update { .. } => Some(self.shared.schemas.update().clone()),
        }
    }

    /// Validates the open modal's state and builds the contract payload.
    fn prepare_submit(
        &self,
        inner: &mut ControllerInner<T>,
        payload: FormData,
    ) -> Result<(Operation, Option<RowId>, FormData), Outcome> {
        if inner.loading.submit {
            return Err(Outcome::Ignored);
        }
        let (operation, schema, target) = match &inner.modal {
            Modal::Closed => return Err(Outcome::Ignored),
            Modal::Create { .. } => (Operation::Create, self.shared.schemas.create(), None),
            Modal::Update { row, .. } => (Operation::Update, self.shared.schemas.update(), Some(row.clone())),
        };

        if let ValidationResult::Invalid(errors) = schema.validate(&payload) {
            self.raise(inner, operation, &TableError::Validation(errors));
            return Err(Outcome::Failed);
        }

        let mut payload = schema.coerce(payload);
        for (key, value) in &self.shared.config.static_params {
            payload.insert(key.clone(), value.clone());
        }

        if let Some(id) = &target {
            let Some(row) = inner.find(id) else {
                self.raise(inner, operation, &TableError::RowNotFound(id.clone()));
                return Err(Outcome::Failed);
            };
            if let Some(pk) = &self.shared.config.primary_key {
                let key = row.data().field(pk);
                payload.insert(pk.clone(), key);
            }
        }

        inner.loading.set(operation, true);
        Ok((operation, target, payload))
    }

    /// Submits the open modal.
    ///
    /// On success the created row is prepended (fresh identity) or the edited
    /// row is replaced in place, and the modal closes. On failure the modal
    /// stays open and an alert is raised. A success without a returned entity
    /// refetches in fetch mode.
    pub async fn submit(&self, payload: FormData) -> Outcome {
        let prepared = self
            .with_inner(|inner| self.prepare_submit(inner, payload))
            .unwrap_or(Err(Outcome::Failed));
        let (operation, target, payload) = match prepared {
            Ok(prepared) => prepared,
            Err(outcome) => {
                self.mark_dirty();
                return outcome;
            }
        };
        self.mark_dirty();
        log::debug!("{operation} submitted: {}", Value::Object(payload.clone()));

        let result = match operation {
            Operation::Create => self.shared.crud.create(payload).await,
            _ => self.shared.crud.update(payload).await,
        };
        let result = self.settle(operation, result);

        if !self.is_active() {
            log::trace!("{operation} resolved after unmount, dropped");
            return Outcome::Inactive;
        }

        let (outcome, refetch) = self
            .with_inner(|inner| {
                inner.loading.set(operation, false);
                match result {
                    Ok(entity) => {
                        inner.modal = Modal::Closed;
                        match (entity, &target) {
                            (Some(entity), None) => inner.rows.insert(0, Row::mint(entity)),
                            (Some(entity), Some(id)) => match inner.position(id) {
                                Some(index) => inner.rows[index].replace_data(entity),
                                None => log::trace!("updated row {id} no longer loaded"),
                            },
                            (None, _) => return (Outcome::Applied, true),
                        }
                        (Outcome::Applied, false)
                    }
                    Err(error) => {
                        self.raise(inner, operation, &error);
                        (Outcome::Failed, false)
                    }
                }
            })
            .unwrap_or((Outcome::Failed, false));
        self.mark_dirty();

        if refetch && self.is_fetch_mode() {
            self.refresh().await;
        }
        outcome
    }

    // -------------------------------------------------------------------------
    // Delete
    // -------------------------------------------------------------------------

    /// Deletes a row after confirmation.
    ///
    /// The primary key is read from the row as it is when the delete starts.
    /// On success the row is removed by identity; on failure it stays.
    /// Deletes of different rows may run concurrently; a row whose delete is
    /// already in flight is ignored without prompting.
    pub async fn delete(&self, id: &RowId) -> Outcome {
        let prepared = self
            .with_inner(|inner| {
                if inner.deleting.contains(id) {
                    return Err(Outcome::Ignored);
                }
                let Some(data) = inner.find(id).map(|row| row.data().clone()) else {
                    return Err(Outcome::Ignored);
                };
                if !action::is_allowed(&self.shared.actions, &ActionKind::Delete, &data) {
                    return Err(Outcome::Ignored);
                }
                match &self.shared.config.primary_key {
                    Some(pk) => Ok(data.field(pk)),
                    None => {
                        self.raise(inner, Operation::Delete, &TableError::MissingPrimaryKey);
                        Err(Outcome::Failed)
                    }
                }
            })
            .unwrap_or(Err(Outcome::Failed));
        let key = match prepared {
            Ok(key) => key,
            Err(outcome) => {
                self.mark_dirty();
                return outcome;
            }
        };

        if !self.shared.confirm.confirm(&self.shared.config.delete_confirm).await {
            return Outcome::Cancelled;
        }
        if !self.is_active() {
            return Outcome::Inactive;
        }

        let started = self
            .with_inner(|inner| {
                let started = inner.deleting.insert(id.clone());
                inner.loading.delete = true;
                started
            })
            .unwrap_or(false);
        if !started {
            return Outcome::Ignored;
        }
        self.mark_dirty();
        log::debug!("delete {id} (key {key})");

        let result = self.settle(Operation::Delete, self.shared.crud.delete(key).await);

        if !self.is_active() {
            log::trace!("delete resolved after unmount, dropped");
            return Outcome::Inactive;
        }

        let outcome = self
            .with_inner(|inner| {
                inner.deleting.remove(id);
                inner.loading.delete = !inner.deleting.is_empty();
                match result {
                    Ok(_) => {
                        inner.rows.retain(|row| row.id() != id);
                        inner.selection.remove(id);
                        Outcome::Applied
                    }
                    Err(error) => {
                        self.raise(inner, Operation::Delete, &error);
                        Outcome::Failed
                    }
                }
            })
            .unwrap_or(Outcome::Failed);
        self.mark_dirty();
        outcome
    }

    // -------------------------------------------------------------------------
    // Selection and bulk delete
    // -------------------------------------------------------------------------

    /// Toggles a row's selection. Requires bulk delete to be enabled.
    pub fn toggle_selected(&self, id: &RowId) -> bool {
        if !self.shared.config.bulk_delete {
            return false;
        }
        let toggled = self
            .with_inner(|inner| {
                if inner.find(id).is_none() {
                    return false;
                }
                if !inner.selection.remove(id) {
                    inner.selection.insert(id.clone());
                }
                true
            })
            .unwrap_or(false);
        if toggled {
            self.mark_dirty();
        }
        toggled
    }

    /// Selects every loaded row, or clears the selection if all are selected.
    pub fn toggle_select_all(&self) -> bool {
        if !self.shared.config.bulk_delete {
            return false;
        }
        let toggled = self
            .with_inner(|inner| {
                let all_selected = !inner.rows.is_empty()
                    && inner.rows.iter().all(|row| inner.selection.contains(row.id()));
                if all_selected {
                    inner.selection.clear();
                } else {
                    inner.selection = inner.rows.iter().map(|row| row.id().clone()).collect();
                }
            })
            .is_some();
        if toggled {
            self.mark_dirty();
        }
        toggled
    }

    /// Returns the selected rows' identities, in row order.
    pub fn selected(&self) -> Vec<RowId> {
        self.read(|inner| {
            inner
                .rows
                .iter()
                .filter(|row| inner.selection.contains(row.id()))
                .map(|row| row.id().clone())
                .collect()
        })
        .unwrap_or_default()
    }

    /// Returns `true` if the row is selected.
    pub fn is_selected(&self, id: &RowId) -> bool {
        self.read(|inner| inner.selection.contains(id))
            .unwrap_or(false)
    }

    /// Deletes every selected row after a single confirmation.
    pub async fn bulk_delete(&self) -> Outcome {
        if !self.shared.config.bulk_delete {
            return Outcome::Ignored;
        }
        let prepared = self
            .with_inner(|inner| {
                let Some(pk) = &self.shared.config.primary_key else {
                    self.raise(inner, Operation::BulkDelete, &TableError::MissingPrimaryKey);
                    return Err(Outcome::Failed);
                };
                let targets: Vec<(RowId, Value)> = inner
                    .rows
                    .iter()
                    .filter(|row| inner.selection.contains(row.id()))
                    .map(|row| (row.id().clone(), row.data().field(pk)))
                    .collect();
                if targets.is_empty() {
                    return Err(Outcome::Ignored);
                }
                Ok(targets)
            })
            .unwrap_or(Err(Outcome::Failed));
        let targets = match prepared {
            Ok(targets) => targets,
            Err(outcome) => return outcome,
        };

        if !self
            .shared
            .confirm
            .confirm(&self.shared.config.bulk_delete_confirm)
            .await
        {
            return Outcome::Cancelled;
        }
        if !self.is_active() {
            return Outcome::Inactive;
        }

        let started = self
            .with_inner(|inner| !std::mem::replace(&mut inner.loading.bulk_delete, true))
            .unwrap_or(false);
        if !started {
            return Outcome::Ignored;
        }
        self.mark_dirty();

        let (ids, keys): (HashSet<RowId>, Vec<Value>) = targets.into_iter().unzip();
        log::debug!("bulk delete of {} rows", keys.len());
        let result = self.settle(Operation::BulkDelete, self.shared.crud.bulk_delete(keys).await);

        if !self.is_active() {
            log::trace!("bulk delete resolved after unmount, dropped");
            return Outcome::Inactive;
        }

        let outcome = self
            .with_inner(|inner| {
                inner.loading.bulk_delete = false;
                match result {
                    Ok(_) => {
                        inner.rows.retain(|row| !ids.contains(row.id()));
                        inner.selection.clear();
                        Outcome::Applied
                    }
                    Err(error) => {
                        self.raise(inner, Operation::BulkDelete, &error);
                        Outcome::Failed
                    }
                }
            })
            .unwrap_or(Outcome::Failed);
        self.mark_dirty();
        outcome
    }

    // -------------------------------------------------------------------------
    // Loading and alerts
    // -------------------------------------------------------------------------

    /// Returns the loading flags.
    pub fn loading(&self) -> Loading {
        self.read(|inner| inner.loading).unwrap_or_default()
    }

    /// Returns `true` while a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading().fetch
    }

    /// Returns the current alert.
    pub fn alert(&self) -> Option<Alert> {
        self.read(|inner| inner.alert.clone()).flatten()
    }

    /// Dismisses the current alert.
    pub fn dismiss_alert(&self) {
        if self.with_inner(|inner| inner.alert = None).is_some() {
            self.mark_dirty();
        }
    }
}
