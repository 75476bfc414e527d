//! Typestate builder for [`TableController`].

use std::collections::HashSet;
use std::sync::Arc;

use super::TableController;
use crate::action::Action;
use crate::column::Column;
use crate::config::TableConfig;
use crate::error::ConfigError;
use crate::form::FormSchema;
use crate::form::Schemas;
use crate::record::TableRecord;
use crate::source::AutoConfirm;
use crate::source::Confirm;
use crate::source::CrudHandler;
use crate::source::DataSource;
use crate::source::NoCrud;

/// Marker for a builder field that has not been set.
#[derive(Debug, Clone, Copy)]
pub struct Missing;

/// Marker for a builder field that has been set.
#[derive(Debug, Clone)]
pub struct Set<T>(pub(crate) T);

/// Operating mode, resolved once at construction.
pub enum Mode<T: TableRecord> {
    /// Rows come from a data source.
    Fetch(Arc<dyn DataSource<T>>),
    /// Rows are supplied by the caller.
    Controlled(Vec<T>),
}

/// Builder for [`TableController`].
///
/// `build()` is only available once a mode was chosen with [`fetch`] or
/// [`rows`].
///
/// # Example
///
/// ```
/// use folio_table::TableController;
/// use folio_table::column::Column;
/// use folio_table::config::TableConfig;
/// use folio_table::memory::{JsonRecord, MemorySource};
/// use std::sync::Arc;
///
/// let source = Arc::new(MemorySource::new(Vec::new(), "id"));
/// let table = TableController::<JsonRecord>::builder()
///     .fetch_shared(source.clone())
///     .crud_shared(source)
///     .column(Column::field("ticker", "Ticker").sortable())
///     .config(TableConfig::default().with_primary_key("id"))
///     .build()
///     .unwrap();
/// ```
///
/// [`fetch`]: TableBuilder::fetch
/// [`rows`]: TableBuilder::rows
pub struct TableBuilder<T: TableRecord, M> {
    mode: M,
    columns: Vec<Column<T>>,
    actions: Option<Vec<Action<T>>>,
    schemas: Schemas,
    crud: Arc<dyn CrudHandler<T>>,
    confirm: Arc<dyn Confirm>,
    config: TableConfig,
}

impl<T: TableRecord> TableBuilder<T, Missing> {
    /// Creates a builder with no mode, no columns and no mutations.
    pub fn new() -> Self {
        Self {
            mode: Missing,
            columns: Vec::new(),
            actions: None,
            schemas: Schemas::default(),
            crud: Arc::new(NoCrud),
            confirm: Arc::new(AutoConfirm),
            config: TableConfig::default(),
        }
    }

    /// Fetch mode: rows are loaded through `source`.
    pub fn fetch<S: DataSource<T> + 'static>(self, source: S) -> TableBuilder<T, Set<Mode<T>>> {
        self.fetch_shared(Arc::new(source))
    }

    /// Fetch mode with a shared source.
    pub fn fetch_shared(self, source: Arc<dyn DataSource<T>>) -> TableBuilder<T, Set<Mode<T>>> {
        self.with_mode(Mode::Fetch(source))
    }

    /// Controlled mode: the caller supplies the rows.
    pub fn rows(self, rows: Vec<T>) -> TableBuilder<T, Set<Mode<T>>> {
        self.with_mode(Mode::Controlled(rows))
    }

    fn with_mode(self, mode: Mode<T>) -> TableBuilder<T, Set<Mode<T>>> {
        TableBuilder {
            mode: Set(mode),
            columns: self.columns,
            actions: self.actions,
            schemas: self.schemas,
            crud: self.crud,
            confirm: self.confirm,
            config: self.config,
        }
    }
}

impl<T: TableRecord> Default for TableBuilder<T, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TableRecord, M> TableBuilder<T, M> {
    /// Adds a column.
    pub fn column(mut self, column: Column<T>) -> Self {
        self.columns.push(column);
        self
    }

    /// Sets all columns.
    pub fn columns(mut self, columns: Vec<Column<T>>) -> Self {
        self.columns = columns;
        self
    }

    /// Sets the row actions.
    ///
    /// Defaults to edit and delete, both always visible.
    pub fn actions(mut self, actions: Vec<Action<T>>) -> Self {
        self.actions = Some(actions);
        self
    }

    /// Uses one form schema for both create and update.
    pub fn form(mut self, schema: FormSchema) -> Self {
        self.schemas = Schemas::Shared(schema);
        self
    }

    /// Sets the form schemas.
    pub fn schemas(mut self, schemas: Schemas) -> Self {
        self.schemas = schemas;
        self
    }

    /// Sets the mutation contracts.
    pub fn crud<H: CrudHandler<T> + 'static>(self, handler: H) -> Self {
        self.crud_shared(Arc::new(handler))
    }

    /// Sets shared mutation contracts.
    pub fn crud_shared(mut self, handler: Arc<dyn CrudHandler<T>>) -> Self {
        self.crud = handler;
        self
    }

    /// Sets the confirmation prompt used before deletes.
    pub fn confirm<C: Confirm + 'static>(mut self, confirm: C) -> Self {
        self.confirm = Arc::new(confirm);
        self
    }

    /// Sets the configuration.
    pub fn config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }
}

impl<T: TableRecord> TableBuilder<T, Set<Mode<T>>> {
    /// Builds the [`TableController`].
    pub fn build(self) -> Result<TableController<T>, ConfigError> {
        self.config.validate()?;

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.key().to_string()) {
                return Err(ConfigError::DuplicateColumn(column.key().to_string()));
            }
        }

        let actions = self
            .actions
            .unwrap_or_else(|| vec![Action::edit(), Action::delete()]);

        Ok(TableController::from_parts(
            self.mode.0,
            self.columns,
            actions,
            self.schemas,
            self.crud,
            self.confirm,
            self.config,
        ))
    }
}
