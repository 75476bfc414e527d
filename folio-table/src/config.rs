//! Table configuration

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;
use crate::error::Operation;
use crate::filter::FilterState;
use crate::filter::Params;
use crate::pagination::DEFAULT_PER_PAGE;
use crate::row::IdentityStrategy;

/// Configuration of a table controller.
///
/// Every field has a default, so a JSON config only needs the keys it changes.
///
/// # Example
///
/// ```
/// use folio_table::config::TableConfig;
///
/// let config = TableConfig::default()
///     .with_per_page(50)
///     .with_primary_key("id")
///     .with_bulk_delete(true);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Initial page size.
    ///
    /// Default: 25
    pub per_page: usize,

    /// Page sizes the user may switch between. Empty allows any size.
    ///
    /// Default: 10, 25, 50, 100
    pub per_page_options: Vec<usize>,

    /// Caller-defined filters sent with every fetch until cleared.
    pub initial_filters: Params,

    /// Field identifying a record for update/delete targeting.
    pub primary_key: Option<String>,

    /// Enables row selection and bulk delete.
    pub bulk_delete: bool,

    /// Confirmation text for single deletes.
    pub delete_confirm: String,

    /// Confirmation text for bulk deletes.
    pub bulk_delete_confirm: String,

    /// Parameters merged into every create and update payload.
    pub static_params: Params,

    /// Fallback alert text for failed fetches without a server message.
    pub fetch_error_message: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            per_page_options: vec![10, 25, 50, 100],
            initial_filters: Params::new(),
            primary_key: None,
            bulk_delete: false,
            delete_confirm: "Are you sure you want to delete this item?".to_string(),
            bulk_delete_confirm: "Are you sure you want to delete the selected items?".to_string(),
            static_params: Params::new(),
            fetch_error_message: Operation::Fetch.fallback_message().to_string(),
        }
    }
}

impl TableConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial page size.
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self
    }

    /// Sets the selectable page sizes.
    pub fn with_per_page_options(mut self, options: Vec<usize>) -> Self {
        self.per_page_options = options;
        self
    }

    /// Sets the caller-defined initial filters.
    pub fn with_initial_filters(mut self, filters: Params) -> Self {
        self.initial_filters = filters;
        self
    }

    /// Declares the primary key field.
    pub fn with_primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = Some(field.into());
        self
    }

    /// Enables or disables bulk delete.
    pub fn with_bulk_delete(mut self, enabled: bool) -> Self {
        self.bulk_delete = enabled;
        self
    }

    /// Sets the single delete confirmation text.
    pub fn with_delete_confirm(mut self, text: impl Into<String>) -> Self {
        self.delete_confirm = text.into();
        self
    }

    /// Sets the bulk delete confirmation text.
    pub fn with_bulk_delete_confirm(mut self, text: impl Into<String>) -> Self {
        self.bulk_delete_confirm = text.into();
        self
    }

    /// Sets the parameters merged into create and update payloads.
    pub fn with_static_params(mut self, params: Params) -> Self {
        self.static_params = params;
        self
    }

    /// Sets the fallback text for failed fetches.
    pub fn with_fetch_error_message(mut self, message: impl Into<String>) -> Self {
        self.fetch_error_message = message.into();
        self
    }

    /// Checks the settings that would leave the controller unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.per_page == 0 || self.per_page_options.contains(&0) {
            return Err(ConfigError::InvalidPerPage);
        }
        if self.bulk_delete && self.primary_key.is_none() {
            return Err(ConfigError::BulkDeleteWithoutKey);
        }
        Ok(())
    }

    /// Returns the identity strategy implied by the primary key.
    pub fn identity_strategy(&self) -> IdentityStrategy {
        IdentityStrategy::from_primary_key(self.primary_key.as_deref())
    }

    /// Returns the filter state a fresh or cleared table starts from.
    pub fn initial_filter_state(&self) -> FilterState {
        FilterState::new(self.per_page).with_extra(self.initial_filters.clone())
    }

    /// Returns `true` if `per_page` is an allowed page size.
    pub fn allows_per_page(&self, per_page: usize) -> bool {
        per_page > 0 && (self.per_page_options.is_empty() || self.per_page_options.contains(&per_page))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = TableConfig::default();
        assert_eq!(config.per_page, 25);
        assert_eq!(config.identity_strategy(), IdentityStrategy::Positional);
        assert_eq!(config.fetch_error_message, "Data load error");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            TableConfig::default().with_per_page(0).validate(),
            Err(ConfigError::InvalidPerPage)
        );
        assert_eq!(
            TableConfig::default().with_bulk_delete(true).validate(),
            Err(ConfigError::BulkDeleteWithoutKey)
        );
    }

    #[test]
    fn test_partial_json() {
        let config: TableConfig = serde_json::from_value(json!({
            "per_page": 10,
            "primary_key": "id",
            "initial_filters": {"portfolio": 3}
        }))
        .unwrap();
        assert_eq!(config.per_page, 10);
        assert_eq!(config.per_page_options, vec![10, 25, 50, 100]);
        assert_eq!(
            config.identity_strategy(),
            IdentityStrategy::Keyed { field: "id".into() }
        );
        let filters = config.initial_filter_state();
        assert_eq!(filters.per_page, 10);
        assert_eq!(filters.extra.get("portfolio"), Some(&json!(3)));
    }

    #[test]
    fn test_allows_per_page() {
        let config = TableConfig::default();
        assert!(config.allows_per_page(50));
        assert!(!config.allows_per_page(30));
        assert!(TableConfig::default().with_per_page_options(vec![]).allows_per_page(30));
    }
}
