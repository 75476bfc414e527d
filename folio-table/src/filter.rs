//! Committed filter state and its reducer.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::pagination::DEFAULT_PER_PAGE;
use crate::sort::Direction;
use crate::sort::SortState;

/// Parameter object sent to a data source.
pub type Params = Map<String, Value>;

/// Keys owned by [`FilterState`]; extra filters can never shadow them.
pub const RESERVED_KEYS: [&str; 5] = ["page", "per_page", "search", "order_by", "order_dir"];

/// The filter values actually sent to the data source.
///
/// Drafts (the search box, per-column filter inputs) live in the controller
/// until an explicit search or apply commits them here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    /// Current page, 1-based.
    pub page: usize,
    /// Page size.
    pub per_page: usize,
    /// Free-text query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Field the server should sort by.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    /// Direction the server should sort in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_dir: Option<Direction>,
    /// Caller-defined filter fields.
    #[serde(flatten)]
    pub extra: Params,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE)
    }
}

/// A transition of the committed filter state.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterAction {
    /// Go to a page. The only action that keeps the other filters' page.
    SetPage(usize),
    /// Change the page size.
    SetPerPage(usize),
    /// Commit a free-text query. Blank queries clear the search.
    Search(String),
    /// Set or clear the server-side sort.
    Sort(Option<SortState>),
    /// Merge column filter values. `Null` values remove the filter.
    ApplyFilters(Params),
    /// Return to the given initial state.
    Reset(FilterState),
}

impl FilterState {
    /// Creates the default state for a page size: page 1, no search, no sort.
    pub fn new(per_page: usize) -> Self {
        Self {
            page: 1,
            per_page: per_page.max(1),
            search: None,
            order_by: None,
            order_dir: None,
            extra: Map::new(),
        }
    }

    /// Adds caller-defined filters. Reserved keys are ignored.
    pub fn with_extra(mut self, extra: Params) -> Self {
        for (key, value) in extra {
            if !RESERVED_KEYS.contains(&key.as_str()) && !value.is_null() {
                self.extra.insert(key, value);
            }
        }
        self
    }

    /// Applies an action and returns the next state.
    ///
    /// Every action except [`FilterAction::SetPage`] resets `page` to 1.
    pub fn reduce(mut self, action: FilterAction) -> Self {
        match action {
            FilterAction::SetPage(page) => {
                self.page = page.max(1);
                return self;
            }
            FilterAction::SetPerPage(per_page) => {
                self.per_page = per_page.max(1);
            }
            FilterAction::Search(query) => {
                let query = query.trim();
                self.search = (!query.is_empty()).then(|| query.to_string());
            }
            FilterAction::Sort(sort) => {
                self.order_dir = sort.as_ref().map(|s| s.direction);
                self.order_by = sort.map(|s| s.column);
            }
            FilterAction::ApplyFilters(filters) => {
                for (key, value) in filters {
                    if RESERVED_KEYS.contains(&key.as_str()) {
                        continue;
                    }
                    if value.is_null() {
                        self.extra.remove(&key);
                    } else {
                        self.extra.insert(key, value);
                    }
                }
            }
            FilterAction::Reset(initial) => {
                self = initial;
                self.order_by = None;
                self.order_dir = None;
            }
        }
        self.page = 1;
        self
    }

    /// Returns the server-side sort, if any.
    pub fn sort(&self) -> Option<SortState> {
        match (&self.order_by, self.order_dir) {
            (Some(column), Some(direction)) => Some(SortState {
                column: column.clone(),
                direction,
            }),
            _ => None,
        }
    }

    /// Returns the parameter object for a fetch.
    pub fn to_params(&self) -> Params {
        let mut params = Map::new();
        params.insert("page".into(), self.page.into());
        params.insert("per_page".into(), self.per_page.into());
        if let Some(search) = &self.search {
            params.insert("search".into(), search.clone().into());
        }
        if let Some(order_by) = &self.order_by {
            params.insert("order_by".into(), order_by.clone().into());
        }
        if let Some(dir) = self.order_dir {
            params.insert("order_dir".into(), dir.as_str().into());
        }
        for (key, value) in &self.extra {
            params
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        params
    }
}
