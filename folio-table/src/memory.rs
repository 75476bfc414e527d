//! In-memory data source over JSON records.
//!
//! Applies search, equality filters, sorting and pagination the way a REST
//! backend would, and supports every mutation. Useful for demos, local data
//! files and tests.

use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;

use crate::error::TableError;
use crate::filter::FilterState;
use crate::filter::Params;
use crate::record::FormData;
use crate::record::TableRecord;
use crate::sort::sort_by_value;
use crate::source::ApiResponse;
use crate::source::CrudHandler;
use crate::source::DataSource;
use crate::source::FetchPayload;
use crate::source::FetchResult;

/// A dynamic JSON record.
pub type JsonRecord = Map<String, Value>;

/// A data source and CRUD handler storing records in memory.
#[derive(Debug)]
pub struct MemorySource {
    primary_key: String,
    records: RwLock<Vec<JsonRecord>>,
}

impl MemorySource {
    /// Creates a source over `records`, keyed by `primary_key`.
    pub fn new(records: Vec<JsonRecord>, primary_key: impl Into<String>) -> Self {
        Self {
            primary_key: primary_key.into(),
            records: RwLock::new(records),
        }
    }

    /// Returns the primary key field.
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Returns a snapshot of every stored record.
    pub fn records(&self) -> Vec<JsonRecord> {
        self.records.read().map(|g| g.clone()).unwrap_or_default()
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().map(|g| g.len()).unwrap_or(0)
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn query(&self, filters: &FilterState) -> Result<(Vec<JsonRecord>, usize), TableError> {
        let guard = self.records.read().map_err(|_| poisoned())?;
        let needle = filters.search.as_deref().map(str::to_lowercase);

        let mut matched: Vec<JsonRecord> = guard
            .iter()
            .filter(|record| match &needle {
                Some(needle) => record.values().any(|v| text_of(v).to_lowercase().contains(needle)),
                None => true,
            })
            .filter(|record| {
                filters
                    .extra
                    .iter()
                    .all(|(key, expected)| loosely_equal(&record.field(key), expected))
            })
            .cloned()
            .collect();
        drop(guard);

        if let Some(sort) = filters.sort() {
            sort_by_value(&mut matched, sort.direction, |r| r.field(&sort.column));
        }

        let total = matched.len();
        let start = (filters.page - 1).saturating_mul(filters.per_page);
        let rows = matched
            .into_iter()
            .skip(start)
            .take(filters.per_page)
            .collect();
        Ok((rows, total))
    }

    /// One past the largest integer key, or `None` once keys are exhausted.
    fn next_key(records: &[JsonRecord], field: &str) -> Option<Value> {
        let max = records
            .iter()
            .filter_map(|r| r.get(field).and_then(Value::as_i64))
            .max()
            .unwrap_or(0);
        max.checked_add(1).map(Value::from)
    }
}

#[async_trait]
impl DataSource<JsonRecord> for MemorySource {
    async fn fetch(&self, params: Params) -> FetchResult<JsonRecord> {
        let filters: FilterState = serde_json::from_value(Value::Object(params))
            .map_err(|e| TableError::contract(format!("invalid fetch parameters: {e}")))?;
        let filters = FilterState {
            page: filters.page.max(1),
            per_page: filters.per_page.max(1),
            ..filters
        };
        let (rows, total) = self.query(&filters)?;
        log::debug!(
            "memory source: page {} of {} matching records",
            filters.page,
            total
        );
        Ok(ApiResponse::ok(
            FetchPayload::new(rows)
                .with_total(total)
                .with_per_page(filters.per_page),
        ))
    }
}

#[async_trait]
impl CrudHandler<JsonRecord> for MemorySource {
    async fn create(&self, mut payload: FormData) -> Result<ApiResponse<JsonRecord>, TableError> {
        let mut guard = self.records.write().map_err(|_| poisoned())?;
        match payload.get(&self.primary_key) {
            None | Some(Value::Null) => {
                let Some(key) = Self::next_key(&guard, &self.primary_key) else {
                    return Ok(ApiResponse::failure("No key available"));
                };
                payload.insert(self.primary_key.clone(), key);
            }
            Some(key) => {
                if guard.iter().any(|r| r.get(&self.primary_key) == Some(key)) {
                    return Ok(ApiResponse::failure(format!("Record {key} already exists")));
                }
            }
        }
        guard.push(payload.clone());
        Ok(ApiResponse::ok(payload))
    }

    async fn update(&self, payload: FormData) -> Result<ApiResponse<JsonRecord>, TableError> {
        let Some(key) = payload.get(&self.primary_key).cloned() else {
            return Ok(ApiResponse::failure("Missing primary key"));
        };
        let mut guard = self.records.write().map_err(|_| poisoned())?;
        let Some(record) = guard
            .iter_mut()
            .find(|r| loosely_equal(&r.field(&self.primary_key), &key))
        else {
            return Ok(ApiResponse::failure("Record not found"));
        };
        for (field, value) in payload {
            if field != self.primary_key {
                record.insert(field, value);
            }
        }
        Ok(ApiResponse::ok(record.clone()))
    }

    async fn delete(&self, key: Value) -> Result<ApiResponse<Value>, TableError> {
        let mut guard = self.records.write().map_err(|_| poisoned())?;
        let before = guard.len();
        guard.retain(|r| !loosely_equal(&r.field(&self.primary_key), &key));
        if guard.len() == before {
            return Ok(ApiResponse::failure("Record not found"));
        }
        Ok(ApiResponse::ok(key))
    }

    async fn bulk_delete(&self, keys: Vec<Value>) -> Result<ApiResponse<Value>, TableError> {
        let mut guard = self.records.write().map_err(|_| poisoned())?;
        let before = guard.len();
        guard.retain(|r| {
            let own = r.field(&self.primary_key);
            !keys.iter().any(|k| loosely_equal(&own, k))
        });
        let removed = before - guard.len();
        if removed == 0 {
            return Ok(ApiResponse::failure("No matching records"));
        }
        Ok(ApiResponse::ok(Value::from(removed)))
    }
}

/// Equality across JSON types, so that a `"3"` typed into a filter matches `3`.
fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    actual == expected || (!actual.is_null() && text_of(actual) == text_of(expected))
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn poisoned() -> TableError {
    TableError::contract("record store lock poisoned")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::filter::FilterAction;
    use crate::sort::SortState;

    fn record(value: Value) -> JsonRecord {
        match value {
            Value::Object(map) => map,
            _ => JsonRecord::new(),
        }
    }

    fn source() -> MemorySource {
        MemorySource::new(
            vec![
                record(json!({"id": 1, "ticker": "ACME", "side": "buy", "qty": 10})),
                record(json!({"id": 2, "ticker": "Globex", "side": "sell", "qty": 3})),
                record(json!({"id": 3, "ticker": "Initech", "side": "buy", "qty": 7})),
            ],
            "id",
        )
    }

    async fn fetch(source: &MemorySource, filters: FilterState) -> FetchPayload<JsonRecord> {
        source
            .fetch(filters.to_params())
            .await
            .unwrap()
            .data
            .unwrap()
    }

    fn ids(rows: &[JsonRecord]) -> Vec<Value> {
        rows.iter().map(|r| r.field("id")).collect()
    }

    #[tokio::test]
    async fn test_fetch_paginates() {
        let payload = fetch(&source(), FilterState::new(2).reduce(FilterAction::SetPage(2))).await;
        assert_eq!(ids(&payload.rows), vec![json!(3)]);
        assert_eq!(payload.total, Some(3));
        assert_eq!(payload.per_page, Some(2));
    }

    #[tokio::test]
    async fn test_fetch_search_filter_sort() {
        let filters = FilterState::new(10)
            .reduce(FilterAction::Search("i".into()))
            .reduce(FilterAction::Sort(Some(SortState::desc("qty"))));
        let payload = fetch(&source(), filters).await;
        // "Globex" has no "i"; "ACME" does not either.
        assert_eq!(ids(&payload.rows), vec![json!(3)]);

        let mut extra = Params::new();
        extra.insert("side".into(), json!("buy"));
        let filters = FilterState::new(10)
            .reduce(FilterAction::ApplyFilters(extra))
            .reduce(FilterAction::Sort(Some(SortState::asc("qty"))));
        let payload = fetch(&source(), filters).await;
        assert_eq!(ids(&payload.rows), vec![json!(3), json!(1)]);
    }

    #[tokio::test]
    async fn test_loose_filter_matches_numbers() {
        let mut extra = Params::new();
        extra.insert("id".into(), json!("2"));
        let payload = fetch(&source(), FilterState::new(10).with_extra(extra)).await;
        assert_eq!(ids(&payload.rows), vec![json!(2)]);
    }

    #[tokio::test]
    async fn test_crud() {
        let source = source();
        let created = source
            .create(record(json!({"ticker": "Umbrella"})))
            .await
            .unwrap();
        assert_eq!(created.data.unwrap().field("id"), json!(4));

        let duplicate = source.create(record(json!({"id": 1}))).await.unwrap();
        assert!(!duplicate.success);

        let updated = source
            .update(record(json!({"id": 2, "qty": 5})))
            .await
            .unwrap();
        assert_eq!(updated.data.unwrap().field("qty"), json!(5));

        assert!(source.delete(json!(1)).await.unwrap().success);
        assert!(!source.delete(json!(1)).await.unwrap().success);

        let bulk = source.bulk_delete(vec![json!(2), json!(3)]).await.unwrap();
        assert_eq!(bulk.data, Some(json!(2)));
        assert_eq!(source.len(), 1);
    }

    #[tokio::test]
    async fn test_create_refuses_when_keys_are_exhausted() {
        let source = MemorySource::new(vec![record(json!({"id": i64::MAX, "ticker": "Last"}))], "id");
        let response = source.create(record(json!({"ticker": "Overflow"}))).await.unwrap();
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("No key available"));
        assert_eq!(source.len(), 1);

        // An explicit key is still accepted.
        let response = source.create(record(json!({"id": -1, "ticker": "Manual"}))).await.unwrap();
        assert!(response.success);
        assert_eq!(source.len(), 2);
    }
}
