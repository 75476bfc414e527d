//! Data fetch, mutation and confirmation contracts.
//!
//! The controller only knows these traits. A contract implementation reports
//! a transport failure as `Err(TableError::Contract)`; a well-formed refusal
//! is `Ok` with `success: false`.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::Operation;
use crate::error::TableError;
use crate::filter::Params;
use crate::record::FormData;

/// Response envelope shared by every contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Payload, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Server message, shown to the user on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying data.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// A successful response without data.
    pub fn ok_empty() -> Self {
        Self {
            success: true,
            data: None,
            message: None,
        }
    }

    /// A failed response with a message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    /// The response of a contract the caller did not provide.
    pub fn disabled(operation: Operation) -> Self {
        Self::failure(operation.disabled_message())
    }

    /// Converts the envelope into a result for `operation`.
    ///
    /// A refusal without a usable message carries the operation's fallback.
    pub fn into_result(self, operation: Operation) -> Result<Option<T>, TableError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(TableError::rejected(operation, self.message))
        }
    }
}

/// Rows returned by a data source, with pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchPayload<T> {
    /// The rows of the requested page.
    pub rows: Vec<T>,
    /// Total number of rows across all pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    /// Page size the server applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<usize>,
    /// Any other metadata the server sent along.
    #[serde(flatten)]
    pub meta: Map<String, Value>,
}

impl<T> FetchPayload<T> {
    /// Creates a payload whose total is the number of rows.
    pub fn new(rows: Vec<T>) -> Self {
        Self {
            rows,
            total: None,
            per_page: None,
            meta: Map::new(),
        }
    }

    /// Sets the total row count.
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    /// Sets the page size the server applied.
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = Some(per_page);
        self
    }
}

/// Result of a fetch.
pub type FetchResult<T> = Result<ApiResponse<FetchPayload<T>>, TableError>;

/// Source of rows for a table in fetch mode.
#[async_trait]
pub trait DataSource<T: Send + 'static>: Send + Sync {
    /// Loads one page of rows for the merged filter parameters.
    async fn fetch(&self, params: Params) -> FetchResult<T>;
}

/// Create/update/delete contracts.
///
/// Every method defaults to the disabled response, so an implementation only
/// overrides what the table actually supports.
#[async_trait]
pub trait CrudHandler<T: Send + 'static>: Send + Sync {
    /// Creates a record from the form payload.
    async fn create(&self, payload: FormData) -> Result<ApiResponse<T>, TableError> {
        let _ = payload;
        Ok(ApiResponse::disabled(Operation::Create))
    }

    /// Updates a record from the form payload. The payload carries the primary key.
    async fn update(&self, payload: FormData) -> Result<ApiResponse<T>, TableError> {
        let _ = payload;
        Ok(ApiResponse::disabled(Operation::Update))
    }

    /// Deletes the record with the given primary key.
    async fn delete(&self, key: Value) -> Result<ApiResponse<Value>, TableError> {
        let _ = key;
        Ok(ApiResponse::disabled(Operation::Delete))
    }

    /// Deletes every record with one of the given primary keys.
    async fn bulk_delete(&self, keys: Vec<Value>) -> Result<ApiResponse<Value>, TableError> {
        let _ = keys;
        Ok(ApiResponse::disabled(Operation::BulkDelete))
    }
}

/// A handler supporting no mutation at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCrud;

impl<T: Send + 'static> CrudHandler<T> for NoCrud {}

/// Blocking confirmation prompt shown before deletes.
#[async_trait]
pub trait Confirm: Send + Sync {
    /// Asks the user; returns `true` if confirmed.
    async fn confirm(&self, message: &str) -> bool;
}

/// Confirms every prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

#[async_trait]
impl Confirm for AutoConfirm {
    async fn confirm(&self, _message: &str) -> bool {
        true
    }
}

/// A [`DataSource`] backed by an async closure.
pub struct FnSource<T, F> {
    f: F,
    _marker: PhantomData<fn() -> T>,
}

/// Creates a data source from an async closure.
///
/// # Example
///
/// ```
/// use folio_table::source::{fn_source, ApiResponse, FetchPayload};
/// use serde_json::{json, Value};
///
/// let source = fn_source(|params| async move {
///     let page = params.get("page").and_then(Value::as_u64).unwrap_or(1);
///     Ok(ApiResponse::ok(FetchPayload::new(vec![json!({ "page": page })])))
/// });
/// # let _: &dyn folio_table::source::DataSource<Value> = &source;
/// ```
pub fn fn_source<T, F, Fut>(f: F) -> FnSource<T, F>
where
    T: Send + 'static,
    F: Fn(Params) -> Fut + Send + Sync,
    Fut: Future<Output = FetchResult<T>> + Send + 'static,
{
    FnSource {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<T, F, Fut> DataSource<T> for FnSource<T, F>
where
    T: Send + 'static,
    F: Fn(Params) -> Fut + Send + Sync,
    Fut: Future<Output = FetchResult<T>> + Send + 'static,
{
    async fn fetch(&self, params: Params) -> FetchResult<T> {
        (self.f)(params).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_fetch_envelope_deserializes_with_meta() {
        let response: ApiResponse<FetchPayload<Value>> = serde_json::from_value(json!({
            "success": true,
            "data": {
                "rows": [{"id": 1}, {"id": 2}],
                "total": 40,
                "per_page": 2,
                "currency": "EUR"
            }
        }))
        .unwrap();
        let payload = response.into_result(Operation::Fetch).unwrap().unwrap();
        assert_eq!(payload.rows.len(), 2);
        assert_eq!(payload.total, Some(40));
        assert_eq!(payload.per_page, Some(2));
        assert_eq!(payload.meta.get("currency"), Some(&json!("EUR")));
    }

    #[test]
    fn test_fetch_envelope_round_trips() {
        let sent = ApiResponse::ok(
            FetchPayload::new(vec![json!({"id": 1, "ticker": "ABC"})])
                .with_total(12)
                .with_per_page(10),
        );
        let body = serde_json::to_string(&sent).unwrap();
        let received: ApiResponse<FetchPayload<Value>> = serde_json::from_str(&body).unwrap();
        assert_eq!(received, sent);

        // Envelopes without data still parse.
        let received: ApiResponse<FetchPayload<Value>> =
            serde_json::from_value(json!({"success": true})).unwrap();
        assert_eq!(received, ApiResponse::ok_empty());
    }

    #[test]
    fn test_failure_envelope() {
        let response: ApiResponse<Value> =
            serde_json::from_value(json!({"success": false, "message": "Not allowed"})).unwrap();
        let err = response.into_result(Operation::Update).unwrap_err();
        assert_eq!(err.user_message().as_deref(), Some("Not allowed"));

        let response: ApiResponse<Value> = serde_json::from_value(json!({"success": false})).unwrap();
        let err = response.into_result(Operation::Fetch).unwrap_err();
        assert_eq!(err.user_message().as_deref(), Some("Data load error"));
    }

    #[tokio::test]
    async fn test_no_crud_resolves_disabled() {
        let handler = NoCrud;
        let response = <NoCrud as CrudHandler<Value>>::update(&handler, FormData::new()).await.unwrap();
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("Update disabled"));

        let response = <NoCrud as CrudHandler<Value>>::bulk_delete(&handler, vec![json!(1)]).await.unwrap();
        assert_eq!(response.message.as_deref(), Some("Bulk delete disabled"));
    }

    #[tokio::test]
    async fn test_fn_source() {
        let source = fn_source(|params: Params| async move {
            Ok(ApiResponse::ok(FetchPayload::new(vec![params.get("page").cloned().unwrap_or(Value::Null)])))
        });
        let response = source.fetch(FormData::new()).await.unwrap();
        assert_eq!(response.data.unwrap().rows, vec![Value::Null]);
    }
}
