//! Fetch mode: pagination, sorting, search and filters against a data source.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use folio_table::column::{Column, InputKind, SelectOption};
use folio_table::config::TableConfig;
use folio_table::error::Operation;
use folio_table::filter::Params;
use folio_table::memory::{JsonRecord, MemorySource};
use folio_table::source::{ApiResponse, DataSource, fn_source};
use folio_table::{ModeKind, Outcome, TableController, TableError, TableRecord};
use serde_json::{Value, json};

use common::{RecordingSource, params, trades};

fn table_with(config: TableConfig, count: usize) -> (TableController<JsonRecord>, Arc<RecordingSource>) {
    let store = Arc::new(MemorySource::new(trades(count), "id"));
    let source = Arc::new(RecordingSource::new(store.clone()));
    let table = TableController::builder()
        .fetch_shared(source.clone())
        .crud_shared(store)
        .column(Column::field("ticker", "Ticker").sortable())
        .column(Column::field("side", "Side").filter(InputKind::Select(vec![
            SelectOption::new("buy", "Buy"),
            SelectOption::new("sell", "Sell"),
        ])))
        .column(Column::field("qty", "Qty").sortable().filter(InputKind::Number))
        .config(config)
        .build()
        .unwrap();
    (table, source)
}

fn table(count: usize) -> (TableController<JsonRecord>, Arc<RecordingSource>) {
    table_with(TableConfig::default().with_primary_key("id"), count)
}

fn tickers(table: &TableController<JsonRecord>) -> Vec<String> {
    table
        .rows()
        .iter()
        .map(|r| r.data().field("ticker").as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_page_cycle() {
    let (table, source) = table(30);
    assert_eq!(table.mode(), ModeKind::Fetch);

    assert_eq!(table.mount().await, Outcome::Applied);
    assert_eq!(source.calls(), vec![params(json!({"page": 1, "per_page": 25}))]);
    assert_eq!(table.len(), 25);

    let pagination = table.pagination();
    assert_eq!(pagination.total, 30);
    assert_eq!(pagination.per_page, 25);
    assert_eq!(pagination.pages_num, 2);
    assert!(!table.loading().fetch);

    assert_eq!(table.next_page().await, Outcome::Applied);
    assert_eq!(source.last_call(), params(json!({"page": 2, "per_page": 25})));
    assert_eq!(table.len(), 5);
    assert_eq!(table.filters().page, 2);

    assert_eq!(table.next_page().await, Outcome::Ignored);
    assert_eq!(table.set_page(7).await, Outcome::Ignored);
    assert_eq!(source.calls().len(), 2);

    assert_eq!(table.prev_page().await, Outcome::Applied);
    assert_eq!(table.prev_page().await, Outcome::Ignored);
    assert_eq!(table.filters().page, 1);
}

#[tokio::test]
async fn test_sort_cycle_resets_page() {
    let (table, source) = table(30);
    table.mount().await;
    table.next_page().await;

    assert_eq!(table.toggle_sort("ticker").await, Outcome::Applied);
    assert_eq!(
        source.last_call(),
        params(json!({"page": 1, "per_page": 25, "order_by": "ticker", "order_dir": "asc"}))
    );
    assert_eq!(tickers(&table)[0], "T01");

    table.toggle_sort("ticker").await;
    assert_eq!(source.last_call().get("order_dir"), Some(&json!("desc")));
    assert_eq!(tickers(&table)[0], "T30");

    table.toggle_sort("ticker").await;
    assert_eq!(source.last_call(), params(json!({"page": 1, "per_page": 25})));
    assert_eq!(table.sort(), None);

    // A different column starts over at ascending.
    table.toggle_sort("ticker").await;
    table.toggle_sort("qty").await;
    assert_eq!(source.last_call().get("order_by"), Some(&json!("qty")));
    assert_eq!(source.last_call().get("order_dir"), Some(&json!("asc")));

    assert_eq!(table.toggle_sort("side").await, Outcome::Ignored);
    assert_eq!(table.toggle_sort("missing").await, Outcome::Ignored);
}

#[tokio::test]
async fn test_identity_stable_across_refetch() {
    let (table, _source) = table(30);
    table.mount().await;
    let before = table.rows();

    table.refresh().await;
    let after = table.rows();
    assert_eq!(
        before.iter().map(|r| r.id().clone()).collect::<Vec<_>>(),
        after.iter().map(|r| r.id().clone()).collect::<Vec<_>>()
    );

    // A bigger page keeps the identities of the rows already loaded.
    assert_eq!(table.set_per_page(50).await, Outcome::Applied);
    let widened = table.rows();
    assert_eq!(widened.len(), 30);
    for (old, new) in before.iter().zip(&widened) {
        assert_eq!(old.id(), new.id());
    }
    assert_ne!(widened[25].id(), widened[26].id());
}

#[tokio::test]
async fn test_search_is_committed_explicitly() {
    let (table, source) = table(30);
    table.mount().await;
    table.next_page().await;

    table.set_search_draft("T1");
    assert_eq!(table.search_draft(), "T1");
    assert_eq!(table.filters().search, None);
    assert_eq!(source.calls().len(), 2);

    assert_eq!(table.search().await, Outcome::Applied);
    assert_eq!(
        source.last_call(),
        params(json!({"page": 1, "per_page": 25, "search": "T1"}))
    );
    assert_eq!(table.len(), 10);
    assert_eq!(table.pagination().total, 10);
}

#[tokio::test]
async fn test_column_filters() {
    let (table, source) = table(30);
    table.mount().await;

    assert!(table.set_column_filter("side", json!("sell")));
    assert!(!table.set_column_filter("ticker", json!("T01")));
    assert_eq!(table.column_filters(), params(json!({"side": "sell"})));

    assert_eq!(table.apply_filters().await, Outcome::Applied);
    assert_eq!(
        source.last_call(),
        params(json!({"page": 1, "per_page": 25, "side": "sell"}))
    );
    assert_eq!(table.len(), 15);

    // Number inputs are coerced before they are sent.
    table.set_column_filter("qty", json!("40"));
    table.apply_filters().await;
    assert_eq!(source.last_call().get("qty"), Some(&json!(40)));
    assert_eq!(tickers(&table), vec!["T04".to_string()]);

    // Emptying a draft drops the committed filter.
    table.set_column_filter("qty", json!(""));
    table.apply_filters().await;
    assert!(!source.last_call().contains_key("qty"));
    assert_eq!(table.len(), 15);

    table.set_search_draft("T2");
    table.search().await;
    table.toggle_sort("ticker").await;
    assert_eq!(table.clear_filters().await, Outcome::Applied);
    assert_eq!(source.last_call(), params(json!({"page": 1, "per_page": 25})));
    assert_eq!(table.search_draft(), "");
    assert!(table.column_filters().is_empty());
    assert_eq!(table.sort(), None);
}

#[tokio::test]
async fn test_initial_filters_survive_clear() {
    let mut initial = Params::new();
    initial.insert("side".into(), json!("buy"));
    let store = Arc::new(MemorySource::new(trades(30), "id"));
    let source = Arc::new(RecordingSource::new(store));
    let table = TableController::builder()
        .fetch_shared(source.clone())
        .column(Column::field("ticker", "Ticker"))
        .config(TableConfig::default().with_initial_filters(initial))
        .build()
        .unwrap();

    table.mount().await;
    assert_eq!(source.last_call().get("side"), Some(&json!("buy")));
    assert_eq!(table.len(), 15);

    table.set_search_draft("T0");
    table.search().await;
    assert_eq!(source.last_call().get("side"), Some(&json!("buy")));

    table.clear_filters().await;
    assert_eq!(
        source.last_call(),
        params(json!({"page": 1, "per_page": 25, "side": "buy"}))
    );
}

#[tokio::test]
async fn test_per_page_must_be_allowed() {
    let (table, source) = table(30);
    table.mount().await;
    table.next_page().await;

    assert_eq!(table.set_per_page(7).await, Outcome::Ignored);
    assert_eq!(table.set_per_page(25).await, Outcome::Ignored);
    assert_eq!(table.set_per_page(10).await, Outcome::Applied);
    assert_eq!(source.last_call(), params(json!({"page": 1, "per_page": 10})));
    assert_eq!(table.pagination().pages_num, 3);
}

#[tokio::test]
async fn test_fetch_failure_keeps_rows() {
    let failing = Arc::new(AtomicBool::new(false));
    let flag = failing.clone();
    let store = Arc::new(MemorySource::new(trades(3), "id"));
    let source = fn_source(move |params: Params| {
        let flag = flag.clone();
        let store = store.clone();
        async move {
            if flag.load(Ordering::SeqCst) {
                return Err(TableError::contract("connection reset"));
            }
            store.fetch(params).await
        }
    });
    let table = TableController::builder()
        .fetch(source)
        .config(TableConfig::default().with_primary_key("id"))
        .build()
        .unwrap();

    table.mount().await;
    let before = table.rows();
    assert!(table.take_dirty());

    failing.store(true, Ordering::SeqCst);
    assert_eq!(table.refresh().await, Outcome::Failed);
    let alert = table.alert().unwrap();
    assert_eq!(alert.operation, Operation::Fetch);
    assert_eq!(alert.message, "Data load error");
    assert_eq!(table.rows(), before);
    assert!(!table.loading().fetch);
    assert!(table.take_dirty());
}

#[tokio::test]
async fn test_rejected_fetch_messages() {
    let responses = |response: ApiResponse<Value>| {
        fn_source(move |_params: Params| {
            let response = response.clone();
            async move {
                Ok(match response.success {
                    true => ApiResponse::ok_empty(),
                    false => ApiResponse {
                        success: false,
                        data: None,
                        message: response.message,
                    },
                })
            }
        })
    };

    let cases = [
        (ApiResponse::failure("Session expired"), "Session expired"),
        (ApiResponse::failure("   "), "Could not load trades"),
        (ApiResponse::ok(Value::Null), "Could not load trades"),
    ];
    for (response, expected) in cases {
        let table = TableController::<Value>::builder()
            .fetch(responses(response))
            .config(TableConfig::default().with_fetch_error_message("Could not load trades"))
            .build()
            .unwrap();
        assert_eq!(table.mount().await, Outcome::Failed);
        assert_eq!(table.alert().map(|a| a.message).as_deref(), Some(expected));
        assert!(table.is_empty());
    }
}

#[tokio::test]
async fn test_duplicate_columns_rejected() {
    let source = Arc::new(MemorySource::new(Vec::new(), "id"));
    let result = TableController::<JsonRecord>::builder()
        .fetch_shared(source as Arc<dyn DataSource<JsonRecord>>)
        .column(Column::field("id", "Id"))
        .column(Column::field("id", "Again"))
        .build();
    assert_eq!(
        result.err(),
        Some(folio_table::error::ConfigError::DuplicateColumn("id".into()))
    );
}
