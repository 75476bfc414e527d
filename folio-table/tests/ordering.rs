//! Out-of-order responses and unmount.

mod common;

use std::sync::Arc;

use folio_table::config::TableConfig;
use folio_table::memory::{JsonRecord, MemorySource};
use folio_table::{Outcome, RefreshSlot, TableController, TableRecord};
use serde_json::json;
use tokio::task::{JoinHandle, yield_now};

use common::{GatedSource, trades};

fn table() -> (TableController<JsonRecord>, Arc<GatedSource>) {
    let source = Arc::new(GatedSource::new(MemorySource::new(trades(30), "id")));
    let table = TableController::builder()
        .fetch_shared(source.clone())
        .config(TableConfig::default().with_primary_key("id"))
        .build()
        .unwrap();
    (table, source)
}

/// Starts a search and lets it run until it blocks on its gate.
async fn start_search(table: &TableController<JsonRecord>, query: &str) -> JoinHandle<Outcome> {
    table.set_search_draft(query);
    let table = table.clone();
    let task = tokio::spawn(async move { table.search().await });
    yield_now().await;
    task
}

fn tickers(table: &TableController<JsonRecord>) -> Vec<serde_json::Value> {
    table.rows().iter().map(|r| r.data().field("ticker")).collect()
}

#[tokio::test]
async fn test_late_response_of_older_fetch_is_discarded() {
    let (table, source) = table();
    table.mount().await;

    let older = source.gate();
    let newer = source.gate();
    let first = start_search(&table, "T01").await;
    let second = start_search(&table, "T02").await;
    assert!(table.loading().fetch);

    newer.send(()).unwrap();
    assert_eq!(second.await.unwrap(), Outcome::Applied);
    assert_eq!(tickers(&table), vec![json!("T02")]);
    assert!(!table.loading().fetch);

    older.send(()).unwrap();
    assert_eq!(first.await.unwrap(), Outcome::Stale);
    assert_eq!(tickers(&table), vec![json!("T02")]);
    assert_eq!(table.filters().search.as_deref(), Some("T02"));
}

#[tokio::test]
async fn test_early_response_of_older_fetch_is_discarded() {
    let (table, source) = table();
    table.mount().await;

    let older = source.gate();
    let newer = source.gate();
    let first = start_search(&table, "T01").await;
    let second = start_search(&table, "T02").await;

    older.send(()).unwrap();
    assert_eq!(first.await.unwrap(), Outcome::Stale);
    // The newer fetch is still in flight.
    assert!(table.loading().fetch);
    assert_eq!(table.len(), 25);

    newer.send(()).unwrap();
    assert_eq!(second.await.unwrap(), Outcome::Applied);
    assert_eq!(tickers(&table), vec![json!("T02")]);
    assert!(!table.loading().fetch);
}

#[tokio::test]
async fn test_response_after_unmount_is_dropped() {
    let (table, source) = table();
    table.mount().await;
    let before = table.rows();

    let gate = source.gate();
    let pending = start_search(&table, "T03").await;
    table.unmount();
    assert!(!table.is_active());

    gate.send(()).unwrap();
    assert_eq!(pending.await.unwrap(), Outcome::Inactive);
    assert_eq!(table.rows(), before);
    assert_eq!(table.alert(), None);

    // Nothing is issued after unmount either.
    assert_eq!(table.refresh().await, Outcome::Inactive);
}

#[tokio::test]
async fn test_refresh_slot_refetches() {
    let (table, source) = table();
    let slot = RefreshSlot::new();
    table.register_refresh(&slot);
    assert_eq!(slot.refresh().await, Some(Outcome::Applied));
    assert_eq!(table.len(), 25);

    // A sibling holding a clone of the slot sees the same handle.
    let sibling = slot.clone();
    let gate = source.gate();
    let handle = sibling.get().unwrap();
    let task = tokio::spawn(async move { handle.refresh().await });
    yield_now().await;
    assert!(table.loading().fetch);
    gate.send(()).unwrap();
    assert_eq!(task.await.unwrap(), Outcome::Applied);
    assert!(!table.loading().fetch);
}
