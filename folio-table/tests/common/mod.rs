//! Shared fixtures for controller tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use folio_table::filter::Params;
use folio_table::memory::{JsonRecord, MemorySource};
use folio_table::source::{Confirm, DataSource, FetchResult};
use serde_json::{Value, json};
use tokio::sync::oneshot;

pub fn record(value: Value) -> JsonRecord {
    match value {
        Value::Object(map) => map,
        _ => JsonRecord::new(),
    }
}

/// `count` trades with ids `1..=count`, alternating buy and sell.
pub fn trades(count: usize) -> Vec<JsonRecord> {
    (1..=count)
        .map(|i| {
            record(json!({
                "id": i,
                "ticker": format!("T{i:02}"),
                "side": if i % 2 == 0 { "sell" } else { "buy" },
                "qty": i * 10,
            }))
        })
        .collect()
}

pub fn params(value: Value) -> Params {
    record(value)
}

/// Records every fetch before delegating to a memory store.
pub struct RecordingSource {
    pub store: Arc<MemorySource>,
    calls: Mutex<Vec<Params>>,
}

impl RecordingSource {
    pub fn new(store: Arc<MemorySource>) -> Self {
        Self {
            store,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Params> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> Params {
        self.calls().pop().unwrap()
    }
}

#[async_trait]
impl DataSource<JsonRecord> for RecordingSource {
    async fn fetch(&self, params: Params) -> FetchResult<JsonRecord> {
        self.calls.lock().unwrap().push(params.clone());
        self.store.fetch(params).await
    }
}

/// Holds each fetch until its gate is released.
///
/// Gates are consumed in call order; fetches without a gate resolve at once.
pub struct GatedSource {
    store: MemorySource,
    gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
}

impl GatedSource {
    pub fn new(store: MemorySource) -> Self {
        Self {
            store,
            gates: Mutex::new(VecDeque::new()),
        }
    }

    /// Arms the gate for the next fetch; sending on it releases the fetch.
    pub fn gate(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }
}

#[async_trait]
impl DataSource<JsonRecord> for GatedSource {
    async fn fetch(&self, params: Params) -> FetchResult<JsonRecord> {
        let gate = self.gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.store.fetch(params).await
    }
}

/// Answers every prompt the same way and remembers the messages.
#[derive(Clone, Default)]
pub struct ScriptedConfirm {
    answer: bool,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConfirm {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            prompts: Arc::default(),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Confirm for ScriptedConfirm {
    async fn confirm(&self, message: &str) -> bool {
        self.prompts.lock().unwrap().push(message.to_string());
        self.answer
    }
}
