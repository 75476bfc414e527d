//! Row identity and reconciliation

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use crate::record::TableRecord;

/// Internal identity of a loaded row.
///
/// Identities are minted from a process-wide counter and are independent of
/// any business key, so they stay usable as reconciliation keys even for
/// records without a primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(String);

impl RowId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(format!("__row_{}", COUNTER.fetch_add(1, Ordering::SeqCst)))
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A record wrapped with its internal identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<T> {
    id: RowId,
    data: T,
}

impl<T> Row<T> {
    /// Wraps a record with a freshly minted identity.
    pub(crate) fn mint(data: T) -> Self {
        Self {
            id: RowId::next(),
            data,
        }
    }

    fn with_id(id: RowId, data: T) -> Self {
        Self { id, data }
    }

    /// Returns the internal identity.
    pub fn id(&self) -> &RowId {
        &self.id
    }

    /// Returns the business data.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Consumes the row and returns the business data.
    pub fn into_data(self) -> T {
        self.data
    }

    /// Replaces the business data, keeping the identity.
    pub(crate) fn replace_data(&mut self, data: T) {
        self.data = data;
    }
}

/// How identities carry over when a fresh row list replaces the loaded one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityStrategy {
    /// Rows whose primary key matches a previously loaded row keep its identity.
    Keyed {
        /// The primary key field.
        field: String,
    },
    /// The row at index `i` inherits the identity previously at index `i`.
    ///
    /// Unsafe under reordering: after a sort or an insert, identities end up
    /// attached to different records than before. Only used when no primary
    /// key is declared.
    Positional,
}

impl IdentityStrategy {
    /// Picks the strategy for an optional primary key.
    pub fn from_primary_key(primary_key: Option<&str>) -> Self {
        match primary_key {
            Some(field) => Self::Keyed {
                field: field.to_string(),
            },
            None => Self::Positional,
        }
    }

    /// Wraps `incoming` records, reusing identities from `previous` where the
    /// strategy allows it.
    ///
    /// An identity is never handed to two rows of the same list: duplicate
    /// keys after the first occurrence get fresh identities.
    pub fn reconcile<T: TableRecord>(&self, previous: &[Row<T>], incoming: Vec<T>) -> Vec<Row<T>> {
        match self {
            Self::Keyed { field } => {
                let mut known: HashMap<String, RowId> = previous
                    .iter()
                    .filter_map(|row| key_of(&row.data.field(field)).map(|k| (k, row.id.clone())))
                    .collect();
                incoming
                    .into_iter()
                    .map(|data| {
                        match key_of(&data.field(field)).and_then(|k| known.remove(&k)) {
                            Some(id) => Row::with_id(id, data),
                            None => Row::mint(data),
                        }
                    })
                    .collect()
            }
            Self::Positional => incoming
                .into_iter()
                .enumerate()
                .map(|(i, data)| match previous.get(i) {
                    Some(prev) => Row::with_id(prev.id.clone(), data),
                    None => Row::mint(data),
                })
                .collect(),
        }
    }
}

/// Canonical map key for a primary key value. Null keys never match.
fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
