//! Sort state and client-side ordering.

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending order (A-Z, 0-9).
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

impl Direction {
    /// Returns the wire name (`asc` / `desc`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// The column a table is currently sorted by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortState {
    /// Column key (also the `order_by` value sent to the server).
    pub column: String,
    /// Sort direction.
    pub direction: Direction,
}

impl SortState {
    /// Ascending sort on a column.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    /// Descending sort on a column.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Desc,
        }
    }
}

/// Advances the sort cycle after a click on `column`.
///
/// The same column cycles ascending, descending, unsorted. A different column
/// always starts ascending.
pub fn next_sort(current: Option<&SortState>, column: &str) -> Option<SortState> {
    match current {
        Some(state) if state.column == column => match state.direction {
            Direction::Asc => Some(SortState::desc(column)),
            Direction::Desc => None,
        },
        _ => Some(SortState::asc(column)),
    }
}

/// Compares two cell values for client-side sorting.
///
/// Numbers and numeric strings compare numerically. Everything else compares
/// as text, case-folded first with the raw text as tie-break, which keeps
/// `"apple"` next to `"Apple"` the way a locale collator would. Nulls sort
/// first.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => match (number_of(a), number_of(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => {
                let x = text_of(a);
                let y = text_of(b);
                x.to_lowercase()
                    .cmp(&y.to_lowercase())
                    .then_with(|| x.cmp(&y))
            }
        },
    }
}

/// Stable sort of `items` by the value `key` extracts.
pub fn sort_by_value<R>(items: &mut [R], direction: Direction, key: impl Fn(&R) -> Value) {
    items.sort_by(|a, b| {
        let ordering = compare_values(&key(a), &key(b));
        match direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    });
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
