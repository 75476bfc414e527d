//! Row data access

use serde_json::Map;
use serde_json::Value;

/// Form payload and free-form parameter object.
pub type FormData = Map<String, Value>;

/// Trait for records that can be displayed and edited by a table.
///
/// The controller never inspects records beyond named field lookups: sort
/// values, primary keys and form pre-population all go through [`field`].
///
/// # Example
///
/// ```
/// use folio_table::TableRecord;
/// use serde_json::{json, Value};
///
/// #[derive(Clone)]
/// struct Holding {
///     ticker: String,
///     weight: f64,
/// }
///
/// impl TableRecord for Holding {
///     fn field(&self, name: &str) -> Value {
///         match name {
///             "ticker" => json!(self.ticker),
///             "weight" => json!(self.weight),
///             _ => Value::Null,
///         }
///     }
/// }
/// ```
///
/// [`field`]: TableRecord::field
pub trait TableRecord: Clone + Send + Sync + 'static {
    /// Returns the value of a named field, or `Value::Null` if absent.
    fn field(&self, name: &str) -> Value;
}

impl TableRecord for Map<String, Value> {
    fn field(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or(Value::Null)
    }
}

impl TableRecord for Value {
    fn field(&self, name: &str) -> Value {
        match self {
            Value::Object(map) => map.field(name),
            _ => Value::Null,
        }
    }
}
