//! Column descriptors

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::record::TableRecord;

/// Computes a derived cell value from a record.
pub type ComputeFn<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

/// How a column reads its value. Direct and derived access are exclusive.
pub enum Accessor<T> {
    /// Read a named field.
    Field(String),
    /// Compute the value from the whole record.
    Computed(ComputeFn<T>),
}

impl<T> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Field(name) => Self::Field(name.clone()),
            Self::Computed(f) => Self::Computed(Arc::clone(f)),
        }
    }
}

impl<T> std::fmt::Debug for Accessor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// An option of a select input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Value submitted when the option is chosen.
    pub value: Value,
    /// Display label.
    pub label: String,
}

impl SelectOption {
    /// Creates a select option.
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Input type hint for filter and form inputs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "options")]
pub enum InputKind {
    /// Free text.
    #[default]
    Text,
    /// Numeric input.
    Number,
    /// Date input (ISO 8601 text).
    Date,
    /// Boolean checkbox.
    Checkbox,
    /// Choice among fixed options.
    Select(Vec<SelectOption>),
}

impl InputKind {
    /// Normalizes a raw input value.
    ///
    /// Returns `None` for empty input, which removes the filter. Number inputs
    /// parse numeric text, checkbox inputs accept the usual truthy spellings.
    /// Unparseable text is kept as text.
    pub fn coerce(&self, raw: Value) -> Option<Value> {
        let text = match raw {
            Value::Null => return None,
            Value::String(s) => s,
            other => return Some(other),
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        match self {
            Self::Number => {
                if let Ok(n) = trimmed.parse::<i64>() {
                    Some(n.into())
                } else if let Some(n) = trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                {
                    Some(Value::Number(n))
                } else {
                    Some(Value::String(text))
                }
            }
            Self::Checkbox => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Some(Value::Bool(true)),
                "false" | "0" | "off" | "no" => Some(Value::Bool(false)),
                _ => Some(Value::String(text)),
            },
            Self::Text | Self::Date | Self::Select(_) => Some(Value::String(trimmed.to_string())),
        }
    }
}

/// A table column definition.
///
/// # Example
///
/// ```
/// use folio_table::column::{Column, InputKind};
/// use serde_json::{json, Value};
///
/// let columns: Vec<Column<Value>> = vec![
///     Column::field("ticker", "Ticker").sortable().filter(InputKind::Text),
///     Column::computed("value", "Value", |row: &Value| {
///         let qty = row["qty"].as_f64().unwrap_or(0.0);
///         let price = row["price"].as_f64().unwrap_or(0.0);
///         json!(qty * price)
///     })
///     .sortable(),
/// ];
/// assert_eq!(columns[1].key(), "value");
/// ```
pub struct Column<T> {
    key: String,
    label: String,
    accessor: Accessor<T>,
    sortable: bool,
    filter: Option<InputKind>,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            label: self.label.clone(),
            accessor: self.accessor.clone(),
            sortable: self.sortable,
            filter: self.filter.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("accessor", &self.accessor)
            .field("sortable", &self.sortable)
            .field("filter", &self.filter)
            .finish()
    }
}

impl<T: TableRecord> Column<T> {
    /// Creates a column reading a named field. The field name is the column key.
    pub fn field(name: impl Into<String>, label: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            key: name.clone(),
            label: label.into(),
            accessor: Accessor::Field(name),
            sortable: false,
            filter: None,
        }
    }

    /// Creates a column computing its value from the record.
    pub fn computed<F>(key: impl Into<String>, label: impl Into<String>, f: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            label: label.into(),
            accessor: Accessor::Computed(Arc::new(f)),
            sortable: false,
            filter: None,
        }
    }

    /// Marks the column as sortable.
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Declares a filter input for the column.
    pub fn filter(mut self, kind: InputKind) -> Self {
        self.filter = Some(kind);
        self
    }

    /// Returns the column key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the header label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the accessor.
    pub fn accessor(&self) -> &Accessor<T> {
        &self.accessor
    }

    /// Returns `true` if the column can be sorted.
    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    /// Returns the filter input hint, if the column is filterable.
    pub fn filter_input(&self) -> Option<&InputKind> {
        self.filter.as_ref()
    }

    /// Returns the cell value for a record.
    pub fn value(&self, row: &T) -> Value {
        match &self.accessor {
            Accessor::Field(name) => row.field(name),
            Accessor::Computed(f) => f(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_field_and_computed_values() {
        let row = json!({"qty": 4, "price": 2.5});
        let qty: Column<Value> = Column::field("qty", "Quantity");
        let total: Column<Value> = Column::computed("total", "Total", |r: &Value| {
            json!(r["qty"].as_f64().unwrap_or(0.0) * r["price"].as_f64().unwrap_or(0.0))
        });
        assert_eq!(qty.value(&row), json!(4));
        assert_eq!(total.value(&row), json!(10.0));
        assert!(!total.is_sortable());
        assert!(matches!(total.accessor(), Accessor::Computed(_)));
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(InputKind::Number.coerce(json!("42")), Some(json!(42)));
        assert_eq!(InputKind::Number.coerce(json!(" 1.5 ")), Some(json!(1.5)));
        assert_eq!(InputKind::Number.coerce(json!("abc")), Some(json!("abc")));
        assert_eq!(InputKind::Number.coerce(json!("")), None);
    }

    #[test]
    fn test_coerce_checkbox_and_text() {
        assert_eq!(InputKind::Checkbox.coerce(json!("on")), Some(json!(true)));
        assert_eq!(InputKind::Checkbox.coerce(json!("0")), Some(json!(false)));
        assert_eq!(InputKind::Text.coerce(json!("  acme ")), Some(json!("acme")));
        assert_eq!(InputKind::Text.coerce(Value::Null), None);
        assert_eq!(InputKind::Text.coerce(json!(3)), Some(json!(3)));
    }

    #[test]
    fn test_input_kind_serde() {
        let kind: InputKind = serde_json::from_value(json!({
            "type": "select",
            "options": [{"value": "buy", "label": "Buy"}]
        }))
        .unwrap();
        assert_eq!(kind, InputKind::Select(vec![SelectOption::new("buy", "Buy")]));

        let kind: InputKind = serde_json::from_value(json!({"type": "number"})).unwrap();
        assert_eq!(kind, InputKind::Number);
    }
}
