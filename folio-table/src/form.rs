//! Form schemas for the create/update modal.
//!
//! The controller does not render forms. It hands the active [`FormSchema`]
//! and the initial values to whatever form builder the caller uses, and
//! validates the submitted payload against the same schema.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::column::InputKind;
use crate::record::FormData;
use crate::record::TableRecord;

/// A single form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Payload key and record field name.
    pub name: String,
    /// Display label.
    pub label: String,
    /// Input type.
    #[serde(default)]
    pub input: InputKind,
    /// Whether the field must be non-empty.
    #[serde(default)]
    pub required: bool,
    /// Value used when creating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldDescriptor {
    /// Creates an optional text field.
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            input: InputKind::Text,
            required: false,
            default: None,
        }
    }

    /// Sets the input type.
    pub fn input(mut self, input: InputKind) -> Self {
        self.input = input;
        self
    }

    /// Marks the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the default value used by the create form.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Information about a single field validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name.
    pub field: String,
    /// Error message.
    pub message: String,
}

impl FieldError {
    /// Creates a field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of validating a form payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ValidationResult {
    /// All fields passed validation.
    #[default]
    Valid,
    /// One or more fields failed validation.
    Invalid(Vec<FieldError>),
}

impl ValidationResult {
    /// Check if all fields passed validation.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Get all validation errors.
    pub fn errors(&self) -> &[FieldError] {
        match self {
            Self::Valid => &[],
            Self::Invalid(errors) => errors,
        }
    }

    /// Get the first validation error (if any).
    pub fn first_error(&self) -> Option<&FieldError> {
        self.errors().first()
    }
}

/// An ordered list of form fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormSchema {
    fields: Vec<FieldDescriptor>,
}

impl FormSchema {
    /// Creates a schema from fields.
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    /// Returns the fields in display order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Returns a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Initial values for the create form.
    pub fn defaults(&self) -> FormData {
        self.fields
            .iter()
            .filter_map(|f| f.default.clone().map(|v| (f.name.clone(), v)))
            .collect()
    }

    /// Initial values for the update form, read from the row.
    pub fn initial_values<T: TableRecord>(&self, row: &T) -> FormData {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), row.field(&f.name)))
            .collect()
    }

    /// Validates a submitted payload.
    ///
    /// Required fields must be present and non-blank; number fields must hold
    /// a number or numeric text. Keys not declared by the schema pass through.
    pub fn validate(&self, payload: &FormData) -> ValidationResult {
        let mut errors = Vec::new();

        for field in &self.fields {
            let value = payload.get(&field.name).unwrap_or(&Value::Null);
            if is_blank(value) {
                if field.required {
                    errors.push(FieldError::new(&field.name, format!("{} is required", field.label)));
                }
                continue;
            }
            if field.input == InputKind::Number && !is_numeric(value) {
                errors.push(FieldError::new(&field.name, format!("{} must be a number", field.label)));
            }
        }

        if errors.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(errors)
        }
    }

    /// Normalizes the declared fields of a payload by their input types.
    ///
    /// Blank values become `null`, so an update can clear a field.
    pub fn coerce(&self, mut payload: FormData) -> FormData {
        for field in &self.fields {
            if let Some(raw) = payload.remove(&field.name) {
                let value = field.input.coerce(raw).unwrap_or(Value::Null);
                payload.insert(field.name.clone(), value);
            }
        }
        payload
    }
}

/// Form schemas for the create and update modals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schemas {
    /// One schema for both modals.
    Shared(FormSchema),
    /// Separate schemas, e.g. when some fields are immutable after creation.
    Split {
        /// Create form.
        create: FormSchema,
        /// Update form.
        update: FormSchema,
    },
}

impl Default for Schemas {
    fn default() -> Self {
        Self::Shared(FormSchema::default())
    }
}

impl Schemas {
    /// Returns the create schema.
    pub fn create(&self) -> &FormSchema {
        match self {
            Self::Shared(schema) => schema,
            Self::Split { create, .. } => create,
        }
    }

    /// Returns the update schema.
    pub fn update(&self) -> &FormSchema {
        match self {
            Self::Shared(schema) => schema,
            Self::Split { update, .. } => update,
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().is_ok(),
        _ => false,
    }
}
