//! Row action descriptors

use std::sync::Arc;

/// Decides per row whether an action is shown.
pub type RowPredicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// What an action does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Open the update modal for the row.
    Edit,
    /// Delete the row after confirmation.
    Delete,
    /// Caller-handled action, identified by name.
    Custom(String),
}

impl ActionKind {
    /// Returns the action name (`edit`, `delete` or the custom name).
    pub fn name(&self) -> &str {
        match self {
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Custom(name) => name,
        }
    }
}

/// A named operation bound to a row.
///
/// Actions are visible for every row unless a predicate says otherwise, and
/// are laid out by ascending `order`; equal hints keep declaration order.
///
/// # Example
///
/// ```
/// use folio_table::action::Action;
/// use serde_json::Value;
///
/// let actions: Vec<Action<Value>> = vec![
///     Action::edit().visible_when(|row: &Value| row["status"] != "settled"),
///     Action::delete().order(10),
///     Action::custom("details", "Details").order(-1),
/// ];
/// ```
pub struct Action<T> {
    kind: ActionKind,
    label: String,
    order: i32,
    visible: Option<RowPredicate<T>>,
}

impl<T> Clone for Action<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            label: self.label.clone(),
            order: self.order,
            visible: self.visible.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Action<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("kind", &self.kind)
            .field("label", &self.label)
            .field("order", &self.order)
            .field("visible", &self.visible.as_ref().map(|_| ".."))
            .finish()
    }
}

impl<T> Action<T> {
    fn new(kind: ActionKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            order: 0,
            visible: None,
        }
    }

    /// The edit action.
    pub fn edit() -> Self {
        Self::new(ActionKind::Edit, "Edit")
    }

    /// The delete action.
    pub fn delete() -> Self {
        Self::new(ActionKind::Delete, "Delete")
    }

    /// A caller-handled action.
    pub fn custom(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(ActionKind::Custom(name.into()), label)
    }

    /// Sets the display label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the placement hint.
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Shows the action only for rows matching the predicate.
    pub fn visible_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.visible = Some(Arc::new(predicate));
        self
    }

    /// Returns the action kind.
    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// Returns the display label.
    pub fn display_label(&self) -> &str {
        &self.label
    }

    /// Returns the placement hint.
    pub fn order_hint(&self) -> i32 {
        self.order
    }

    /// Returns `true` if the action is shown for `row`.
    pub fn is_visible(&self, row: &T) -> bool {
        self.visible.as_ref().is_none_or(|p| p(row))
    }
}

/// Returns the actions visible for `row`, in placement order.
pub fn visible_actions<'a, T>(actions: &'a [Action<T>], row: &T) -> Vec<&'a Action<T>> {
    let mut visible: Vec<_> = actions.iter().filter(|a| a.is_visible(row)).collect();
    visible.sort_by_key(|a| a.order);
    visible
}

/// Returns `true` if an action of `kind` is declared and visible for `row`.
pub fn is_allowed<T>(actions: &[Action<T>], kind: &ActionKind, row: &T) -> bool {
    actions
        .iter()
        .any(|a| &a.kind == kind && a.is_visible(row))
}
