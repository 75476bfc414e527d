//! External refresh hook.

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;

use super::Outcome;

type RefreshFn = Arc<dyn Fn() -> BoxFuture<'static, Outcome> + Send + Sync>;

/// Re-runs a controller's committed filters against its data source.
#[derive(Clone)]
pub struct RefreshHandle {
    refresh: RefreshFn,
}

impl RefreshHandle {
    pub(super) fn new(refresh: RefreshFn) -> Self {
        Self { refresh }
    }

    /// Triggers the refetch.
    pub async fn refresh(&self) -> Outcome {
        (self.refresh)().await
    }
}

impl std::fmt::Debug for RefreshHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RefreshHandle(..)")
    }
}

/// Single-slot handoff of a refresh handle from a table to its parent.
///
/// The last registration wins. A sibling component holding a clone of the
/// slot can refetch the table after side effects elsewhere in the UI.
///
/// # Example
///
/// ```ignore
/// let slot = RefreshSlot::new();
/// table.register_refresh(&slot);
///
/// // Elsewhere, after an action that changes the table's data:
/// slot.refresh().await;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RefreshSlot {
    handle: Arc<Mutex<Option<RefreshHandle>>>,
}

impl RefreshSlot {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn set(&self, handle: RefreshHandle) {
        if let Ok(mut guard) = self.handle.lock() {
            *guard = Some(handle);
        }
    }

    /// Returns the registered handle, if any.
    pub fn get(&self) -> Option<RefreshHandle> {
        self.handle.lock().ok().and_then(|g| g.clone())
    }

    /// Returns `true` if a handle is registered.
    pub fn is_registered(&self) -> bool {
        self.get().is_some()
    }

    /// Triggers the registered handle. Returns `None` when the slot is empty.
    pub async fn refresh(&self) -> Option<Outcome> {
        let handle = self.get()?;
        Some(handle.refresh().await)
    }

    /// Empties the slot.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.handle.lock() {
            *guard = None;
        }
    }
}
