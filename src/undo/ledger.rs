//! Single-slot store for the most recent undoable action.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::action::UndoableAction;

/// Holds at most one undoable action. Recording replaces whatever was there;
/// taking empties the slot in the same critical section.
#[derive(Debug, Default)]
pub struct ActionLedger {
    slot: Mutex<Option<UndoableAction>>,
}

impl ActionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<UndoableAction>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, action: UndoableAction) {
        tracing::info!(
            "Recorded undoable {} on {} message(s): {}",
            action.action_type(),
            action.message_ids().len(),
            action.description()
        );
        if let Some(replaced) = self.slot().replace(action) {
            tracing::debug!("Replaced pending undo: {}", replaced.description());
        }
    }

    pub fn has_undoable_action(&self) -> bool {
        self.slot().is_some()
    }

    /// Return and clear the stored action
    pub fn take(&self) -> Option<UndoableAction> {
        self.slot().take()
    }

    /// Drop any stored action (a mutating operation failed)
    pub fn clear(&self) {
        if self.slot().take().is_some() {
            tracing::debug!("Cleared pending undo");
        }
    }

    /// Description of the pending action, for the undo affordance
    pub fn peek_description(&self) -> Option<String> {
        self.slot().as_ref().map(|a| a.description().to_string())
    }
}
