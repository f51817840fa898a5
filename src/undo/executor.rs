//! Compensating remote calls for a recorded action.

use std::sync::Arc;

use crate::error::MailResult;
use crate::mail::MailService;

use super::action::{ActionExtra, ActionType, UndoResult, UndoableAction};

/// Issues the inverse remote operation(s) for each message of an action.
///
/// Messages are processed sequentially in recorded order. A failing message
/// is reported and skipped; it is never retried and the batch never aborts.
pub struct CompensationExecutor<S> {
    service: Arc<S>,
}

impl<S: MailService> CompensationExecutor<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    pub async fn execute(&self, action: UndoableAction) -> UndoResult {
        let action_type = action.action_type();
        let mut errors = Vec::new();
        let mut succeeded = Vec::new();

        for id in action.message_ids() {
            let failures = self.compensate(action_type, action.extra(), id).await;
            if failures.is_empty() {
                succeeded.push(id.clone());
            } else {
                errors.extend(failures);
            }
        }

        let success = succeeded.len() == action.message_ids().len();
        if success {
            tracing::info!(
                "Undo of {} compensated {} message(s)",
                action_type,
                succeeded.len()
            );
        } else {
            tracing::warn!(
                "Undo of {} failed for {} of {} message(s)",
                action_type,
                action.message_ids().len() - succeeded.len(),
                action.message_ids().len()
            );
        }

        UndoResult {
            success,
            action_type,
            description: action.description().to_string(),
            message_ids: action.message_ids().to_vec(),
            errors,
            succeeded,
            extra: action.extra().clone(),
        }
    }

    /// Run every compensating call for one message. Returns formatted
    /// failures; empty means the message is fully restored.
    async fn compensate(
        &self,
        action_type: ActionType,
        extra: &ActionExtra,
        id: &str,
    ) -> Vec<String> {
        let mut failures = Vec::new();
        match (action_type, extra) {
            (ActionType::Archive, _) => {
                let result = self.service.unarchive(id).await;
                check(&mut failures, id, "restore to inbox", result);
            }
            (ActionType::Trash, _) => {
                let result = self.service.untrash(id).await;
                check(&mut failures, id, "restore from trash", result);
            }
            (ActionType::LabelAdd, ActionExtra::Labels { labels }) => {
                for label in labels {
                    let result = self.service.remove_label(id, label).await;
                    check(&mut failures, id, &format!("remove label {}", label), result);
                }
            }
            (ActionType::LabelRemove, ActionExtra::Labels { labels }) => {
                for label in labels {
                    let result = self.service.apply_label(id, label).await;
                    check(&mut failures, id, &format!("re-apply label {}", label), result);
                }
            }
            (
                ActionType::Move,
                ActionExtra::Move {
                    applied_labels,
                    removed_labels,
                },
            ) => {
                // Back into the inbox first so a half-undone move is still visible
                for label in removed_labels {
                    let result = self.service.apply_label(id, label).await;
                    check(&mut failures, id, &format!("re-apply label {}", label), result);
                }
                for label in applied_labels {
                    let result = self.service.remove_label(id, label).await;
                    check(&mut failures, id, &format!("remove label {}", label), result);
                }
            }
            (ActionType::MarkRead, _) => {
                let result = self.service.set_read_state(id, false).await;
                check(&mut failures, id, "mark unread", result);
            }
            (ActionType::MarkUnread, _) => {
                let result = self.service.set_read_state(id, true).await;
                check(&mut failures, id, "mark read", result);
            }
            (ActionType::LabelAdd | ActionType::LabelRemove | ActionType::Move, _) => {
                // UndoableAction::new rejects this shape
                failures.push(format!("{}: no labels recorded for {}", id, action_type));
            }
        }
        failures
    }
}

fn check(failures: &mut Vec<String>, id: &str, step: &str, result: MailResult<()>) {
    match result {
        Ok(()) => tracing::debug!("Undo {} for {}", step, id),
        Err(e) => {
            tracing::warn!("Undo {} for {} failed: {}", step, id, e);
            failures.push(format!("{}: {} failed: {}", id, step, e));
        }
    }
}
