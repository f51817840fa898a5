//! Undo entry point used by the UI.

use std::sync::Arc;

use crate::app::queue::UiQueue;
use crate::app::state::ViewContext;
use crate::constants::REFRESH_HINT;
use crate::mail::MailService;

use super::action::UndoResult;
use super::executor::CompensationExecutor;
use super::ledger::ActionLedger;
use super::reconcile::CacheReconciler;

/// How an undo request ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
    /// The ledger was empty (not an error)
    NothingToUndo,
    /// Every message was restored
    Completed { message: String },
    /// Some messages were restored, the rest failed
    Partial { message: String, errors: Vec<String> },
    /// No message could be restored; caches were left alone
    Failed { message: String, errors: Vec<String> },
}

impl UndoOutcome {
    /// Status line shown to the user
    pub fn message(&self) -> &str {
        match self {
            UndoOutcome::NothingToUndo => "Nothing to undo",
            UndoOutcome::Completed { message }
            | UndoOutcome::Partial { message, .. }
            | UndoOutcome::Failed { message, .. } => message,
        }
    }
}

/// Sequences ledger lookup, compensation, reconciliation and the status
/// message. Runs off the UI thread; cache changes and status updates are
/// queued onto the UI side.
pub struct UndoController<S> {
    ledger: Arc<ActionLedger>,
    executor: CompensationExecutor<S>,
    reconciler: CacheReconciler<S>,
    ui: UiQueue,
}

impl<S: MailService> UndoController<S> {
    pub fn new(
        ledger: Arc<ActionLedger>,
        executor: CompensationExecutor<S>,
        reconciler: CacheReconciler<S>,
        ui: UiQueue,
    ) -> Self {
        Self {
            ledger,
            executor,
            reconciler,
            ui,
        }
    }

    pub fn has_undoable_action(&self) -> bool {
        self.ledger.has_undoable_action()
    }

    pub fn pending_description(&self) -> Option<String> {
        self.ledger.peek_description()
    }

    /// Undo the most recent action. `view` is the view context at the time
    /// the undo was requested.
    pub async fn perform_undo(&self, view: ViewContext) -> UndoOutcome {
        // take() is the atomic check; a racing request sees None here
        let Some(action) = self.ledger.take() else {
            self.ui.run(|state| state.set_status("Nothing to undo"));
            return UndoOutcome::NothingToUndo;
        };

        tracing::info!(
            "Undoing {} recorded at {}: {}",
            action.action_type(),
            action.recorded_at().format("%H:%M:%S"),
            action.description()
        );
        let result = self.executor.execute(action).await;

        if result.is_total_failure() {
            let errors = result.errors;
            let message = format!("Undo failed: {}", errors.join("; "));
            let status = message.clone();
            self.ui.run(move |state| state.set_error(status));
            return UndoOutcome::Failed { message, errors };
        }

        let plan = self.reconciler.plan(&result, &view).await;
        let outcome = outcome_for(&result, plan.hint_refresh);

        self.ui.run(move |state| {
            let report = plan.apply(state);
            tracing::debug!(
                "Undo reconciled: {} inserted, {} patched",
                report.inserted,
                report.patched
            );
            // The hint can change at apply time if the view moved on
            match outcome_for(&result, report.hint_refresh) {
                UndoOutcome::Partial { message, .. } => state.set_error(message),
                other => state.set_status(other.message()),
            }
        });
        outcome
    }
}

fn outcome_for(result: &UndoResult, hint_refresh: bool) -> UndoOutcome {
    let mut message = if result.success {
        format!("Undone: {}", result.description)
    } else {
        format!(
            "Partially undone: {} ({} failed: {})",
            result.description,
            result.failed_count(),
            result.errors.join("; ")
        )
    };
    if hint_refresh {
        message.push(' ');
        message.push_str(REFRESH_HINT);
    }

    if result.success {
        UndoOutcome::Completed { message }
    } else {
        UndoOutcome::Partial {
            message,
            errors: result.errors.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::queue::{UiReceiver, ui_queue};
    use crate::app::state::ViewState;
    use crate::cache::{LabelDirectory, MessageCache};
    use crate::constants::INBOX_LABEL;
    use crate::mail::{InMemoryMailbox, MailCall, MailService};
    use crate::undo::action::{ActionExtra, ActionType, UndoableAction};
    use std::time::Duration;

    struct Harness {
        mailbox: Arc<InMemoryMailbox>,
        ledger: Arc<ActionLedger>,
        controller: UndoController<InMemoryMailbox>,
        receiver: UiReceiver,
        state: ViewState,
    }

    fn harness() -> Harness {
        let mailbox = Arc::new(InMemoryMailbox::with_sample_data());
        let ledger = Arc::new(ActionLedger::new());
        let labels = Arc::new(LabelDirectory::new(Duration::from_secs(60)));
        let (queue, receiver) = ui_queue();
        let controller = UndoController::new(
            Arc::clone(&ledger),
            CompensationExecutor::new(Arc::clone(&mailbox)),
            CacheReconciler::new(Arc::clone(&mailbox), labels, INBOX_LABEL, true),
            queue,
        );
        Harness {
            mailbox,
            ledger,
            controller,
            receiver,
            state: ViewState::default(),
        }
    }

    async fn load_inbox(h: &mut Harness) {
        let list = h.mailbox.list_messages(None).await.unwrap();
        h.state
            .show_list(ViewContext::Inbox, MessageCache::from_messages(list));
        h.mailbox.clear_calls();
    }

    fn record(h: &Harness, action_type: ActionType, ids: &[&str], extra: ActionExtra) {
        let action = UndoableAction::new(
            action_type,
            ids.iter().map(|s| s.to_string()).collect(),
            extra,
            format!("{} {}", action_type, ids.join(", ")),
        )
        .unwrap();
        h.ledger.record(action);
    }

    #[tokio::test]
    async fn test_nothing_to_undo() {
        let mut h = harness();

        let outcome = h.controller.perform_undo(ViewContext::Inbox).await;
        h.receiver.drain(&mut h.state);

        assert_eq!(outcome, UndoOutcome::NothingToUndo);
        assert_eq!(h.state.status.message, "Nothing to undo");
        assert!(h.state.status.error.is_none());
    }

    #[tokio::test]
    async fn test_mark_unread_round_trip_without_reload() {
        let mut h = harness();
        load_inbox(&mut h).await;

        // m2 starts read; the prior operation marked it unread remotely
        h.mailbox.set_read_state("m2", false).await.unwrap();
        h.state.messages.get_mut("m2").unwrap().set_unread(true);
        record(&h, ActionType::MarkUnread, &["m2"], ActionExtra::None);
        h.mailbox.clear_calls();

        let outcome = h.controller.perform_undo(ViewContext::Inbox).await;
        h.receiver.drain(&mut h.state);

        assert_eq!(
            h.mailbox.calls(),
            vec![MailCall::SetReadState {
                id: "m2".to_string(),
                read: true
            }]
        );
        assert!(!h.state.messages.get("m2").unwrap().is_unread());
        assert_eq!(h.mailbox.list_reloads(), 0);
        assert_eq!(outcome.message(), "Undone: mark unread m2");
        assert!(!h.controller.has_undoable_action());
    }

    #[tokio::test]
    async fn test_second_undo_finds_empty_ledger() {
        let mut h = harness();
        load_inbox(&mut h).await;
        h.mailbox.archive("m1").await.unwrap();
        h.state.messages.remove("m1");
        record(&h, ActionType::Archive, &["m1"], ActionExtra::None);

        let first = h.controller.perform_undo(ViewContext::Inbox).await;
        let second = h.controller.perform_undo(ViewContext::Inbox).await;
        h.receiver.drain(&mut h.state);

        assert!(matches!(first, UndoOutcome::Completed { .. }));
        assert_eq!(second, UndoOutcome::NothingToUndo);
        assert_eq!(h.state.messages.ids()[0], "m1");
        assert_eq!(
            h.state.messages.ids().iter().filter(|id| *id == "m1").count(),
            1
        );
    }

    #[tokio::test]
    async fn test_partial_failure_patches_succeeded_messages() {
        let mut h = harness();
        load_inbox(&mut h).await;
        for id in ["m1", "m2"] {
            h.mailbox.archive(id).await.unwrap();
            h.state.messages.remove(id);
        }
        record(&h, ActionType::Archive, &["m1", "m2"], ActionExtra::None);
        h.mailbox.fail_message("m2");

        let outcome = h.controller.perform_undo(ViewContext::Inbox).await;
        h.receiver.drain(&mut h.state);

        match &outcome {
            UndoOutcome::Partial { errors, .. } => assert_eq!(errors.len(), 1),
            other => panic!("expected partial outcome, got {:?}", other),
        }
        assert_eq!(h.state.messages.ids()[0], "m1");
        assert!(!h.state.messages.contains("m2"));
        assert!(h.state.status.error.as_deref().unwrap().starts_with("Partially undone"));
        assert!(!h.controller.has_undoable_action());
    }

    #[tokio::test]
    async fn test_total_failure_skips_reconciliation() {
        let mut h = harness();
        load_inbox(&mut h).await;
        h.mailbox.archive("m1").await.unwrap();
        h.state.messages.remove("m1");
        record(&h, ActionType::Archive, &["m1"], ActionExtra::None);
        h.mailbox.fail_message("m1");
        let before = h.state.messages.ids().to_vec();

        let outcome = h.controller.perform_undo(ViewContext::Inbox).await;
        h.receiver.drain(&mut h.state);

        assert!(matches!(outcome, UndoOutcome::Failed { .. }));
        assert!(outcome.message().starts_with("Undo failed: m1: restore to inbox failed"));
        assert_eq!(h.state.messages.ids(), before.as_slice());
        assert!(h.state.status.error.is_some());
        // Undo is not itself undoable
        assert!(!h.controller.has_undoable_action());
    }

    #[tokio::test]
    async fn test_archive_undo_in_search_appends_refresh_hint() {
        let mut h = harness();
        let view = ViewContext::Search {
            query: "order".to_string(),
        };
        let found = h.mailbox.list_messages(Some("order")).await.unwrap();
        h.state
            .show_list(view.clone(), MessageCache::from_messages(found));
        h.mailbox.archive("m1").await.unwrap();
        record(&h, ActionType::Archive, &["m1"], ActionExtra::None);
        let before = h.state.messages.ids().to_vec();

        let outcome = h.controller.perform_undo(view).await;
        h.receiver.drain(&mut h.state);

        assert!(outcome.message().ends_with(REFRESH_HINT));
        assert_eq!(h.state.messages.ids(), before.as_slice());
        assert!(h.mailbox.message("m1").unwrap().has_label(INBOX_LABEL));
    }

    #[tokio::test]
    async fn test_archive_undo_in_search_restores_cached_inbox_label() {
        let mut h = harness();
        let view = ViewContext::Search {
            query: "order".to_string(),
        };
        h.mailbox.archive("m2").await.unwrap();
        let found = h.mailbox.list_messages(Some("order")).await.unwrap();
        h.state
            .show_list(view.clone(), MessageCache::from_messages(found));
        h.mailbox.clear_calls();
        assert!(!h.state.messages.get("m2").unwrap().has_label(INBOX_LABEL));
        record(&h, ActionType::Archive, &["m2"], ActionExtra::None);

        h.controller.perform_undo(view).await;
        h.receiver.drain(&mut h.state);

        assert_eq!(h.state.messages.ids(), ["m2"]);
        assert!(h.state.messages.get("m2").unwrap().has_label(INBOX_LABEL));
        assert!(h.mailbox.message("m2").unwrap().has_label(INBOX_LABEL));
        assert_eq!(h.mailbox.list_reloads(), 0);
    }

    #[tokio::test]
    async fn test_trash_undo_in_inbox_skips_archived_message() {
        let mut h = harness();
        // m3 was archived, then trashed from a search
        h.mailbox.archive("m3").await.unwrap();
        h.mailbox.trash("m3").await.unwrap();
        load_inbox(&mut h).await;
        record(&h, ActionType::Trash, &["m3"], ActionExtra::None);

        let outcome = h.controller.perform_undo(ViewContext::Inbox).await;
        h.receiver.drain(&mut h.state);

        assert!(matches!(outcome, UndoOutcome::Completed { .. }));
        assert!(!h.state.messages.contains("m3"));
        let remote_inbox = h.mailbox.list_messages(None).await.unwrap();
        let remote_ids: Vec<&str> = remote_inbox.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(h.state.messages.ids(), remote_ids.as_slice());
    }

    #[tokio::test]
    async fn test_view_change_before_apply_keeps_filter_and_hints() {
        let mut h = harness();
        load_inbox(&mut h).await;
        h.mailbox.archive("m1").await.unwrap();
        h.state.messages.remove("m1");
        record(&h, ActionType::Archive, &["m1"], ActionExtra::None);

        let outcome = h.controller.perform_undo(ViewContext::Inbox).await;
        assert!(!outcome.message().ends_with(REFRESH_HINT));

        // The user filtered the list before the queued reconcile ran
        let mut kept = h.state.messages.clone();
        kept.retain(|m| m.matches("order"));
        h.state.show_list(
            ViewContext::LocalFilter {
                filter: "order".to_string(),
            },
            kept,
        );
        h.receiver.drain(&mut h.state);

        assert_eq!(h.state.messages.ids(), ["m2"]);
        assert!(h.state.status.message.ends_with(REFRESH_HINT));
    }

    #[tokio::test]
    async fn test_pending_description_tracks_ledger() {
        let h = harness();
        assert!(h.controller.pending_description().is_none());
        record(&h, ActionType::Trash, &["m4"], ActionExtra::None);
        assert_eq!(
            h.controller.pending_description(),
            Some("trash m4".to_string())
        );
    }

    #[tokio::test]
    async fn test_undo_from_spawned_task() {
        let mut h = harness();
        load_inbox(&mut h).await;
        h.mailbox.set_read_state("m1", true).await.unwrap();
        h.state.messages.get_mut("m1").unwrap().set_unread(false);
        record(&h, ActionType::MarkRead, &["m1"], ActionExtra::None);

        let controller = Arc::new(h.controller);
        let background = Arc::clone(&controller);
        let outcome =
            tokio::spawn(async move { background.perform_undo(ViewContext::Inbox).await })
                .await
                .unwrap();

        let task = h.receiver.recv().await.unwrap();
        task(&mut h.state);

        assert!(matches!(outcome, UndoOutcome::Completed { .. }));
        assert!(h.state.messages.get("m1").unwrap().is_unread());
    }
}
