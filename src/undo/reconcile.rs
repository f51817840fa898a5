//! Post-undo cache reconciliation.
//!
//! Every handled action type is reconciled with a local patch; none of them
//! needs a list reload. Planning runs next to the remote calls (it may fetch a
//! single message's metadata or the label list); the resulting plan is applied
//! on the UI side.
//!
//! | Action          | Inbox view                 | Search / local filter         |
//! |-----------------|----------------------------|-------------------------------|
//! | Archive         | re-insert at head          | add inbox label, refresh hint |
//! | Trash           | re-insert at head          | no patch, refresh hint        |
//! | LabelAdd/Remove | patch label sets           | patch label sets              |
//! | Move            | re-insert at head + labels | patch label sets              |
//! | MarkRead/Unread | patch unread flag          | patch unread flag             |
//!
//! Only rows that are back in the inbox (and not in trash) are re-inserted.
//! If the view changed between planning and applying, re-inserts are dropped
//! and the refresh hint is shown instead.

use std::sync::Arc;

use crate::app::state::{ViewContext, ViewState};
use crate::cache::{CachePatch, LabelDirectory};
use crate::constants::TRASH_LABEL;
use crate::mail::MailService;
use crate::mail::types::{MessageId, MessageMeta};

use super::action::{ActionExtra, ActionType, UndoResult};

/// Local changes that bring the caches in line with a finished undo
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// View the plan was computed for
    pub view: ViewContext,
    pub patches: Vec<CachePatch>,
    /// Restored messages may be missing from the active list
    pub hint_refresh: bool,
    /// Something still has to be fetched from the remote side
    pub remote_reload_required: bool,
    show_refresh_hint: bool,
}

/// What applying a plan changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub inserted: usize,
    pub patched: usize,
    pub hint_refresh: bool,
    pub remote_reload_required: bool,
}

impl ReconcilePlan {
    pub fn apply(&self, state: &mut ViewState) -> ReconcileReport {
        if state.view == self.view {
            let effect = state.apply_patches(&self.patches);
            return ReconcileReport {
                inserted: effect.inserted,
                patched: effect.patched,
                hint_refresh: self.hint_refresh,
                remote_reload_required: self.remote_reload_required,
            };
        }

        // The list was replaced after planning; rows may not belong in it
        let kept: Vec<CachePatch> = self
            .patches
            .iter()
            .filter(|patch| !matches!(patch, CachePatch::InsertAtHead(_)))
            .cloned()
            .collect();
        let dropped = kept.len() < self.patches.len();
        if dropped {
            tracing::debug!(
                "View changed from '{}' to '{}' before reconcile, skipping re-insert",
                self.view.title(),
                state.view.title()
            );
        }
        let effect = state.apply_patches(&kept);
        ReconcileReport {
            inserted: effect.inserted,
            patched: effect.patched,
            hint_refresh: self.hint_refresh || (dropped && self.show_refresh_hint),
            remote_reload_required: self.remote_reload_required,
        }
    }
}

pub struct CacheReconciler<S> {
    service: Arc<S>,
    labels: Arc<LabelDirectory>,
    inbox_label: String,
    show_refresh_hint: bool,
}

impl<S: MailService> CacheReconciler<S> {
    pub fn new(
        service: Arc<S>,
        labels: Arc<LabelDirectory>,
        inbox_label: impl Into<String>,
        show_refresh_hint: bool,
    ) -> Self {
        Self {
            service,
            labels,
            inbox_label: inbox_label.into(),
            show_refresh_hint,
        }
    }

    /// Decide the local patch for `result`. Only messages whose compensation
    /// fully succeeded are patched.
    pub async fn plan(&self, result: &UndoResult, view: &ViewContext) -> ReconcilePlan {
        let mut plan = ReconcilePlan {
            view: view.clone(),
            show_refresh_hint: self.show_refresh_hint,
            ..Default::default()
        };
        let ids = &result.succeeded;
        if ids.is_empty() {
            return plan;
        }

        match (result.action_type, &result.extra) {
            (ActionType::Archive | ActionType::Trash, _) => {
                if view.is_inbox() {
                    let (restored, missing) = self.fetch_restored(ids).await;
                    if !restored.is_empty() {
                        plan.patches.push(CachePatch::InsertAtHead(restored));
                    }
                    plan.hint_refresh = missing && self.show_refresh_hint;
                } else {
                    if result.action_type == ActionType::Archive {
                        let patch = self
                            .labels
                            .label_patch(
                                self.service.as_ref(),
                                ids,
                                vec![self.inbox_label.clone()],
                                Vec::new(),
                            )
                            .await;
                        plan.patches.push(patch);
                    }
                    plan.hint_refresh = self.show_refresh_hint;
                }
            }
            (ActionType::LabelAdd, ActionExtra::Labels { labels }) => {
                let patch = self
                    .labels
                    .label_patch(self.service.as_ref(), ids, Vec::new(), labels.clone())
                    .await;
                plan.patches.push(patch);
            }
            (ActionType::LabelRemove, ActionExtra::Labels { labels }) => {
                let patch = self
                    .labels
                    .label_patch(self.service.as_ref(), ids, labels.clone(), Vec::new())
                    .await;
                plan.patches.push(patch);
            }
            (
                ActionType::Move,
                ActionExtra::Move {
                    applied_labels,
                    removed_labels,
                },
            ) => {
                if view.is_inbox() {
                    let (restored, missing) = self.fetch_restored(ids).await;
                    if !restored.is_empty() {
                        plan.patches.push(CachePatch::InsertAtHead(restored));
                    }
                    plan.hint_refresh = missing && self.show_refresh_hint;
                }
                let patch = self
                    .labels
                    .label_patch(
                        self.service.as_ref(),
                        ids,
                        removed_labels.clone(),
                        applied_labels.clone(),
                    )
                    .await;
                plan.patches.push(patch);
            }
            (ActionType::MarkRead, _) => plan.patches.push(CachePatch::ReadState {
                ids: ids.clone(),
                unread: true,
            }),
            (ActionType::MarkUnread, _) => plan.patches.push(CachePatch::ReadState {
                ids: ids.clone(),
                unread: false,
            }),
            (ActionType::LabelAdd | ActionType::LabelRemove | ActionType::Move, _) => {
                tracing::warn!(
                    "Undo of {} carried no label payload, leaving caches alone",
                    result.action_type
                );
            }
        }

        tracing::debug!(
            "Reconcile plan for {}: {} patch(es), hint_refresh={}",
            result.action_type,
            plan.patches.len(),
            plan.hint_refresh
        );
        plan
    }

    /// Fetch metadata for each restored message, one message at a time.
    /// Returns the rows that are back in the inbox and whether any fetch failed.
    async fn fetch_restored(&self, ids: &[MessageId]) -> (Vec<MessageMeta>, bool) {
        let mut restored = Vec::with_capacity(ids.len());
        let mut missing = false;
        for id in ids {
            match self.service.get_message(id).await {
                Ok(meta) if meta.has_label(&self.inbox_label) && !meta.has_label(TRASH_LABEL) => {
                    restored.push(meta)
                }
                Ok(_) => {
                    tracing::debug!("Restored message {} is not in the inbox, not inserting", id);
                }
                Err(e) => {
                    tracing::warn!("Could not fetch restored message {}: {}", id, e);
                    missing = true;
                }
            }
        }
        (restored, missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MessageCache;
    use crate::constants::INBOX_LABEL;
    use crate::mail::{InMemoryMailbox, Label};
    use std::time::Duration;

    fn meta(id: &str, labels: &[&str]) -> MessageMeta {
        let mut meta = MessageMeta::new(id, "Subject", "a@example.com", 1000).with_labels(labels);
        meta.label_names = labels.iter().map(|l| l.to_string()).collect();
        meta
    }

    fn setup() -> (Arc<InMemoryMailbox>, CacheReconciler<InMemoryMailbox>) {
        let mailbox = InMemoryMailbox::new();
        mailbox.add_label(Label::user("Label_1", "Work"));
        mailbox.insert(meta("m1", &[INBOX_LABEL]));
        mailbox.insert(meta("m2", &[INBOX_LABEL]));
        let mailbox = Arc::new(mailbox);
        let labels = Arc::new(LabelDirectory::new(Duration::from_secs(60)));
        let reconciler = CacheReconciler::new(Arc::clone(&mailbox), labels, INBOX_LABEL, true);
        (mailbox, reconciler)
    }

    fn result(action_type: ActionType, succeeded: &[&str], extra: ActionExtra) -> UndoResult {
        let ids: Vec<String> = succeeded.iter().map(|s| s.to_string()).collect();
        UndoResult {
            success: true,
            action_type,
            description: "test".to_string(),
            message_ids: ids.clone(),
            errors: Vec::new(),
            succeeded: ids,
            extra,
        }
    }

    fn state(view: ViewContext, ids: &[&str]) -> ViewState {
        ViewState {
            view,
            messages: MessageCache::from_messages(
                ids.iter().map(|id| meta(id, &[INBOX_LABEL])).collect(),
            ),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_archive_in_inbox_inserts_at_head_once() {
        let (mailbox, reconciler) = setup();
        let mut state = state(ViewContext::Inbox, &["m2"]);
        let undone = result(ActionType::Archive, &["m1"], ActionExtra::None);

        let plan = reconciler.plan(&undone, &ViewContext::Inbox).await;
        let first = plan.apply(&mut state);
        let second = plan.apply(&mut state);

        assert_eq!(first.inserted, 1);
        assert_eq!(second.inserted, 0);
        assert_eq!(state.messages.ids(), ["m1", "m2"]);
        assert!(!first.remote_reload_required);
        assert_eq!(mailbox.list_reloads(), 0);
    }

    #[tokio::test]
    async fn test_archive_in_search_restores_inbox_label_only() {
        let (mailbox, reconciler) = setup();
        let view = ViewContext::Search {
            query: "subject".to_string(),
        };
        let mut state = ViewState {
            view: view.clone(),
            messages: MessageCache::from_messages(vec![
                meta("m1", &[]),
                meta("m2", &[INBOX_LABEL]),
            ]),
            ..Default::default()
        };
        let undone = result(ActionType::Archive, &["m1"], ActionExtra::None);

        let plan = reconciler.plan(&undone, &view).await;
        let report = plan.apply(&mut state);

        assert_eq!(report.inserted, 0);
        assert_eq!(report.patched, 1);
        assert!(report.hint_refresh);
        assert_eq!(state.messages.ids(), ["m1", "m2"]);
        let m1 = state.messages.get("m1").unwrap();
        assert!(m1.has_label(INBOX_LABEL));
        assert_eq!(m1.label_names, vec![INBOX_LABEL]);
        assert_eq!(mailbox.list_reloads(), 0);
    }

    #[tokio::test]
    async fn test_view_change_before_apply_skips_reinsert() {
        let (mailbox, reconciler) = setup();
        let undone = result(ActionType::Archive, &["m1"], ActionExtra::None);
        let plan = reconciler.plan(&undone, &ViewContext::Inbox).await;
        assert!(!plan.hint_refresh);

        let mut state = state(
            ViewContext::LocalFilter {
                filter: "order".to_string(),
            },
            &["m2"],
        );
        let report = plan.apply(&mut state);

        assert_eq!(report.inserted, 0);
        assert!(report.hint_refresh);
        assert_eq!(state.messages.ids(), ["m2"]);
        assert_eq!(mailbox.list_reloads(), 0);
    }

    #[tokio::test]
    async fn test_trash_undo_skips_message_outside_inbox() {
        let (mailbox, reconciler) = setup();
        // m3 was archived before it was trashed from a search
        mailbox.insert(meta("m3", &[]));
        let mut state = state(ViewContext::Inbox, &["m2"]);
        let undone = result(ActionType::Trash, &["m1", "m3"], ActionExtra::None);

        let plan = reconciler.plan(&undone, &ViewContext::Inbox).await;
        let report = plan.apply(&mut state);

        assert_eq!(report.inserted, 1);
        assert!(!report.hint_refresh);
        assert_eq!(state.messages.ids(), ["m1", "m2"]);
    }

    #[tokio::test]
    async fn test_reinsert_skips_message_still_in_trash() {
        let (mailbox, reconciler) = setup();
        mailbox.insert(meta("m3", &[INBOX_LABEL, TRASH_LABEL]));
        let undone = result(ActionType::Archive, &["m3"], ActionExtra::None);

        let plan = reconciler.plan(&undone, &ViewContext::Inbox).await;
        assert!(plan.patches.is_empty());
    }

    #[tokio::test]
    async fn test_trash_in_local_filter_hints_refresh() {
        let (_mailbox, reconciler) = setup();
        let view = ViewContext::LocalFilter {
            filter: "sub".to_string(),
        };
        let plan = reconciler
            .plan(&result(ActionType::Trash, &["m1"], ActionExtra::None), &view)
            .await;
        assert!(plan.patches.is_empty());
        assert!(plan.hint_refresh);
        assert!(!plan.remote_reload_required);
    }

    #[tokio::test]
    async fn test_failed_metadata_fetch_turns_on_hint() {
        let (mailbox, reconciler) = setup();
        mailbox.fail_message("m1");
        let plan = reconciler
            .plan(
                &result(ActionType::Archive, &["m1", "m2"], ActionExtra::None),
                &ViewContext::Inbox,
            )
            .await;

        assert!(plan.hint_refresh);
        match &plan.patches[..] {
            [CachePatch::InsertAtHead(rows)] => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].id, "m2");
            }
            other => panic!("unexpected patches: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_label_add_undo_patches_labels_in_any_view() {
        let (_mailbox, reconciler) = setup();
        let view = ViewContext::Search {
            query: "subject".to_string(),
        };
        let mut state = state(view.clone(), &["m1"]);
        {
            let m1 = state.messages.get_mut("m1").unwrap();
            m1.label_ids.insert("Label_1".to_string());
            m1.label_names.push("Work".to_string());
        }

        let undone = result(
            ActionType::LabelAdd,
            &["m1"],
            ActionExtra::Labels {
                labels: vec!["Label_1".to_string()],
            },
        );
        let report = reconciler.plan(&undone, &view).await.apply(&mut state);

        assert_eq!(report.patched, 1);
        let m1 = state.messages.get("m1").unwrap();
        assert!(!m1.has_label("Label_1"));
        assert_eq!(m1.label_names, vec![INBOX_LABEL]);
    }

    #[tokio::test]
    async fn test_label_lookup_failure_still_patches_ids() {
        let (mailbox, reconciler) = setup();
        mailbox.set_labels_unavailable(true);
        let mut state = state(ViewContext::Inbox, &["m1"]);

        let undone = result(
            ActionType::LabelRemove,
            &["m1"],
            ActionExtra::Labels {
                labels: vec!["Label_1".to_string()],
            },
        );
        let report = reconciler
            .plan(&undone, &ViewContext::Inbox)
            .await
            .apply(&mut state);

        assert_eq!(report.patched, 1);
        assert!(!report.remote_reload_required);
        let m1 = state.messages.get("m1").unwrap();
        assert!(m1.has_label("Label_1"));
        assert_eq!(m1.label_names, vec![INBOX_LABEL]);
    }

    #[tokio::test]
    async fn test_move_in_inbox_reinserts_and_drops_applied_labels() {
        let (mailbox, reconciler) = setup();
        let mut state = state(ViewContext::Inbox, &["m2"]);

        let undone = result(
            ActionType::Move,
            &["m1"],
            ActionExtra::Move {
                applied_labels: vec!["Label_1".to_string()],
                removed_labels: vec![INBOX_LABEL.to_string()],
            },
        );
        let report = reconciler
            .plan(&undone, &ViewContext::Inbox)
            .await
            .apply(&mut state);

        assert_eq!(report.inserted, 1);
        assert!(!report.remote_reload_required);
        assert_eq!(state.messages.ids(), ["m1", "m2"]);
        let m1 = state.messages.get("m1").unwrap();
        assert!(m1.has_label(INBOX_LABEL));
        assert!(!m1.has_label("Label_1"));
        assert_eq!(mailbox.list_reloads(), 0);
    }

    #[tokio::test]
    async fn test_mark_read_undo_sets_unread() {
        let (_mailbox, reconciler) = setup();
        let mut state = state(ViewContext::Inbox, &["m1"]);

        reconciler
            .plan(
                &result(ActionType::MarkRead, &["m1"], ActionExtra::None),
                &ViewContext::Inbox,
            )
            .await
            .apply(&mut state);

        assert!(state.messages.get("m1").unwrap().is_unread());
    }

    #[tokio::test]
    async fn test_only_succeeded_messages_are_patched() {
        let (_mailbox, reconciler) = setup();
        let mut state = state(ViewContext::Inbox, &["m1", "m2"]);
        let mut undone = result(ActionType::MarkRead, &["m1"], ActionExtra::None);
        undone.message_ids = vec!["m1".to_string(), "m2".to_string()];
        undone.success = false;
        undone.errors = vec!["m2: mark unread failed: remote error".to_string()];

        reconciler
            .plan(&undone, &ViewContext::Inbox)
            .await
            .apply(&mut state);

        assert!(state.messages.get("m1").unwrap().is_unread());
        assert!(!state.messages.get("m2").unwrap().is_unread());
    }
}
