//! Mutating mailbox actions (archive, trash, labels, move, read state)
//!
//! Each action runs remotely first, one message at a time. Messages the remote
//! side accepted are recorded in the undo ledger and patched in the local
//! cache; if none were accepted the ledger is cleared so a stale action can no
//! longer be undone.

use std::sync::Arc;

use crate::cache::{CachePatch, LabelDirectory, MessageCache};
use crate::error::{MailError, MailResult};
use crate::mail::MailService;
use crate::mail::types::MessageId;
use crate::undo::{ActionExtra, ActionLedger, ActionType, UndoableAction};

use super::queue::UiQueue;
use super::state::ViewContext;

/// What one mutating action did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionReport {
    pub succeeded: Vec<MessageId>,
    pub errors: Vec<String>,
    /// Whether an undoable action was recorded
    pub recorded: bool,
}

pub struct MailActions<S> {
    service: Arc<S>,
    ledger: Arc<ActionLedger>,
    labels: Arc<LabelDirectory>,
    ui: UiQueue,
    inbox_label: String,
}

impl<S: MailService> MailActions<S> {
    pub fn new(
        service: Arc<S>,
        ledger: Arc<ActionLedger>,
        labels: Arc<LabelDirectory>,
        ui: UiQueue,
        inbox_label: impl Into<String>,
    ) -> Self {
        Self {
            service,
            ledger,
            labels,
            ui,
            inbox_label: inbox_label.into(),
        }
    }

    pub async fn archive(&self, ids: Vec<MessageId>, view: ViewContext) -> ActionReport {
        self.perform(ActionType::Archive, ids, ActionExtra::None, view)
            .await
    }

    pub async fn trash(&self, ids: Vec<MessageId>, view: ViewContext) -> ActionReport {
        self.perform(ActionType::Trash, ids, ActionExtra::None, view)
            .await
    }

    /// `label` may be a label ID or a display name
    pub async fn add_label(
        &self,
        ids: Vec<MessageId>,
        label: &str,
        view: ViewContext,
    ) -> ActionReport {
        let labels = vec![self.resolve_label(label).await];
        self.perform(ActionType::LabelAdd, ids, ActionExtra::Labels { labels }, view)
            .await
    }

    pub async fn remove_label(
        &self,
        ids: Vec<MessageId>,
        label: &str,
        view: ViewContext,
    ) -> ActionReport {
        let labels = vec![self.resolve_label(label).await];
        self.perform(
            ActionType::LabelRemove,
            ids,
            ActionExtra::Labels { labels },
            view,
        )
        .await
    }

    /// Apply `label` and take the messages out of the inbox
    pub async fn move_to(
        &self,
        ids: Vec<MessageId>,
        label: &str,
        view: ViewContext,
    ) -> ActionReport {
        let extra = ActionExtra::Move {
            applied_labels: vec![self.resolve_label(label).await],
            removed_labels: vec![self.inbox_label.clone()],
        };
        self.perform(ActionType::Move, ids, extra, view).await
    }

    pub async fn mark_read(&self, ids: Vec<MessageId>, view: ViewContext) -> ActionReport {
        self.perform(ActionType::MarkRead, ids, ActionExtra::None, view)
            .await
    }

    pub async fn mark_unread(&self, ids: Vec<MessageId>, view: ViewContext) -> ActionReport {
        self.perform(ActionType::MarkUnread, ids, ActionExtra::None, view)
            .await
    }

    /// Full list reload for `view`. A local filter reloads the inbox and
    /// filters it again.
    pub async fn reload(&self, view: ViewContext) -> MailResult<usize> {
        let query = match &view {
            ViewContext::Search { query } => Some(query.as_str()),
            ViewContext::Inbox | ViewContext::LocalFilter { .. } => None,
        };
        let mut list = match self.service.list_messages(query).await {
            Ok(list) => list,
            Err(e) => {
                tracing::error!("Reload of {} failed: {}", view.title(), e);
                let message = format!("Refresh failed: {}", e);
                self.ui.run(move |state| state.set_error(message));
                return Err(e);
            }
        };
        if let ViewContext::LocalFilter { filter } = &view {
            list.retain(|m| m.matches(filter));
        }

        let count = list.len();
        tracing::debug!("Reloaded {} with {} messages", view.title(), count);
        let cache = MessageCache::from_messages(list);
        self.ui.run(move |state| {
            state.show_list(view, cache);
            state.status.loading = false;
        });
        Ok(count)
    }

    /// Map a display name to its label ID, refreshing the directory once when
    /// the name is unknown. Anything still unknown is used as an ID.
    async fn resolve_label(&self, label: &str) -> String {
        if let Some(id) = self.labels.id_for_name(label) {
            return id;
        }
        match self.labels.refresh(self.service.as_ref()).await {
            Ok(_) => self
                .labels
                .id_for_name(label)
                .unwrap_or_else(|| label.to_string()),
            Err(e) => {
                tracing::warn!("Label refresh failed while resolving {}: {}", label, e);
                label.to_string()
            }
        }
    }

    async fn perform(
        &self,
        action_type: ActionType,
        ids: Vec<MessageId>,
        extra: ActionExtra,
        view: ViewContext,
    ) -> ActionReport {
        let mut report = ActionReport::default();
        if ids.is_empty() {
            return report;
        }

        for id in &ids {
            if report.succeeded.contains(id) {
                continue;
            }
            match self.mutate(action_type, &extra, id).await {
                Ok(()) => report.succeeded.push(id.clone()),
                Err(e) => {
                    tracing::warn!("{} failed for {}: {}", action_type, id, e);
                    report.errors.push(format!("{}: {}", id, e));
                }
            }
        }

        if report.succeeded.is_empty() {
            self.ledger.clear();
            let message = format!(
                "{} failed: {}",
                capitalize(action_type.as_str()),
                report.errors.join("; ")
            );
            self.ui.run(move |state| state.set_error(message));
            return report;
        }

        let description = self
            .describe(action_type, &extra, report.succeeded.len())
            .await;
        match UndoableAction::new(
            action_type,
            report.succeeded.clone(),
            extra.clone(),
            description.clone(),
        ) {
            Ok(action) => {
                self.ledger.record(action);
                report.recorded = true;
            }
            Err(e) => {
                tracing::warn!("Could not record {} for undo: {}", action_type, e);
                self.ledger.clear();
            }
        }

        let patches = self
            .local_patches(action_type, &extra, &report.succeeded, &view)
            .await;
        let status = if report.errors.is_empty() {
            Ok(format!("{} (u to undo)", description))
        } else {
            Err(format!(
                "{} ({} failed: {})",
                description,
                report.errors.len(),
                report.errors.join("; ")
            ))
        };
        self.ui.run(move |state| {
            state.apply_patches(&patches);
            match status {
                Ok(message) => state.set_status(message),
                Err(message) => state.set_error(message),
            }
        });
        report
    }

    async fn mutate(
        &self,
        action_type: ActionType,
        extra: &ActionExtra,
        id: &str,
    ) -> MailResult<()> {
        let service = self.service.as_ref();
        match (action_type, extra) {
            (ActionType::Archive, _) => service.archive(id).await,
            (ActionType::Trash, _) => service.trash(id).await,
            (ActionType::LabelAdd, ActionExtra::Labels { labels }) => {
                for label in labels {
                    service.apply_label(id, label).await?;
                }
                Ok(())
            }
            (ActionType::LabelRemove, ActionExtra::Labels { labels }) => {
                for label in labels {
                    service.remove_label(id, label).await?;
                }
                Ok(())
            }
            (
                ActionType::Move,
                ActionExtra::Move {
                    applied_labels,
                    removed_labels,
                },
            ) => {
                for label in applied_labels {
                    service.apply_label(id, label).await?;
                }
                for label in removed_labels {
                    service.remove_label(id, label).await?;
                }
                Ok(())
            }
            (ActionType::MarkRead, _) => service.set_read_state(id, true).await,
            (ActionType::MarkUnread, _) => service.set_read_state(id, false).await,
            (ActionType::LabelAdd | ActionType::LabelRemove | ActionType::Move, _) => {
                Err(MailError::Remote(format!("{} without labels", action_type)))
            }
        }
    }

    /// Cache changes mirroring a confirmed action
    async fn local_patches(
        &self,
        action_type: ActionType,
        extra: &ActionExtra,
        ids: &[MessageId],
        view: &ViewContext,
    ) -> Vec<CachePatch> {
        let service = self.service.as_ref();
        if action_type == ActionType::Trash || (action_type.leaves_inbox() && view.is_inbox()) {
            return vec![CachePatch::Remove(ids.to_vec())];
        }

        let patch = match (action_type, extra) {
            (ActionType::Archive, _) => {
                self.labels
                    .label_patch(service, ids, Vec::new(), vec![self.inbox_label.clone()])
                    .await
            }
            (ActionType::LabelAdd, ActionExtra::Labels { labels }) => {
                self.labels
                    .label_patch(service, ids, labels.clone(), Vec::new())
                    .await
            }
            (ActionType::LabelRemove, ActionExtra::Labels { labels }) => {
                self.labels
                    .label_patch(service, ids, Vec::new(), labels.clone())
                    .await
            }
            (
                ActionType::Move,
                ActionExtra::Move {
                    applied_labels,
                    removed_labels,
                },
            ) => {
                self.labels
                    .label_patch(service, ids, applied_labels.clone(), removed_labels.clone())
                    .await
            }
            (ActionType::MarkRead, _) => CachePatch::ReadState {
                ids: ids.to_vec(),
                unread: false,
            },
            (ActionType::MarkUnread, _) => CachePatch::ReadState {
                ids: ids.to_vec(),
                unread: true,
            },
            _ => return Vec::new(),
        };
        vec![patch]
    }

    async fn describe(
        &self,
        action_type: ActionType,
        extra: &ActionExtra,
        count: usize,
    ) -> String {
        let messages = if count == 1 {
            "1 message".to_string()
        } else {
            format!("{} messages", count)
        };
        match (action_type, extra) {
            (ActionType::Archive, _) => format!("Archived {}", messages),
            (ActionType::Trash, _) => format!("Moved {} to trash", messages),
            (ActionType::LabelAdd, ActionExtra::Labels { labels }) => {
                let names = self.label_names(labels).await;
                format!("Added label {} to {}", names, messages)
            }
            (ActionType::LabelRemove, ActionExtra::Labels { labels }) => {
                let names = self.label_names(labels).await;
                format!("Removed label {} from {}", names, messages)
            }
            (ActionType::Move, ActionExtra::Move { applied_labels, .. }) => {
                let names = self.label_names(applied_labels).await;
                format!("Moved {} to {}", messages, names)
            }
            (ActionType::MarkRead, _) => format!("Marked {} read", messages),
            (ActionType::MarkUnread, _) => format!("Marked {} unread", messages),
            _ => format!("{} {}", capitalize(action_type.as_str()), messages),
        }
    }

    async fn label_names(&self, ids: &[String]) -> String {
        match self.labels.resolve(self.service.as_ref(), ids).await {
            Ok(names) => ids
                .iter()
                .map(|id| names.get(id).map(String::as_str).unwrap_or(id))
                .collect::<Vec<_>>()
                .join(", "),
            Err(_) => ids.join(", "),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
